/*!
 * Reference `PdfContentSource` adapter over the `lopdf` crate.
 *
 * This is the adapter the CLI binary ships with. It resolves page geometry,
 * walks content streams for positioned text spans (simple text state:
 * `Tm`/`Td`/`TD`/`T*`/`TL`, `Tf` sizing, `TJ`/`Tj` show operators, ToUnicode
 * CMap decoding for CID fonts), and captures embedded image XObjects with
 * their placement matrices. It makes no attempt at full content-stream
 * fidelity - shading, clipping, inline images, and Type3 fonts are ignored -
 * and it cannot rasterize, so scanned pages need an OCR-capable embedding.
 *
 * Any other implementation of the capability traits can replace it without
 * touching the pipeline.
 */

use std::collections::HashMap;

use bytes::Bytes;
use log::{debug, warn};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ExtractionError;
use crate::layout::{Color, Rect, WritingDirection};

use super::source::{FontInfo, ImageRegion, PdfContentSource, TextSpan};

static HEX_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([0-9A-Fa-f]+)>|(\[)|(\])").unwrap());

/// Positioned-text content source over a parsed lopdf document
pub struct LopdfContentSource {
    doc: Document,
    /// Page object ids in document order
    page_ids: Vec<ObjectId>,
}

impl LopdfContentSource {
    /// Parse a PDF from bytes
    pub fn load(pdf_bytes: &[u8]) -> Result<Self, ExtractionError> {
        let doc = Document::load_mem(pdf_bytes)
            .map_err(|e| ExtractionError::TextLayer(format!("cannot parse PDF: {}", e)))?;
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        Ok(Self { doc, page_ids })
    }

    fn page_id(&self, page_index: usize) -> Result<ObjectId, ExtractionError> {
        self.page_ids
            .get(page_index)
            .copied()
            .ok_or(ExtractionError::PageOutOfBounds {
                index: page_index,
                page_count: self.page_ids.len(),
            })
    }

    /// Resolve references down to a concrete object
    fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        let mut current = object;
        // Reference chains in the wild are short; bail out rather than loop.
        for _ in 0..16 {
            match current {
                Object::Reference(id) => match self.doc.get_object(*id) {
                    Ok(next) => current = next,
                    Err(_) => return current,
                },
                other => return other,
            }
        }
        current
    }

    /// Look up an inheritable page attribute (MediaBox, Resources)
    fn inherited<'a>(&'a self, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
        let mut current = page_id;
        for _ in 0..32 {
            let dict = self.doc.get_dictionary(current).ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(self.resolve(value));
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => current = *parent,
                _ => return None,
            }
        }
        None
    }

    fn media_box(&self, page_id: ObjectId) -> Result<(f32, f32), ExtractionError> {
        let media_box = self
            .inherited(page_id, b"MediaBox")
            .and_then(|obj| obj.as_array().ok())
            .ok_or_else(|| ExtractionError::TextLayer("page has no MediaBox".to_string()))?;
        let values: Vec<f32> = media_box
            .iter()
            .filter_map(|o| to_f32(self.resolve(o)))
            .collect();
        if values.len() != 4 {
            return Err(ExtractionError::TextLayer("malformed MediaBox".to_string()));
        }
        Ok(((values[2] - values[0]).abs(), (values[3] - values[1]).abs()))
    }

    /// Per-font decoding info from the page's font resources
    fn load_fonts(&self, page_id: ObjectId) -> HashMap<Vec<u8>, LoadedFont> {
        let mut fonts = HashMap::new();
        let Some(resources) = self
            .inherited(page_id, b"Resources")
            .and_then(|o| o.as_dict().ok())
        else {
            return fonts;
        };
        let Some(font_dict) = resources
            .get(b"Font")
            .ok()
            .map(|o| self.resolve(o))
            .and_then(|o| o.as_dict().ok())
        else {
            return fonts;
        };

        for (name, font_obj) in font_dict.iter() {
            let Some(dict) = self.resolve(font_obj).as_dict().ok() else {
                continue;
            };
            fonts.insert(name.clone(), self.load_font(dict));
        }
        fonts
    }

    fn load_font(&self, dict: &Dictionary) -> LoadedFont {
        let base_font = dict
            .get(b"BaseFont")
            .ok()
            .map(|o| self.resolve(o))
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_default();

        let vertical = dict
            .get(b"Encoding")
            .ok()
            .map(|o| self.resolve(o))
            .and_then(|o| o.as_name().ok())
            .map(|n| n.ends_with(b"-V"))
            .unwrap_or(false);

        let two_byte = dict
            .get(b"Subtype")
            .ok()
            .map(|o| self.resolve(o))
            .and_then(|o| o.as_name().ok())
            .map(|n| n == b"Type0")
            .unwrap_or(false);

        let cmap = dict
            .get(b"ToUnicode")
            .ok()
            .map(|o| self.resolve(o))
            .and_then(|o| match o {
                Object::Stream(stream) => stream.decompressed_content().ok(),
                _ => None,
            })
            .map(|data| parse_tounicode(&String::from_utf8_lossy(&data)))
            .unwrap_or_default();

        LoadedFont {
            bold: base_font.contains("Bold"),
            italic: base_font.contains("Italic") || base_font.contains("Oblique"),
            name: base_font,
            vertical,
            two_byte,
            cmap,
        }
    }
}

/// Decoding info for one font resource
struct LoadedFont {
    name: String,
    bold: bool,
    italic: bool,
    vertical: bool,
    two_byte: bool,
    /// Character code -> Unicode string, from the ToUnicode CMap
    cmap: HashMap<u32, String>,
}

impl LoadedFont {
    fn decode(&self, bytes: &[u8]) -> String {
        if self.two_byte || !self.cmap.is_empty() {
            let step = if self.two_byte { 2 } else { 1 };
            let mut out = String::new();
            for chunk in bytes.chunks(step) {
                let code = chunk.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32);
                match self.cmap.get(&code) {
                    Some(s) => out.push_str(s),
                    // No mapping: keep a replacement so coverage is visible.
                    None => out.push('\u{FFFD}'),
                }
            }
            out
        } else {
            // Simple fonts degrade to Latin-1, which matches WinAnsi for
            // the printable range.
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

impl PdfContentSource for LopdfContentSource {
    fn page_count(&self) -> Result<usize, ExtractionError> {
        Ok(self.page_ids.len())
    }

    fn page_dimensions(&self, page_index: usize) -> Result<(f32, f32), ExtractionError> {
        self.media_box(self.page_id(page_index)?)
    }

    fn extract_text_layer(&self, page_index: usize) -> Result<Vec<TextSpan>, ExtractionError> {
        let page_id = self.page_id(page_index)?;
        let (_, page_height) = self.media_box(page_id)?;
        let fonts = self.load_fonts(page_id);

        let content_data = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| ExtractionError::TextLayer(format!("cannot read content stream: {}", e)))?;
        let content = Content::decode(&content_data)
            .map_err(|e| ExtractionError::TextLayer(format!("cannot decode content stream: {}", e)))?;

        let mut spans = Vec::new();
        let mut state = TextState::default();

        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "BT" => state.begin_text(),
                "ET" => {}
                "Tf" => {
                    if operands.len() >= 2 {
                        state.font = operands[0].as_name().ok().map(|n| n.to_vec());
                        state.size = to_f32(self.resolve(&operands[1])).unwrap_or(state.size);
                    }
                }
                "Tm" => {
                    let m: Vec<f32> = operands
                        .iter()
                        .filter_map(|o| to_f32(self.resolve(o)))
                        .collect();
                    if m.len() == 6 {
                        state.set_matrix(m[0], m[1], m[2], m[3], m[4], m[5]);
                    }
                }
                "Td" => {
                    if let (Some(tx), Some(ty)) = (
                        operands.first().and_then(|o| to_f32(self.resolve(o))),
                        operands.get(1).and_then(|o| to_f32(self.resolve(o))),
                    ) {
                        state.translate(tx, ty);
                    }
                }
                "TD" => {
                    if let (Some(tx), Some(ty)) = (
                        operands.first().and_then(|o| to_f32(self.resolve(o))),
                        operands.get(1).and_then(|o| to_f32(self.resolve(o))),
                    ) {
                        state.leading = -ty;
                        state.translate(tx, ty);
                    }
                }
                "TL" => {
                    if let Some(l) = operands.first().and_then(|o| to_f32(self.resolve(o))) {
                        state.leading = l;
                    }
                }
                "T*" => state.newline(),
                "rg" => {
                    let c: Vec<f32> = operands
                        .iter()
                        .filter_map(|o| to_f32(self.resolve(o)))
                        .collect();
                    if c.len() == 3 {
                        state.color = Color {
                            r: (c[0] * 255.0) as u8,
                            g: (c[1] * 255.0) as u8,
                            b: (c[2] * 255.0) as u8,
                        };
                    }
                }
                "g" => {
                    if let Some(gray) = operands.first().and_then(|o| to_f32(self.resolve(o))) {
                        let level = (gray * 255.0) as u8;
                        state.color = Color { r: level, g: level, b: level };
                    }
                }
                "Tj" | "'" => {
                    if let Some(Object::String(bytes, _)) = operands.last() {
                        if op.operator == "'" {
                            state.newline();
                        }
                        if let Some(span) = state.show(bytes, &fonts, page_height) {
                            spans.push(span);
                        }
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        let mut bytes = Vec::new();
                        for item in items {
                            if let Object::String(part, _) = self.resolve(item) {
                                bytes.extend_from_slice(part);
                            }
                        }
                        if let Some(span) = state.show(&bytes, &fonts, page_height) {
                            spans.push(span);
                        }
                    }
                }
                _ => {}
            }
        }

        debug!("page {}: {} raw span(s)", page_index, spans.len());
        Ok(spans)
    }

    fn rasterize_page(&self, page_index: usize) -> Result<Bytes, ExtractionError> {
        // lopdf is a parser, not a renderer; embeddings that want the OCR
        // path must supply a rasterizing source.
        Err(ExtractionError::Rasterize(format!(
            "the lopdf source cannot rasterize page {}; supply a rasterizing PdfContentSource",
            page_index
        )))
    }

    fn embedded_images(&self, page_index: usize) -> Result<Vec<ImageRegion>, ExtractionError> {
        let page_id = self.page_id(page_index)?;
        let (_, page_height) = self.media_box(page_id)?;

        // Image streams by XObject name.
        let mut streams: HashMap<Vec<u8>, Bytes> = HashMap::new();
        if let Some(resources) = self
            .inherited(page_id, b"Resources")
            .and_then(|o| o.as_dict().ok())
        {
            if let Some(xobjects) = resources
                .get(b"XObject")
                .ok()
                .map(|o| self.resolve(o))
                .and_then(|o| o.as_dict().ok())
            {
                for (name, entry) in xobjects.iter() {
                    if let Object::Stream(stream) = self.resolve(entry) {
                        let is_image = stream
                            .dict
                            .get(b"Subtype")
                            .ok()
                            .and_then(|o| o.as_name().ok())
                            .map(|n| n == b"Image")
                            .unwrap_or(false);
                        if is_image {
                            streams
                                .insert(name.clone(), Bytes::from(stream.content.clone()));
                        }
                    }
                }
            }
        }
        if streams.is_empty() {
            return Ok(Vec::new());
        }

        // Placement: track the transformation matrix around Do operators.
        // The ubiquitous pattern is `q <matrix> cm /Name Do Q`.
        let content_data = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| ExtractionError::TextLayer(format!("cannot read content stream: {}", e)))?;
        let content = Content::decode(&content_data)
            .map_err(|e| ExtractionError::TextLayer(format!("cannot decode content stream: {}", e)))?;

        let mut regions = Vec::new();
        let mut ctm_stack: Vec<[f32; 6]> = vec![[1.0, 0.0, 0.0, 1.0, 0.0, 0.0]];
        for op in &content.operations {
            match op.operator.as_str() {
                "q" => {
                    let top = *ctm_stack.last().expect("stack never empty");
                    ctm_stack.push(top);
                }
                "Q" => {
                    if ctm_stack.len() > 1 {
                        ctm_stack.pop();
                    }
                }
                "cm" => {
                    let m: Vec<f32> = op
                        .operands
                        .iter()
                        .filter_map(|o| to_f32(self.resolve(o)))
                        .collect();
                    if m.len() == 6 {
                        let top = ctm_stack.last_mut().expect("stack never empty");
                        *top = multiply_matrix(&[m[0], m[1], m[2], m[3], m[4], m[5]], top);
                    }
                }
                "Do" => {
                    let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) else {
                        continue;
                    };
                    let Some(data) = streams.get(name) else {
                        continue;
                    };
                    let m = ctm_stack.last().expect("stack never empty");
                    // The unit square maps to the placed image box.
                    let width = (m[0].powi(2) + m[1].powi(2)).sqrt();
                    let height = (m[2].powi(2) + m[3].powi(2)).sqrt();
                    if width <= 0.0 || height <= 0.0 {
                        warn!("page {}: degenerate image placement ignored", page_index);
                        continue;
                    }
                    regions.push(ImageRegion {
                        data: data.clone(),
                        bbox: Rect::new(m[4], page_height - m[5] - height, width, height),
                    });
                }
                _ => {}
            }
        }
        Ok(regions)
    }
}

/// Simplified text state for span extraction
struct TextState {
    /// Text line matrix [a b c d e f]
    matrix: [f32; 6],
    font: Option<Vec<u8>>,
    size: f32,
    leading: f32,
    color: Color,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            matrix: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            font: None,
            size: 12.0,
            leading: 14.4,
            color: Color::black(),
        }
    }
}

impl TextState {
    fn begin_text(&mut self) {
        self.matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
    }

    fn set_matrix(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.matrix = [a, b, c, d, e, f];
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.matrix[4] += tx * self.matrix[0] + ty * self.matrix[2];
        self.matrix[5] += tx * self.matrix[1] + ty * self.matrix[3];
    }

    fn newline(&mut self) {
        let leading = self.leading;
        self.translate(0.0, -leading);
    }

    /// Effective font size under the current matrix
    fn effective_size(&self) -> f32 {
        let scale = (self.matrix[1].powi(2) + self.matrix[3].powi(2)).sqrt();
        (self.size * scale).max(1.0)
    }

    fn show(
        &mut self,
        bytes: &[u8],
        fonts: &HashMap<Vec<u8>, LoadedFont>,
        page_height: f32,
    ) -> Option<TextSpan> {
        let font = self.font.as_ref().and_then(|name| fonts.get(name));
        let text = match font {
            Some(f) => f.decode(bytes),
            None => bytes.iter().map(|&b| b as char).collect(),
        };
        if text.trim().is_empty() {
            return None;
        }

        let size = self.effective_size();
        let advance: f32 = text
            .chars()
            .map(|c| if (c as u32) >= 0x2E80 { size } else { size * 0.5 })
            .sum();
        let vertical = font.map(|f| f.vertical).unwrap_or(false);

        let x = self.matrix[4];
        let baseline = self.matrix[5];
        let bbox = if vertical {
            Rect::new(x - size / 2.0, page_height - baseline, size, advance)
        } else {
            Rect::new(x, page_height - baseline - size, advance, size * 1.1)
        };

        let span = TextSpan {
            text,
            bbox,
            font: FontInfo {
                name: font.map(|f| f.name.clone()).filter(|n| !n.is_empty()),
                size_pt: size,
                bold: font.map(|f| f.bold).unwrap_or(false),
                italic: font.map(|f| f.italic).unwrap_or(false),
                color: self.color,
            },
            direction: if vertical {
                WritingDirection::Vertical
            } else {
                WritingDirection::Horizontal
            },
        };

        // Advance the show position so sibling spans line up.
        if vertical {
            self.translate(0.0, -advance);
        } else {
            self.translate(advance / self.matrix[0].abs().max(0.01), 0.0);
        }

        Some(span)
    }
}

/// Multiply two PDF matrices (row-vector convention): `a x b`
fn multiply_matrix(a: &[f32; 6], b: &[f32; 6]) -> [f32; 6] {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

fn to_f32(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Parse a ToUnicode CMap's bfchar/bfrange sections into a code map
fn parse_tounicode(data: &str) -> HashMap<u32, String> {
    let mut map = HashMap::new();

    for section in sections_between(data, "beginbfchar", "endbfchar") {
        let tokens = hex_tokens(section);
        for pair in tokens.chunks(2) {
            if let [HexToken::Hex(code), HexToken::Hex(target)] = pair {
                if let (Some(code), Some(text)) = (hex_to_code(code), hex_to_string(target)) {
                    map.insert(code, text);
                }
            }
        }
    }

    for section in sections_between(data, "beginbfrange", "endbfrange") {
        let tokens = hex_tokens(section);
        let mut i = 0usize;
        loop {
            let (Some(HexToken::Hex(lo)), Some(HexToken::Hex(hi))) =
                (tokens.get(i), tokens.get(i + 1))
            else {
                break;
            };
            let (Some(lo), Some(hi)) = (hex_to_code(lo), hex_to_code(hi)) else {
                break;
            };
            match tokens.get(i + 2) {
                Some(HexToken::Hex(start)) => {
                    if let Some(start) = hex_to_code(start) {
                        for offset in 0..=(hi.saturating_sub(lo)) {
                            if let Some(text) =
                                char::from_u32(start + offset).map(|c| c.to_string())
                            {
                                map.insert(lo + offset, text);
                            }
                        }
                    }
                    i += 3;
                }
                Some(HexToken::ArrayOpen) => {
                    let mut j = i + 3;
                    let mut code = lo;
                    while let Some(HexToken::Hex(target)) = tokens.get(j) {
                        if let Some(text) = hex_to_string(target) {
                            map.insert(code, text);
                        }
                        code += 1;
                        j += 1;
                    }
                    // Skip past the closing bracket if present.
                    if matches!(tokens.get(j), Some(HexToken::ArrayClose)) {
                        j += 1;
                    }
                    i = j;
                }
                _ => break,
            }
        }
    }

    map
}

enum HexToken {
    Hex(String),
    ArrayOpen,
    ArrayClose,
}

fn sections_between<'a>(data: &'a str, start: &str, end: &str) -> Vec<&'a str> {
    let mut sections = Vec::new();
    let mut rest = data;
    while let Some(begin) = rest.find(start) {
        let after = &rest[begin + start.len()..];
        match after.find(end) {
            Some(stop) => {
                sections.push(&after[..stop]);
                rest = &after[stop + end.len()..];
            }
            None => break,
        }
    }
    sections
}

fn hex_tokens(section: &str) -> Vec<HexToken> {
    HEX_TOKEN
        .captures_iter(section)
        .filter_map(|caps| {
            if let Some(hex) = caps.get(1) {
                Some(HexToken::Hex(hex.as_str().to_string()))
            } else if caps.get(2).is_some() {
                Some(HexToken::ArrayOpen)
            } else if caps.get(3).is_some() {
                Some(HexToken::ArrayClose)
            } else {
                None
            }
        })
        .collect()
}

fn hex_to_code(hex: &str) -> Option<u32> {
    u32::from_str_radix(hex, 16).ok()
}

/// UTF-16BE hex string to a Rust string
fn hex_to_string(hex: &str) -> Option<String> {
    if hex.len() % 4 != 0 {
        // Single-byte target; treat as a direct code point.
        return hex_to_code(hex).and_then(char::from_u32).map(|c| c.to_string());
    }
    let mut units = Vec::with_capacity(hex.len() / 4);
    for chunk in hex.as_bytes().chunks(4) {
        let s = std::str::from_utf8(chunk).ok()?;
        units.push(u16::from_str_radix(s, 16).ok()?);
    }
    Some(String::from_utf16_lossy(&units))
}
