/*!
 * PDF emission from laid-out pages.
 *
 * A deliberately small PDF 1.4 writer: header, body objects, xref table,
 * trailer. Text is drawn line by line with the Helvetica base fonts at the
 * coordinates and sizes the fit pass computed, so the output replicates the
 * source geometry. JPEG images are embedded via DCTDecode passthrough;
 * other formats are drawn as outlined placeholder boxes at the exact
 * bounding box (the HTML output always carries the verbatim bytes).
 *
 * Output is byte-deterministic for a given laid-out document: no
 * timestamps, no document ids, no compression.
 */

use crate::errors::RenderError;
use crate::layout::{ImageFormat, ImageRef, Rect};

use super::text_fit::{LaidOutItem, LaidOutPage, PlacedText};

/// Base font resource names, indexed by (bold, italic)
const FONT_RESOURCES: [(&str, &str); 4] = [
    ("F1", "Helvetica"),
    ("F2", "Helvetica-Bold"),
    ("F3", "Helvetica-Oblique"),
    ("F4", "Helvetica-BoldOblique"),
];

fn font_resource(bold: bool, italic: bool) -> &'static str {
    match (bold, italic) {
        (false, false) => FONT_RESOURCES[0].0,
        (true, false) => FONT_RESOURCES[1].0,
        (false, true) => FONT_RESOURCES[2].0,
        (true, true) => FONT_RESOURCES[3].0,
    }
}

/// PDF emitter over laid-out pages
#[derive(Debug, Default)]
pub struct PdfEmitter;

impl PdfEmitter {
    /// Create an emitter
    pub fn new() -> Self {
        Self
    }

    /// Serialize the given pages into one PDF document.
    ///
    /// Works identically for a single page (the per-page render contract)
    /// and for the assembled document.
    pub fn emit(&self, pages: &[LaidOutPage]) -> Result<Vec<u8>, RenderError> {
        let mut doc = DocumentWriter::new();

        // Object ids are assigned up front so references can be written
        // before their targets: catalog, pages root, four fonts, then per
        // page [image objects..., content, page].
        let catalog_id = doc.alloc();
        let pages_id = doc.alloc();
        let font_ids: Vec<u32> = FONT_RESOURCES.iter().map(|_| doc.alloc()).collect();

        let mut page_plans = Vec::with_capacity(pages.len());
        for page in pages {
            let image_ids: Vec<u32> = page
                .items
                .iter()
                .filter(|item| matches!(item, LaidOutItem::Image(i) if i.image.format == ImageFormat::Jpeg))
                .map(|_| doc.alloc())
                .collect();
            let content_id = doc.alloc();
            let page_id = doc.alloc();
            page_plans.push((page, image_ids, content_id, page_id));
        }

        doc.object(
            catalog_id,
            format!("<< /Type /Catalog /Pages {} 0 R >>", pages_id),
        );

        let kids: Vec<String> = page_plans
            .iter()
            .map(|(_, _, _, page_id)| format!("{} 0 R", page_id))
            .collect();
        doc.object(
            pages_id,
            format!(
                "<< /Type /Pages /Kids [ {} ] /Count {} >>",
                kids.join(" "),
                page_plans.len()
            ),
        );

        for (font_id, (_, base_font)) in font_ids.iter().zip(FONT_RESOURCES.iter()) {
            doc.object(
                *font_id,
                format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    base_font
                ),
            );
        }

        for (page, image_ids, content_id, page_id) in page_plans {
            let mut xobjects = Vec::new();
            let mut image_id_iter = image_ids.iter();
            let mut content = String::with_capacity(2048);

            for item in &page.items {
                match item {
                    LaidOutItem::Image(image) => match image.image.format {
                        ImageFormat::Jpeg => {
                            let id = *image_id_iter.next().expect("image id allocated above");
                            let name = format!("Im{}", xobjects.len() + 1);
                            write_jpeg_object(&mut doc, id, &image.image)?;
                            content.push_str(&draw_image(&name, &image.bbox, page.height));
                            xobjects.push((name, id));
                        }
                        _ => content.push_str(&draw_placeholder(&image.bbox, page.height)),
                    },
                    LaidOutItem::Text(text) => {
                        content.push_str(&draw_text(text, page.height));
                    }
                }
            }

            doc.stream_object(content_id, content.as_bytes());

            let fonts: Vec<String> = FONT_RESOURCES
                .iter()
                .zip(font_ids.iter())
                .map(|((name, _), id)| format!("/{} {} 0 R", name, id))
                .collect();
            let xobject_entry = if xobjects.is_empty() {
                String::new()
            } else {
                let entries: Vec<String> = xobjects
                    .iter()
                    .map(|(name, id)| format!("/{} {} 0 R", name, id))
                    .collect();
                format!(" /XObject << {} >>", entries.join(" "))
            };

            doc.object(
                page_id,
                format!(
                    "<< /Type /Page /Parent {} 0 R /MediaBox [ 0 0 {} {} ] /Resources << /Font << {} >>{} >> /Contents {} 0 R >>",
                    pages_id,
                    fmt_num(page.width),
                    fmt_num(page.height),
                    fonts.join(" "),
                    xobject_entry,
                    content_id
                ),
            );
        }

        doc.finish(catalog_id)
    }
}

/// Accumulates objects and byte offsets for the xref table
struct DocumentWriter {
    buffer: Vec<u8>,
    /// (object id, byte offset) in emission order
    offsets: Vec<(u32, usize)>,
    next_id: u32,
}

impl DocumentWriter {
    fn new() -> Self {
        let mut buffer = Vec::with_capacity(16 * 1024);
        // Binary comment line marks the file as non-ASCII per convention.
        buffer.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buffer,
            offsets: Vec::new(),
            next_id: 1,
        }
    }

    fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn object(&mut self, id: u32, body: String) {
        self.offsets.push((id, self.buffer.len()));
        self.buffer
            .extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", id, body).as_bytes());
    }

    fn stream_object(&mut self, id: u32, data: &[u8]) {
        self.offsets.push((id, self.buffer.len()));
        self.buffer.extend_from_slice(
            format!("{} 0 obj\n<< /Length {} >>\nstream\n", id, data.len()).as_bytes(),
        );
        self.buffer.extend_from_slice(data);
        self.buffer.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn raw_stream_object(&mut self, id: u32, dict: String, data: &[u8]) {
        self.offsets.push((id, self.buffer.len()));
        self.buffer
            .extend_from_slice(format!("{} 0 obj\n{}\nstream\n", id, dict).as_bytes());
        self.buffer.extend_from_slice(data);
        self.buffer.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn finish(mut self, catalog_id: u32) -> Result<Vec<u8>, RenderError> {
        let object_count = self.next_id;
        self.offsets.sort_by_key(|(id, _)| *id);

        // Ids are allocated densely from 1; a gap means an allocated object
        // was never written.
        for (expected, (id, _)) in (1..object_count).zip(self.offsets.iter()) {
            if *id != expected {
                return Err(RenderError::PdfEmit(format!(
                    "object {} allocated but never emitted",
                    expected
                )));
            }
        }

        let xref_offset = self.buffer.len();
        self.buffer
            .extend_from_slice(format!("xref\n0 {}\n", object_count).as_bytes());
        self.buffer
            .extend_from_slice(b"0000000000 65535 f \n");
        for (_, offset) in &self.offsets {
            self.buffer
                .extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        self.buffer.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
                object_count, catalog_id, xref_offset
            )
            .as_bytes(),
        );
        Ok(self.buffer)
    }
}

/// Draw one re-flowed text block; lines share a text object, style switches
/// select the matching Helvetica variant
fn draw_text(text: &PlacedText, page_height: f32) -> String {
    let mut out = String::with_capacity(256);
    out.push_str(&format!(
        "{} {} {} rg\n",
        fmt_num(text.color.r as f32 / 255.0),
        fmt_num(text.color.g as f32 / 255.0),
        fmt_num(text.color.b as f32 / 255.0),
    ));
    out.push_str("BT\n");

    for (i, line) in text.lines.iter().enumerate() {
        // Baseline: top of box, down one line height per line, ascent
        // approximated by the font size.
        let baseline_model = text.bbox.y + i as f32 * text.line_height_pt + text.font_size_pt;
        let y = page_height - baseline_model;
        out.push_str(&format!(
            "1 0 0 1 {} {} Tm\n",
            fmt_num(text.bbox.x),
            fmt_num(y)
        ));
        for segment in &line.segments {
            out.push_str(&format!(
                "/{} {} Tf\n({}) Tj\n",
                font_resource(segment.bold, segment.italic),
                fmt_num(text.font_size_pt),
                escape_pdf_text(&segment.text)
            ));
        }
    }

    out.push_str("ET\n");
    out
}

/// Place a JPEG XObject at its box
fn draw_image(name: &str, bbox: &Rect, page_height: f32) -> String {
    let y = page_height - bbox.bottom();
    format!(
        "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
        fmt_num(bbox.width),
        fmt_num(bbox.height),
        fmt_num(bbox.x),
        fmt_num(y),
        name
    )
}

/// Outlined placeholder for images the writer cannot embed
fn draw_placeholder(bbox: &Rect, page_height: f32) -> String {
    let y = page_height - bbox.bottom();
    format!(
        "q\n0.6 G\n{x} {y} {w} {h} re S\n{x} {y} m {x2} {y2} l S\n{x} {y2} m {x2} {y} l S\nQ\n",
        x = fmt_num(bbox.x),
        y = fmt_num(y),
        w = fmt_num(bbox.width),
        h = fmt_num(bbox.height),
        x2 = fmt_num(bbox.right()),
        y2 = fmt_num(y + bbox.height),
    )
}

/// Write a JPEG image XObject, reading dimensions from the SOF header
fn write_jpeg_object(doc: &mut DocumentWriter, id: u32, image: &ImageRef) -> Result<(), RenderError> {
    let info = parse_jpeg_header(&image.data)
        .ok_or_else(|| RenderError::PdfEmit("unparseable JPEG header".to_string()))?;

    let color_space = match info.components {
        1 => "/DeviceGray",
        4 => "/DeviceCMYK",
        _ => "/DeviceRGB",
    };
    let dict = format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent {} /Filter /DCTDecode /Length {} >>",
        info.width,
        info.height,
        color_space,
        info.bits_per_component,
        image.data.len()
    );
    doc.raw_stream_object(id, dict, &image.data);
    Ok(())
}

/// Pixel geometry read from a JPEG start-of-frame marker
struct JpegInfo {
    width: u16,
    height: u16,
    components: u8,
    bits_per_component: u8,
}

/// Scan JPEG markers for the first SOF segment
fn parse_jpeg_header(data: &[u8]) -> Option<JpegInfo> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut pos = 2usize;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        // Standalone markers without a length field
        if (0xD0..=0xD9).contains(&marker) || marker == 0x01 {
            pos += 2;
            continue;
        }
        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        // SOF0..SOF15 excluding DHT/JPG/DAC
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            if pos + 9 > data.len() {
                return None;
            }
            return Some(JpegInfo {
                bits_per_component: data[pos + 4],
                height: u16::from_be_bytes([data[pos + 5], data[pos + 6]]),
                width: u16::from_be_bytes([data[pos + 7], data[pos + 8]]),
                components: data[pos + 9],
            });
        }
        pos += 2 + length;
    }
    None
}

/// Escape text for a PDF literal string, mapping to WinAnsi bytes.
///
/// Characters without a WinAnsi mapping degrade to `?`; translated output
/// is English so this is a corner case, not the common path.
fn escape_pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\\' => out.push_str("\\\\"),
            '\n' | '\r' => out.push(' '),
            '\u{2026}' => out.push_str("\\205"), // ellipsis
            '\u{2018}' => out.push_str("\\221"),
            '\u{2019}' => out.push_str("\\222"),
            '\u{201C}' => out.push_str("\\223"),
            '\u{201D}' => out.push_str("\\224"),
            '\u{2013}' => out.push_str("\\226"), // en dash
            '\u{2014}' => out.push_str("\\227"), // em dash
            c if (c as u32) < 0x80 => out.push(c),
            c if (c as u32) <= 0xFF => out.push_str(&format!("\\{:03o}", c as u32)),
            _ => out.push('?'),
        }
    }
    out
}

/// Format a coordinate without float noise
fn fmt_num(value: f32) -> String {
    if (value - value.round()).abs() < 0.005 {
        format!("{}", value.round() as i64)
    } else {
        format!("{:.2}", value)
    }
}
