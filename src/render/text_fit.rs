/*!
 * Text re-flow under geometry constraints.
 *
 * Translated text is laid into the original bounding box with a greedy
 * line-breaking pass at the original font size. If the laid-out height
 * exceeds the box plus the configured overflow allowance, the font size is
 * shrunk in fixed steps down to a floor; if the floor still overflows, the
 * text is truncated with an ellipsis and the block flagged. Both output
 * emitters consume the resulting `LaidOutPage`, so HTML and PDF agree on
 * every line break and font size.
 *
 * Widths are estimated from per-character-class approximations of the
 * Helvetica metrics; no font files are consulted at render time.
 */

use log::debug;

use crate::errors::RenderError;
use crate::layout::{
    BlockKind, Color, ImageRef, Page, Rect, RunTranslation, TextBlock, TextRun,
};

/// Ellipsis appended to truncated blocks
const ELLIPSIS: char = '\u{2026}';

/// Re-flow tuning knobs
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Permitted height growth (percent of box height) before font shrink
    pub overflow_allowance_pct: f32,
    /// Font size floor in points
    pub min_font_size_pt: f32,
    /// Shrink step in points
    pub font_shrink_step_pt: f32,
    /// Line height as a multiple of font size
    pub line_height_factor: f32,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            overflow_allowance_pct: 15.0,
            min_font_size_pt: 6.0,
            font_shrink_step_pt: 0.5,
            line_height_factor: 1.2,
        }
    }
}

/// A page after re-flow, ready for emission
#[derive(Debug, Clone)]
pub struct LaidOutPage {
    /// 0-based page index
    pub index: usize,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Placed items in draw order (z-order, reading order within a level)
    pub items: Vec<LaidOutItem>,
    /// Rasterized page background from the OCR path, if any
    pub background: Option<ImageRef>,
}

/// One placed output item
#[derive(Debug, Clone)]
pub enum LaidOutItem {
    /// Re-flowed text at a computed font size
    Text(PlacedText),
    /// An image at its original box
    Image(PlacedImage),
}

/// Degradation markers carried into the outputs so reviewers can find every
/// degraded block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradeFlag {
    /// Text was truncated at the font floor
    OverflowTruncated,
    /// At least one run fell back to the failure sentinel
    TranslationFailed,
    /// Block came from OCR with confidence below 1.0
    LowConfidence,
}

/// A re-flowed text block
#[derive(Debug, Clone)]
pub struct PlacedText {
    /// Original bounding box
    pub bbox: Rect,
    /// Wrapped lines in draw order
    pub lines: Vec<PlacedLine>,
    /// Computed font size after shrink-to-fit
    pub font_size_pt: f32,
    /// Line height in points
    pub line_height_pt: f32,
    /// Text color (dominant run)
    pub color: Color,
    /// Source confidence of the owning block
    pub confidence: f32,
    /// Degradation markers
    pub flags: Vec<DegradeFlag>,
}

/// One wrapped line of styled segments
#[derive(Debug, Clone, Default)]
pub struct PlacedLine {
    /// Styled segments in order
    pub segments: Vec<PlacedSegment>,
}

impl PlacedLine {
    /// Concatenated plain text of the line
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// A run of characters sharing one emphasis style within a line
#[derive(Debug, Clone)]
pub struct PlacedSegment {
    /// Segment text
    pub text: String,
    /// Bold emphasis
    pub bold: bool,
    /// Italic emphasis
    pub italic: bool,
}

/// An image placed at its original box
#[derive(Debug, Clone)]
pub struct PlacedImage {
    /// Original bounding box, carried through exactly
    pub bbox: Rect,
    /// Image bytes and format
    pub image: ImageRef,
}

/// Styled word used during wrapping
#[derive(Debug, Clone)]
struct Word {
    text: String,
    bold: bool,
    italic: bool,
}

/// Lay out every block of a translated page.
///
/// Items are ordered by z-order (stable within a level, preserving reading
/// order), so emitters can draw front-to-back without re-sorting.
pub fn layout_page(page: &Page, options: &FitOptions) -> Result<LaidOutPage, RenderError> {
    let mut indexed: Vec<(usize, &crate::layout::LayoutBlock)> =
        page.blocks().iter().enumerate().collect();
    indexed.sort_by_key(|(i, b)| (b.z_order, *i));

    let mut items = Vec::new();
    for (_, block) in indexed {
        match &block.kind {
            BlockKind::Image(image_block) => {
                items.push(LaidOutItem::Image(PlacedImage {
                    bbox: block.bbox,
                    image: image_block.image.clone(),
                }));
            }
            BlockKind::Text(text_block) => {
                if let Some(placed) =
                    fit_text_block(page.index(), text_block, block.bbox, block.confidence, options)?
                {
                    items.push(LaidOutItem::Text(placed));
                }
            }
            BlockKind::Table(table) => {
                // Best-effort table placement: each cell re-flows into its
                // own box like a free-standing text block.
                for cell in &table.cells {
                    if let Some(placed) = fit_text_block(
                        page.index(),
                        &cell.content,
                        cell.bbox,
                        block.confidence,
                        options,
                    )? {
                        items.push(LaidOutItem::Text(placed));
                    }
                }
            }
        }
    }

    Ok(LaidOutPage {
        index: page.index(),
        width: page.width(),
        height: page.height(),
        items,
        background: page.background().cloned(),
    })
}

/// Fit one text block; returns None for blocks with nothing to draw (empty
/// OCR coverage gaps)
fn fit_text_block(
    page_index: usize,
    block: &TextBlock,
    bbox: Rect,
    confidence: f32,
    options: &FitOptions,
) -> Result<Option<PlacedText>, RenderError> {
    let words = collect_words(&block.runs);
    if words.is_empty() {
        return Ok(None);
    }

    if bbox.width < options.min_font_size_pt * 0.3 {
        // Narrower than a single character at the floor size; truncation
        // cannot save this box.
        return Err(RenderError::LayoutImpossible {
            page_index,
            reason: format!("box {:?} too narrow for any text", bbox),
        });
    }

    let base_size = block
        .runs
        .iter()
        .map(|r| r.font.size_pt)
        .fold(0.0_f32, f32::max)
        .max(options.min_font_size_pt);
    let color = block
        .runs
        .first()
        .map(|r| r.font.color)
        .unwrap_or_default();

    let mut flags = Vec::new();
    if block
        .runs
        .iter()
        .any(|r| r.translation == RunTranslation::Failed)
    {
        flags.push(DegradeFlag::TranslationFailed);
    }
    if confidence < 1.0 {
        flags.push(DegradeFlag::LowConfidence);
    }

    let max_height = bbox.height * (1.0 + options.overflow_allowance_pct / 100.0);

    // Greedy wrap at the original size, shrinking in fixed steps until the
    // laid-out height fits the allowance or the floor is reached.
    let mut size = base_size;
    loop {
        let lines = wrap_words(&words, bbox.width, size);
        let line_height = size * options.line_height_factor;
        let fits = lines.len() as f32 * line_height <= max_height;

        if fits {
            return Ok(Some(PlacedText {
                bbox,
                lines,
                font_size_pt: size,
                line_height_pt: line_height,
                color,
                confidence,
                flags,
            }));
        }

        let next = size - options.font_shrink_step_pt;
        if next < options.min_font_size_pt {
            // Floor reached and still overflowing: truncate with an
            // ellipsis and flag the block.
            let line_height = options.min_font_size_pt * options.line_height_factor;
            let max_lines = ((max_height / line_height).floor() as usize).max(1);
            let truncated = truncate_lines(lines, max_lines);
            flags.push(DegradeFlag::OverflowTruncated);
            debug!(
                "page {}: block at {:?} truncated to {} line(s) at floor size",
                page_index,
                bbox,
                truncated.len()
            );
            return Ok(Some(PlacedText {
                bbox,
                lines: truncated,
                font_size_pt: options.min_font_size_pt,
                line_height_pt: line_height,
                color,
                confidence,
                flags,
            }));
        }
        size = next;
    }
}

/// Flatten a block's runs into styled words.
///
/// Vertical-direction source runs contribute words exactly like horizontal
/// ones: output is always horizontal text.
fn collect_words(runs: &[TextRun]) -> Vec<Word> {
    let mut words = Vec::new();
    for run in runs {
        for word in run.output_text().split_whitespace() {
            words.push(Word {
                text: word.to_string(),
                bold: run.font.bold,
                italic: run.font.italic,
            });
        }
    }
    words
}

/// Greedy word wrap at a fixed size; words wider than the box are broken
/// hard at character boundaries
fn wrap_words(words: &[Word], box_width: f32, size: f32) -> Vec<PlacedLine> {
    let space_width = char_width_em(' ') * size;
    let mut lines: Vec<PlacedLine> = Vec::new();
    let mut current = PlacedLine::default();
    let mut current_width = 0.0_f32;

    let mut push_piece = |lines: &mut Vec<PlacedLine>,
                          current: &mut PlacedLine,
                          current_width: &mut f32,
                          piece: &Word| {
        let piece_width = text_width(&piece.text, size);
        let lead = if current.segments.is_empty() { 0.0 } else { space_width };

        if !current.segments.is_empty() && *current_width + lead + piece_width > box_width {
            lines.push(std::mem::take(current));
            *current_width = 0.0;
        }

        let separator = if current.segments.is_empty() { "" } else { " " };
        match current.segments.last_mut() {
            Some(last) if last.bold == piece.bold && last.italic == piece.italic => {
                last.text.push_str(separator);
                last.text.push_str(&piece.text);
            }
            _ => current.segments.push(PlacedSegment {
                text: format!("{}{}", separator, piece.text),
                bold: piece.bold,
                italic: piece.italic,
            }),
        }
        *current_width += if separator.is_empty() { 0.0 } else { space_width } + piece_width;
    };

    for word in words {
        if text_width(&word.text, size) <= box_width {
            push_piece(&mut lines, &mut current, &mut current_width, word);
            continue;
        }

        // Hard-break an overlong word into box-width chunks.
        let mut chunk = String::new();
        let mut chunk_width = 0.0_f32;
        for c in word.text.chars() {
            let w = char_width_em(c) * size;
            if !chunk.is_empty() && chunk_width + w > box_width {
                push_piece(
                    &mut lines,
                    &mut current,
                    &mut current_width,
                    &Word { text: std::mem::take(&mut chunk), bold: word.bold, italic: word.italic },
                );
                chunk_width = 0.0;
            }
            chunk.push(c);
            chunk_width += w;
        }
        if !chunk.is_empty() {
            push_piece(
                &mut lines,
                &mut current,
                &mut current_width,
                &Word { text: chunk, bold: word.bold, italic: word.italic },
            );
        }
    }

    if !current.segments.is_empty() {
        lines.push(current);
    }
    lines
}

/// Keep the first `max_lines` lines, appending an ellipsis to the last one
fn truncate_lines(mut lines: Vec<PlacedLine>, max_lines: usize) -> Vec<PlacedLine> {
    if lines.len() <= max_lines {
        return lines;
    }
    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        match last.segments.last_mut() {
            Some(segment) => segment.text.push(ELLIPSIS),
            None => last.segments.push(PlacedSegment {
                text: ELLIPSIS.to_string(),
                bold: false,
                italic: false,
            }),
        }
    }
    lines
}

/// Estimated advance width of a string at the given size
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().map(|c| char_width_em(c) * size).sum()
}

/// Approximate per-character advance widths in em units.
///
/// Helvetica-flavored estimates; the English output never needs exact
/// metrics, only consistent ones shared by the fit pass and both emitters.
fn char_width_em(c: char) -> f32 {
    match c {
        'i' | 'l' | 'j' | '!' | '\'' | '|' | '.' | ',' | ';' | ':' => 0.28,
        't' | 'f' | 'r' | '(' | ')' | '[' | ']' | '-' | ' ' => 0.33,
        'm' | 'w' | 'M' | 'W' | '@' | '%' => 0.85,
        'A'..='Z' | '0'..='9' | '_' | '+' | '=' | '?' | '&' | '#' => 0.66,
        c if (c as u32) >= 0x2E80 => 1.0, // CJK and fullwidth forms
        _ => 0.50,
    }
}
