/*!
 * The layout graph: a structured, positioned representation of document
 * content, independent of the source PDF encoding.
 *
 * The model is deliberately behavior-free apart from invariant-preserving
 * constructors and the reading-order run traversal that the translation and
 * reconstruction stages share. Blocks are stored in reading order, which is
 * established once at extraction time and never reordered afterwards.
 */

use bytes::Bytes;
use uuid::Uuid;

use super::geometry::Rect;
use crate::errors::LayoutError;

/// Confidence assigned to blocks that came straight from the PDF text layer
pub const TEXT_LAYER_CONFIDENCE: f32 = 1.0;

/// A document is an ordered sequence of pages
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Pages in document order
    pub pages: Vec<Page>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self { pages: Vec::new() }
    }

    /// Number of pages
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// A single page of the layout graph
#[derive(Debug, Clone)]
pub struct Page {
    index: usize,
    width: f32,
    height: f32,
    blocks: Vec<LayoutBlock>,
    /// Rasterized page image, present only when OCR fallback ran
    background: Option<ImageRef>,
}

impl Page {
    /// Create a new empty page; dimensions must be strictly positive
    pub fn new(index: usize, width: f32, height: f32) -> Result<Self, LayoutError> {
        if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
            return Err(LayoutError::InvalidPageDimensions {
                page_index: index,
                width,
                height,
            });
        }
        Ok(Self {
            index,
            width,
            height,
            blocks: Vec::new(),
            background: None,
        })
    }

    /// 0-based page index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Page width in points
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Page height in points
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Page bounding box (origin at 0,0)
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Blocks in reading order
    pub fn blocks(&self) -> &[LayoutBlock] {
        &self.blocks
    }

    /// Rasterized background, if OCR fallback produced one
    pub fn background(&self) -> Option<&ImageRef> {
        self.background.as_ref()
    }

    /// Attach the rasterized page image used for OCR
    pub fn set_background(&mut self, image: ImageRef) {
        self.background = Some(image);
    }

    /// Append a block, enforcing that its bounding box lies within the page.
    ///
    /// Fails with [`LayoutError::InvalidGeometry`] otherwise; the block is
    /// returned untouched inside the error path by value semantics (it is
    /// simply dropped).
    pub fn push_block(&mut self, block: LayoutBlock) -> Result<(), LayoutError> {
        if !self.bounds().contains(&block.bbox) {
            return Err(LayoutError::InvalidGeometry {
                page_index: self.index,
                page_width: self.width,
                page_height: self.height,
                bbox: block.bbox,
            });
        }
        self.blocks.push(block);
        Ok(())
    }

    /// Fraction of the page area covered by text blocks.
    ///
    /// Overlaps are not subtracted; magazine text blocks rarely overlap and
    /// the value only feeds the OCR-fallback threshold.
    pub fn text_coverage(&self) -> f32 {
        let page_area = self.bounds().area();
        if page_area <= 0.0 {
            return 0.0;
        }
        let text_area: f32 = self
            .blocks
            .iter()
            .filter(|b| matches!(b.kind, BlockKind::Text(_)))
            .map(|b| b.bbox.area())
            .sum();
        (text_area / page_area).min(1.0)
    }

    /// Iterate all text runs in reading order as `(RunRef, &TextRun)`.
    ///
    /// Table cells are visited in cell order after their owning block's
    /// position in the reading order. Callers stay polymorphic over block
    /// kinds: this is the only traversal translation and reconstruction use.
    pub fn runs(&self) -> impl Iterator<Item = (RunRef, &TextRun)> {
        self.blocks.iter().enumerate().flat_map(|(block_idx, block)| {
            let runs: Vec<(RunRef, &TextRun)> = match &block.kind {
                BlockKind::Text(text) => text
                    .runs
                    .iter()
                    .enumerate()
                    .map(|(run_idx, run)| (RunRef { block: block_idx, run: run_idx }, run))
                    .collect(),
                BlockKind::Table(table) => table
                    .cells
                    .iter()
                    .flat_map(|cell| cell.content.runs.iter())
                    .enumerate()
                    .map(|(run_idx, run)| (RunRef { block: block_idx, run: run_idx }, run))
                    .collect(),
                BlockKind::Image(_) => Vec::new(),
            };
            runs
        })
    }

    /// Resolve a run reference to a mutable text run for write-back
    pub fn run_mut(&mut self, r: RunRef) -> Result<&mut TextRun, LayoutError> {
        let page_index = self.index;
        let dangling = LayoutError::DanglingRunRef {
            page_index,
            block: r.block,
            run: r.run,
        };
        let block = self.blocks.get_mut(r.block).ok_or_else(|| LayoutError::DanglingRunRef {
            page_index,
            block: r.block,
            run: r.run,
        })?;
        match &mut block.kind {
            BlockKind::Text(text) => text.runs.get_mut(r.run).ok_or(dangling),
            BlockKind::Table(table) => table
                .cells
                .iter_mut()
                .flat_map(|cell| cell.content.runs.iter_mut())
                .nth(r.run)
                .ok_or(dangling),
            BlockKind::Image(_) => Err(dangling),
        }
    }
}

/// Stable reference from a translation unit back to its owning run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunRef {
    /// Block index within the page's reading order
    pub block: usize,
    /// Run index within the block (flattened cell order for tables)
    pub run: usize,
}

/// A positioned content unit on a page
#[derive(Debug, Clone)]
pub struct LayoutBlock {
    /// Unique block id
    pub id: Uuid,
    /// Bounding box in page coordinates
    pub bbox: Rect,
    /// Draw order for overlapping elements; lower draws first
    pub z_order: i32,
    /// 1.0 for text-layer extraction, the OCR confidence otherwise
    pub confidence: f32,
    /// Content payload
    pub kind: BlockKind,
}

impl LayoutBlock {
    /// Create a block with a fresh id
    pub fn new(bbox: Rect, z_order: i32, confidence: f32, kind: BlockKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            bbox,
            z_order,
            confidence,
            kind,
        }
    }

    /// Convenience constructor for a text block
    pub fn text(bbox: Rect, z_order: i32, confidence: f32, runs: Vec<TextRun>) -> Self {
        Self::new(bbox, z_order, confidence, BlockKind::Text(TextBlock { runs }))
    }

    /// Convenience constructor for an image block
    pub fn image(bbox: Rect, z_order: i32, image: ImageRef) -> Self {
        Self::new(
            bbox,
            z_order,
            TEXT_LAYER_CONFIDENCE,
            BlockKind::Image(ImageBlock { image }),
        )
    }
}

/// Block content variants
#[derive(Debug, Clone)]
pub enum BlockKind {
    /// Translatable text
    Text(TextBlock),
    /// Opaque image, passed through untouched
    Image(ImageBlock),
    /// Best-effort table placement
    Table(TableBlock),
}

/// Ordered text runs forming one block
#[derive(Debug, Clone, Default)]
pub struct TextBlock {
    /// Runs in reading order; concatenating their source texts reconstructs
    /// the block's linear text
    pub runs: Vec<TextRun>,
}

impl TextBlock {
    /// The block's linear source text
    pub fn linear_text(&self) -> String {
        self.runs.iter().map(|r| r.source.as_str()).collect()
    }
}

/// Smallest translatable span sharing one font style
#[derive(Debug, Clone)]
pub struct TextRun {
    /// Original (Japanese) text
    pub source: String,
    /// Translation state; never left `Pending` after the translation stage
    pub translation: RunTranslation,
    /// Font styling carried from extraction
    pub font: FontStyle,
    /// Source writing direction; output is always horizontal
    pub direction: WritingDirection,
}

impl TextRun {
    /// Create a pending run
    pub fn new(source: impl Into<String>, font: FontStyle, direction: WritingDirection) -> Self {
        Self {
            source: source.into(),
            translation: RunTranslation::Pending,
            font,
            direction,
        }
    }

    /// Text to render: the translation when present, the visible sentinel
    /// when all backends failed, the source text otherwise
    pub fn output_text(&self) -> &str {
        match &self.translation {
            RunTranslation::Translated(text) => text,
            RunTranslation::Failed => TRANSLATION_FAILED_SENTINEL,
            RunTranslation::Pending => &self.source,
        }
    }
}

/// Visible sentinel substituted for units whose backends were all exhausted
pub const TRANSLATION_FAILED_SENTINEL: &str = "[translation failed]";

/// Translation state of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunTranslation {
    /// Not yet translated
    Pending,
    /// Successfully translated (or passed through for whitespace-only runs)
    Translated(String),
    /// Every backend was exhausted; render the failure sentinel
    Failed,
}

/// Writing direction of a source run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritingDirection {
    /// Left-to-right horizontal text
    #[default]
    Horizontal,
    /// Top-to-bottom vertical text (common in Japanese magazines)
    Vertical,
}

/// Font styling of a run
#[derive(Debug, Clone, PartialEq)]
pub struct FontStyle {
    /// Font family hint from the source document, if any
    pub family: Option<String>,
    /// Font size in points
    pub size_pt: f32,
    /// Bold flag
    pub bold: bool,
    /// Italic flag
    pub italic: bool,
    /// Text color
    pub color: Color,
}

impl FontStyle {
    /// Plain style at the given size
    pub fn sized(size_pt: f32) -> Self {
        Self {
            family: None,
            size_pt,
            bold: false,
            italic: false,
            color: Color::black(),
        }
    }
}

impl Default for FontStyle {
    fn default() -> Self {
        Self::sized(12.0)
    }
}

/// RGB text color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    /// Red component
    pub r: u8,
    /// Green component
    pub g: u8,
    /// Blue component
    pub b: u8,
}

impl Color {
    /// Solid black
    pub fn black() -> Self {
        Self { r: 0, g: 0, b: 0 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Opaque image passed through to the output untouched
#[derive(Debug, Clone)]
pub struct ImageBlock {
    /// The image bytes and sniffed format
    pub image: ImageRef,
}

/// Reference-counted image bytes with a sniffed container format
#[derive(Debug, Clone)]
pub struct ImageRef {
    /// Raw image bytes exactly as extracted
    pub data: Bytes,
    /// Container format sniffed from magic bytes
    pub format: ImageFormat,
}

impl ImageRef {
    /// Wrap raw bytes, sniffing the format
    pub fn new(data: Bytes) -> Self {
        let format = ImageFormat::sniff(&data);
        Self { data, format }
    }
}

/// Image container format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG/JFIF
    Jpeg,
    /// PNG
    Png,
    /// Anything else
    Other,
}

impl ImageFormat {
    /// Sniff the container format from magic bytes
    pub fn sniff(data: &[u8]) -> Self {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            ImageFormat::Jpeg
        } else if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            ImageFormat::Png
        } else {
            ImageFormat::Other
        }
    }

    /// MIME type for HTML data URIs
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Other => "application/octet-stream",
        }
    }
}

/// Best-effort table: positioned cells, each holding a text block
#[derive(Debug, Clone, Default)]
pub struct TableBlock {
    /// Cells in reading order
    pub cells: Vec<TableCell>,
}

/// One positioned table cell
#[derive(Debug, Clone)]
pub struct TableCell {
    /// Cell bounding box in page coordinates
    pub bbox: Rect,
    /// Cell content
    pub content: TextBlock,
}
