/*!
 * Capability boundary for PDF content access and OCR.
 *
 * Raw PDF byte parsing and OCR recognition are external capabilities: the
 * extraction engine consumes these narrow traits and nothing else, so a
 * different PDF backend or OCR engine can be swapped in without touching any
 * other component.
 */

use bytes::Bytes;

use crate::errors::ExtractionError;
use crate::layout::{Color, Rect, WritingDirection};

/// One positioned span from the PDF text layer
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// Span text as decoded from the content stream
    pub text: String,
    /// Bounding box in page coordinates (top-left origin)
    pub bbox: Rect,
    /// Font metadata
    pub font: FontInfo,
    /// Writing direction of the span
    pub direction: WritingDirection,
}

/// Font metadata attached to a text span
#[derive(Debug, Clone)]
pub struct FontInfo {
    /// Font family name as reported by the document, if any
    pub name: Option<String>,
    /// Font size in points
    pub size_pt: f32,
    /// Bold flag (from font flags or name heuristics in the source)
    pub bold: bool,
    /// Italic flag
    pub italic: bool,
    /// Fill color
    pub color: Color,
}

impl FontInfo {
    /// Plain font info at the given size
    pub fn sized(size_pt: f32) -> Self {
        Self {
            name: None,
            size_pt,
            bold: false,
            italic: false,
            color: Color::black(),
        }
    }
}

/// One recognized span from OCR
#[derive(Debug, Clone)]
pub struct OcrSpan {
    /// Recognized text; empty when the region could not be read
    pub text: String,
    /// Bounding box in page coordinates
    pub bbox: Rect,
    /// Recognition confidence in `[0, 1]`
    pub confidence: f32,
}

/// One embedded image region
#[derive(Debug, Clone)]
pub struct ImageRegion {
    /// Raw image bytes, retained verbatim
    pub data: Bytes,
    /// Placement box in page coordinates
    pub bbox: Rect,
}

/// Read access to an opened PDF document.
///
/// Implementations wrap whatever PDF library the embedding application uses;
/// the pipeline only ever sees this trait.
pub trait PdfContentSource: Send + Sync {
    /// Number of pages in the document
    fn page_count(&self) -> Result<usize, ExtractionError>;

    /// Page dimensions `(width, height)` in points
    fn page_dimensions(&self, page_index: usize) -> Result<(f32, f32), ExtractionError>;

    /// Positioned text spans from the page's text layer.
    ///
    /// An empty vector is a valid answer (scanned page); it triggers the
    /// OCR fallback, not an error.
    fn extract_text_layer(&self, page_index: usize) -> Result<Vec<TextSpan>, ExtractionError>;

    /// Rasterize the full page to an image (used as OCR input and as the
    /// background of OCR-extracted pages)
    fn rasterize_page(&self, page_index: usize) -> Result<Bytes, ExtractionError>;

    /// Every embedded raster/vector region on the page, bytes verbatim
    fn embedded_images(&self, page_index: usize) -> Result<Vec<ImageRegion>, ExtractionError>;
}

/// OCR recognition over a rasterized page image
pub trait OcrEngine: Send + Sync {
    /// Recognize text regions in the image.
    ///
    /// Regions the engine located but could not read should be returned with
    /// empty text and confidence 0.0 rather than dropped, so downstream
    /// stages can see coverage gaps.
    fn recognize(&self, image: &[u8]) -> Result<Vec<OcrSpan>, ExtractionError>;
}
