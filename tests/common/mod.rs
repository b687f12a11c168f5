/*!
 * Common test utilities shared by the unit and integration suites.
 */

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;

use pagelift::errors::ExtractionError;
use pagelift::extraction::{FontInfo, ImageRegion, OcrEngine, OcrSpan, PdfContentSource, TextSpan};
use pagelift::layout::{
    FontStyle, LayoutBlock, Page, Rect, TextRun, WritingDirection,
};

/// A minimal JPEG (SOI + SOF0 + EOI) that both the format sniffer and the
/// PDF emitter's header parser accept: 32x16 px, 8 bit, 1 component.
pub fn tiny_jpeg() -> Bytes {
    Bytes::from_static(&[
        0xFF, 0xD8, // SOI
        0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x10, 0x00, 0x20, 0x01, 0x11, 0x00, 0x3F, // SOF0
        0xFF, 0xD9, // EOI
    ])
}

/// A minimal PNG signature followed by filler; enough for format sniffing
pub fn tiny_png() -> Bytes {
    Bytes::from_static(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x00])
}

/// Build a horizontal text span at the given box
pub fn span(text: &str, x: f32, y: f32, width: f32, height: f32, size: f32) -> TextSpan {
    TextSpan {
        text: text.to_string(),
        bbox: Rect::new(x, y, width, height),
        font: FontInfo::sized(size),
        direction: WritingDirection::Horizontal,
    }
}

/// Build a page with one single-run text block per `(text, bbox, size)`
pub fn page_with_blocks(index: usize, width: f32, height: f32, blocks: &[(&str, Rect, f32)]) -> Page {
    let mut page = Page::new(index, width, height).expect("valid page dimensions");
    for (text, bbox, size) in blocks {
        let run = TextRun::new(*text, FontStyle::sized(*size), WritingDirection::Horizontal);
        page.push_block(LayoutBlock::text(*bbox, 1, 1.0, vec![run]))
            .expect("block within page");
    }
    page
}

/// One stubbed page of source content
#[derive(Clone, Default)]
pub struct StubPage {
    pub width: f32,
    pub height: f32,
    pub spans: Vec<TextSpan>,
    pub images: Vec<ImageRegion>,
}

impl StubPage {
    pub fn sized(width: f32, height: f32) -> Self {
        Self { width, height, ..Default::default() }
    }
}

/// Scriptable content source for pipeline tests
#[derive(Clone, Default)]
pub struct StubSource {
    pub pages: Vec<StubPage>,
    /// Pages whose text-layer read fails (corrupt content stream)
    pub corrupt_pages: HashSet<usize>,
}

impl StubSource {
    pub fn single(page: StubPage) -> Arc<Self> {
        Arc::new(Self { pages: vec![page], corrupt_pages: HashSet::new() })
    }
}

impl PdfContentSource for StubSource {
    fn page_count(&self) -> Result<usize, ExtractionError> {
        Ok(self.pages.len())
    }

    fn page_dimensions(&self, page_index: usize) -> Result<(f32, f32), ExtractionError> {
        let page = self.pages.get(page_index).ok_or(ExtractionError::PageOutOfBounds {
            index: page_index,
            page_count: self.pages.len(),
        })?;
        Ok((page.width, page.height))
    }

    fn extract_text_layer(&self, page_index: usize) -> Result<Vec<TextSpan>, ExtractionError> {
        if self.corrupt_pages.contains(&page_index) {
            return Err(ExtractionError::TextLayer(
                "corrupt content stream".to_string(),
            ));
        }
        Ok(self.pages[page_index].spans.clone())
    }

    fn rasterize_page(&self, page_index: usize) -> Result<Bytes, ExtractionError> {
        let _ = page_index;
        Ok(tiny_png())
    }

    fn embedded_images(&self, page_index: usize) -> Result<Vec<ImageRegion>, ExtractionError> {
        Ok(self.pages[page_index].images.clone())
    }
}

/// Scriptable OCR engine
#[derive(Clone, Default)]
pub struct StubOcr {
    pub spans: Vec<OcrSpan>,
}

impl OcrEngine for StubOcr {
    fn recognize(&self, _image: &[u8]) -> Result<Vec<OcrSpan>, ExtractionError> {
        Ok(self.spans.clone())
    }
}
