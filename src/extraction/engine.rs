/*!
 * Extraction engine: turns one PDF page into a layout graph page.
 *
 * The text layer is always tried first. Pages whose extractable text covers
 * less than a configurable fraction of the page area are treated as scanned
 * and routed through rasterization + OCR; blocks produced on that path carry
 * the OCR confidence, and regions OCR located but could not read are kept as
 * empty zero-confidence blocks so downstream stages can see coverage gaps.
 * Embedded images are captured verbatim on both paths.
 */

use std::sync::Arc;

use log::{debug, info, warn};

use crate::errors::ExtractionError;
use crate::layout::{ImageRef, LayoutBlock, Page, Rect, TextRun};

use super::clustering::{cluster_spans, ClusteredBlock, ClusteringOptions};
use super::columns::{reading_order, ColumnOptions};
use super::source::{OcrEngine, PdfContentSource};

/// Z-order assigned to image blocks (drawn under text)
const IMAGE_Z_ORDER: i32 = 0;
/// Z-order assigned to text blocks
const TEXT_Z_ORDER: i32 = 1;

/// Extraction tuning knobs
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    /// Pages whose text coverage is below this fraction are routed through
    /// OCR
    pub text_coverage_threshold: f32,
    /// Span clustering knobs
    pub clustering: ClusteringOptions,
    /// Column detection knobs
    pub columns: ColumnOptions,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            text_coverage_threshold: 0.05,
            clustering: ClusteringOptions::default(),
            columns: ColumnOptions::default(),
        }
    }
}

/// Extraction engine over the capability boundary
pub struct ExtractionEngine {
    source: Arc<dyn PdfContentSource>,
    ocr: Option<Arc<dyn OcrEngine>>,
    options: ExtractionOptions,
}

impl ExtractionEngine {
    /// Create a new engine over a content source, with optional OCR fallback
    pub fn new(
        source: Arc<dyn PdfContentSource>,
        ocr: Option<Arc<dyn OcrEngine>>,
        options: ExtractionOptions,
    ) -> Self {
        Self { source, ocr, options }
    }

    /// Number of pages the source reports
    pub fn page_count(&self) -> Result<usize, ExtractionError> {
        self.source.page_count()
    }

    /// Extract one page into a layout graph page.
    ///
    /// A failure here is page-scoped: the coordinator records it and carries
    /// on with the remaining pages.
    pub fn extract_page(&self, page_index: usize) -> Result<Page, ExtractionError> {
        let (width, height) = self.source.page_dimensions(page_index)?;
        let mut page = Page::new(page_index, width, height)?;

        let spans = self.source.extract_text_layer(page_index)?;
        let clustered = cluster_spans(&spans, &self.options.clustering);

        let coverage = {
            let page_area = width * height;
            let text_area: f32 = clustered.iter().map(|b| b.bbox.area()).sum();
            if page_area > 0.0 { (text_area / page_area).min(1.0) } else { 0.0 }
        };

        let text_blocks = if coverage < self.options.text_coverage_threshold {
            info!(
                "page {}: text coverage {:.1}% below threshold, using OCR fallback",
                page_index,
                coverage * 100.0
            );
            self.extract_via_ocr(page_index, &mut page)?
        } else {
            debug!(
                "page {}: text layer extraction, coverage {:.1}%, {} blocks",
                page_index,
                coverage * 100.0,
                clustered.len()
            );
            clustered
                .into_iter()
                .map(|b| (b, crate::layout::TEXT_LAYER_CONFIDENCE))
                .collect()
        };

        // Images are captured on every path, bytes verbatim, below the text.
        let images = self.source.embedded_images(page_index)?;
        for region in images {
            let block = LayoutBlock::image(
                clamp_to_page(region.bbox, &page),
                IMAGE_Z_ORDER,
                ImageRef::new(region.data),
            );
            page.push_block(block)?;
        }

        // Establish the reading order once; nothing downstream reorders.
        let boxes: Vec<Rect> = text_blocks.iter().map(|(b, _)| b.bbox).collect();
        let order = reading_order(width, &boxes, &self.options.columns);
        for idx in order {
            let (block, confidence) = &text_blocks[idx];
            let layout_block = LayoutBlock::text(
                clamp_to_page(block.bbox, &page),
                TEXT_Z_ORDER,
                *confidence,
                block.runs.clone(),
            );
            page.push_block(layout_block)?;
        }

        Ok(page)
    }

    /// OCR fallback path: rasterize the page, recognize, keep the raster as
    /// the page background
    fn extract_via_ocr(
        &self,
        page_index: usize,
        page: &mut Page,
    ) -> Result<Vec<(ClusteredBlock, f32)>, ExtractionError> {
        let Some(ocr) = &self.ocr else {
            return Err(ExtractionError::OcrUnavailable(page_index));
        };

        let raster = self.source.rasterize_page(page_index)?;
        let ocr_spans = ocr.recognize(&raster)?;
        page.set_background(ImageRef::new(raster));

        let unreadable = ocr_spans.iter().filter(|s| s.text.is_empty()).count();
        if unreadable > 0 {
            warn!(
                "page {}: {} OCR region(s) unreadable, kept as coverage gaps",
                page_index, unreadable
            );
        }

        // OCR spans arrive pre-segmented into regions; each region becomes
        // one single-run block carrying the recognition confidence.
        Ok(ocr_spans
            .into_iter()
            .map(|span| {
                let size = (span.bbox.height).clamp(6.0, 72.0);
                let run = TextRun::new(
                    span.text,
                    crate::layout::FontStyle::sized(size),
                    crate::layout::WritingDirection::Horizontal,
                );
                (
                    ClusteredBlock { bbox: span.bbox, runs: vec![run] },
                    span.confidence.clamp(0.0, 1.0),
                )
            })
            .collect())
    }
}

/// Clamp a reported box to the page bounds.
///
/// Sources occasionally report boxes hanging a few points past the media
/// box; clipping them beats rejecting the whole page.
fn clamp_to_page(bbox: Rect, page: &Page) -> Rect {
    let x = bbox.x.clamp(0.0, page.width());
    let y = bbox.y.clamp(0.0, page.height());
    let width = bbox.width.min(page.width() - x).max(0.0);
    let height = bbox.height.min(page.height() - y).max(0.0);
    Rect::new(x, y, width, height)
}
