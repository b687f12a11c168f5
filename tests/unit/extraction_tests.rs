/*!
 * Tests for the extraction engine: clustering, reading order, OCR fallback
 */

use std::sync::Arc;

use pagelift::errors::ExtractionError;
use pagelift::extraction::{ExtractionEngine, ExtractionOptions, OcrSpan};
use pagelift::layout::{BlockKind, Rect};

use crate::common::{span, tiny_jpeg, StubOcr, StubPage, StubSource};

fn engine(source: Arc<StubSource>, ocr: Option<StubOcr>) -> ExtractionEngine {
    ExtractionEngine::new(
        source,
        ocr.map(|o| Arc::new(o) as Arc<dyn pagelift::extraction::OcrEngine>),
        ExtractionOptions::default(),
    )
}

#[test]
fn test_extract_page_withDenseTextLayer_shouldUseTextPath() {
    let mut page = StubPage::sized(400.0, 600.0);
    // Two spans on one line, one on the next; dense enough to stay on the
    // text path.
    page.spans = vec![
        span("週刊", 20.0, 20.0, 180.0, 14.0, 14.0),
        span("まんが", 210.0, 20.0, 150.0, 14.0, 14.0),
        span("二〇二五年八月号", 20.0, 40.0, 340.0, 300.0, 14.0),
    ];
    let source = StubSource::single(page);

    let extracted = engine(source, None).extract_page(0).unwrap();

    let text_blocks: Vec<_> = extracted
        .blocks()
        .iter()
        .filter(|b| matches!(b.kind, BlockKind::Text(_)))
        .collect();
    assert!(!text_blocks.is_empty());
    assert!(text_blocks.iter().all(|b| b.confidence == 1.0));
    assert!(extracted.background().is_none());
}

#[test]
fn test_extract_page_withTwoColumns_shouldReadLeftColumnFirst() {
    let mut page = StubPage::sized(400.0, 600.0);
    page.spans = vec![
        span("right-top", 230.0, 20.0, 150.0, 200.0, 12.0),
        span("left-top", 20.0, 20.0, 150.0, 200.0, 12.0),
        span("left-bottom", 20.0, 300.0, 150.0, 200.0, 12.0),
        span("right-bottom", 230.0, 300.0, 150.0, 200.0, 12.0),
    ];
    let source = StubSource::single(page);

    let extracted = engine(source, None).extract_page(0).unwrap();

    let texts: Vec<String> = extracted.runs().map(|(_, r)| r.source.clone()).collect();
    assert_eq!(
        texts,
        vec!["left-top", "left-bottom", "right-top", "right-bottom"]
    );
}

#[test]
fn test_extract_page_withSparseText_shouldRouteThroughOcr() {
    let mut page = StubPage::sized(400.0, 600.0);
    // 2% coverage: a single tiny caption on an otherwise scanned page.
    page.spans = vec![span("p.12", 10.0, 580.0, 48.0, 10.0, 10.0)];
    let source = StubSource::single(page);
    let ocr = StubOcr {
        spans: vec![
            OcrSpan {
                text: "スキャン見出し".to_string(),
                bbox: Rect::new(40.0, 40.0, 320.0, 28.0),
                confidence: 0.82,
            },
            OcrSpan {
                text: String::new(),
                bbox: Rect::new(40.0, 90.0, 320.0, 28.0),
                confidence: 0.0,
            },
        ],
    };

    let extracted = engine(source, Some(ocr)).extract_page(0).unwrap();

    // OCR path keeps the raster as background and carries OCR confidence.
    assert!(extracted.background().is_some());
    let confidences: Vec<f32> = extracted
        .blocks()
        .iter()
        .filter(|b| matches!(b.kind, BlockKind::Text(_)))
        .map(|b| b.confidence)
        .collect();
    assert_eq!(confidences.len(), 2);
    assert!(confidences.iter().all(|c| *c < 1.0));
    // The unreadable region is retained as a zero-confidence coverage gap.
    assert!(confidences.contains(&0.0));
}

#[test]
fn test_extract_page_withSparseTextAndNoOcr_shouldFail() {
    let mut page = StubPage::sized(400.0, 600.0);
    page.spans = vec![span("p.12", 10.0, 580.0, 48.0, 10.0, 10.0)];
    let source = StubSource::single(page);

    let result = engine(source, None).extract_page(0);
    assert!(matches!(result, Err(ExtractionError::OcrUnavailable(0))));
}

#[test]
fn test_extract_page_withEmbeddedImage_shouldKeepBytesAndBoxVerbatim() {
    let mut page = StubPage::sized(400.0, 600.0);
    page.spans = vec![span("本文テキスト", 20.0, 20.0, 360.0, 200.0, 12.0)];
    let image_box = Rect::new(50.0, 300.0, 200.0, 150.0);
    page.images = vec![pagelift::extraction::ImageRegion {
        data: tiny_jpeg(),
        bbox: image_box,
    }];
    let source = StubSource::single(page);

    let extracted = engine(source, None).extract_page(0).unwrap();

    let image_block = extracted
        .blocks()
        .iter()
        .find(|b| matches!(b.kind, BlockKind::Image(_)))
        .expect("image block captured");
    assert_eq!(image_block.bbox, image_box);
    if let BlockKind::Image(image) = &image_block.kind {
        assert_eq!(image.image.data, tiny_jpeg());
    }
    // Images draw below text.
    assert_eq!(image_block.z_order, 0);
}

#[test]
fn test_extract_page_withCorruptPage_shouldReturnPageScopedError() {
    let mut source = StubSource::default();
    source.pages.push(StubPage::sized(400.0, 600.0));
    source.corrupt_pages.insert(0);

    let result = engine(Arc::new(source), None).extract_page(0);
    assert!(matches!(result, Err(ExtractionError::TextLayer(_))));
}

#[test]
fn test_extract_page_withOutOfBoundsIndex_shouldFail() {
    let source = StubSource::single(StubPage::sized(400.0, 600.0));
    let result = engine(source, None).extract_page(7);
    assert!(matches!(
        result,
        Err(ExtractionError::PageOutOfBounds { index: 7, page_count: 1 })
    ));
}
