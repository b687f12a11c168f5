/*!
 * Tests for the layout graph model and its invariants
 */

use pagelift::errors::LayoutError;
use pagelift::layout::{
    BlockKind, Document, FontStyle, ImageFormat, ImageRef, LayoutBlock, Page, Rect,
    RunTranslation, TableBlock, TableCell, TextBlock, TextRun, WritingDirection,
};

use crate::common::{tiny_jpeg, tiny_png};

fn run(text: &str) -> TextRun {
    TextRun::new(text, FontStyle::sized(12.0), WritingDirection::Horizontal)
}

#[test]
fn test_page_new_withZeroDimensions_shouldFail() {
    let result = Page::new(0, 0.0, 100.0);
    assert!(matches!(result, Err(LayoutError::InvalidPageDimensions { .. })));
}

#[test]
fn test_page_push_block_withBoxInsidePage_shouldAppend() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    let block = LayoutBlock::text(Rect::new(10.0, 10.0, 100.0, 20.0), 1, 1.0, vec![run("abc")]);
    assert!(page.push_block(block).is_ok());
    assert_eq!(page.blocks().len(), 1);
}

#[test]
fn test_page_push_block_withBoxOutsidePage_shouldFailWithInvalidGeometry() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    let block = LayoutBlock::text(Rect::new(350.0, 10.0, 100.0, 20.0), 1, 1.0, vec![run("abc")]);
    let result = page.push_block(block);
    assert!(matches!(result, Err(LayoutError::InvalidGeometry { page_index: 0, .. })));
    assert!(page.blocks().is_empty());
}

#[test]
fn test_page_push_block_withSlightFloatOverhang_shouldAppend() {
    // Extractors report boxes a fraction of a point past the edge
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    let block = LayoutBlock::text(Rect::new(300.2, 10.0, 100.0, 20.0), 1, 1.0, vec![run("x")]);
    assert!(page.push_block(block).is_ok());
}

#[test]
fn test_text_block_linear_text_shouldConcatenateRunsInOrder() {
    let block = TextBlock {
        runs: vec![run("春の"), run("特集")],
    };
    assert_eq!(block.linear_text(), "春の特集");
}

#[test]
fn test_page_runs_shouldVisitRunsInReadingOrder() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    page.push_block(LayoutBlock::text(
        Rect::new(10.0, 10.0, 100.0, 20.0),
        1,
        1.0,
        vec![run("first"), run("second")],
    ))
    .unwrap();
    page.push_block(LayoutBlock::text(
        Rect::new(10.0, 40.0, 100.0, 20.0),
        1,
        1.0,
        vec![run("third")],
    ))
    .unwrap();

    let texts: Vec<String> = page.runs().map(|(_, r)| r.source.clone()).collect();
    assert_eq!(texts, vec!["first", "second", "third"]);
}

#[test]
fn test_page_runs_shouldSkipImageBlocks() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    page.push_block(LayoutBlock::image(
        Rect::new(10.0, 10.0, 100.0, 100.0),
        0,
        ImageRef::new(tiny_jpeg()),
    ))
    .unwrap();
    assert_eq!(page.runs().count(), 0);
}

#[test]
fn test_page_runs_shouldVisitTableCells() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    let table = TableBlock {
        cells: vec![
            TableCell {
                bbox: Rect::new(10.0, 10.0, 80.0, 20.0),
                content: TextBlock { runs: vec![run("a")] },
            },
            TableCell {
                bbox: Rect::new(100.0, 10.0, 80.0, 20.0),
                content: TextBlock { runs: vec![run("b")] },
            },
        ],
    };
    page.push_block(LayoutBlock::new(
        Rect::new(10.0, 10.0, 180.0, 30.0),
        1,
        1.0,
        BlockKind::Table(table),
    ))
    .unwrap();

    let texts: Vec<String> = page.runs().map(|(_, r)| r.source.clone()).collect();
    assert_eq!(texts, vec!["a", "b"]);
}

#[test]
fn test_page_run_mut_withRunRef_shouldAllowWriteBack() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    page.push_block(LayoutBlock::text(
        Rect::new(10.0, 10.0, 100.0, 20.0),
        1,
        1.0,
        vec![run("こんにちは")],
    ))
    .unwrap();

    let (run_ref, _) = page.runs().next().unwrap();
    page.run_mut(run_ref).unwrap().translation = RunTranslation::Translated("hello".to_string());

    let (_, updated) = page.runs().next().unwrap();
    assert_eq!(updated.output_text(), "hello");
}

#[test]
fn test_run_output_text_withFailedTranslation_shouldUseSentinel() {
    let mut r = run("未翻訳");
    r.translation = RunTranslation::Failed;
    assert_eq!(r.output_text(), "[translation failed]");
}

#[test]
fn test_text_coverage_shouldReflectTextArea() {
    let mut page = Page::new(0, 100.0, 100.0).unwrap();
    page.push_block(LayoutBlock::text(
        Rect::new(0.0, 0.0, 100.0, 50.0),
        1,
        1.0,
        vec![run("half")],
    ))
    .unwrap();
    let coverage = page.text_coverage();
    assert!((coverage - 0.5).abs() < 1e-4);
}

#[test]
fn test_image_format_sniff_shouldRecognizeMagicBytes() {
    assert_eq!(ImageFormat::sniff(&tiny_jpeg()), ImageFormat::Jpeg);
    assert_eq!(ImageFormat::sniff(&tiny_png()), ImageFormat::Png);
    assert_eq!(ImageFormat::sniff(b"not an image"), ImageFormat::Other);
}

#[test]
fn test_document_shouldOwnPagesInOrder() {
    let mut document = Document::new();
    document.pages.push(Page::new(0, 400.0, 600.0).unwrap());
    document.pages.push(Page::new(1, 400.0, 600.0).unwrap());

    assert_eq!(document.page_count(), 2);
    assert_eq!(document.pages[1].index(), 1);
}

#[test]
fn test_rect_union_shouldCoverBoth() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(20.0, 5.0, 10.0, 10.0);
    let u = a.union(&b);
    assert_eq!(u.x, 0.0);
    assert_eq!(u.right(), 30.0);
    assert_eq!(u.bottom(), 15.0);
}
