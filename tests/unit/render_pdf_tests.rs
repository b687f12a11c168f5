/*!
 * Tests for the PDF emitter
 */

use pagelift::layout::{
    FontStyle, ImageRef, LayoutBlock, Page, Rect, RunTranslation, TextRun, WritingDirection,
};
use pagelift::render::{layout_page, FitOptions, PdfEmitter};

use crate::common::{tiny_jpeg, tiny_png};

fn translated_run(source: &str, translated: &str, size: f32) -> TextRun {
    let mut run = TextRun::new(source, FontStyle::sized(size), WritingDirection::Horizontal);
    run.translation = RunTranslation::Translated(translated.to_string());
    run
}

fn emit(pages: &[&Page]) -> Vec<u8> {
    let layouts: Vec<_> = pages
        .iter()
        .map(|p| layout_page(p, &FitOptions::default()).unwrap())
        .collect();
    PdfEmitter::new().emit(&layouts).unwrap()
}

fn as_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[test]
fn test_emit_shouldProduceWellFormedShell() {
    let page = Page::new(0, 400.0, 600.0).unwrap();
    let bytes = emit(&[&page]);
    let text = as_latin1(&bytes);

    assert!(text.starts_with("%PDF-1.4"));
    assert!(text.trim_end().ends_with("%%EOF"));
    assert!(text.contains("/Type /Catalog"));
    assert!(text.contains("/MediaBox [ 0 0 400 600 ]"));
    assert!(text.contains("xref"));
    assert!(text.contains("trailer"));
}

#[test]
fn test_emit_withTextBlock_shouldDrawTranslatedText() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    page.push_block(LayoutBlock::text(
        Rect::new(20.0, 30.0, 300.0, 20.0),
        1,
        1.0,
        vec![translated_run("本文", "Hello World", 12.0)],
    ))
    .unwrap();

    let text = as_latin1(&emit(&[&page]));
    assert!(text.contains("(Hello World) Tj"));
    assert!(text.contains("/F1 12 Tf"));
    // Baseline: 600 - (30 + 12) = 558.
    assert!(text.contains("1 0 0 1 20 558 Tm"));
}

#[test]
fn test_emit_withBoldRun_shouldSelectBoldFont() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    let mut font = FontStyle::sized(12.0);
    font.bold = true;
    let mut run = TextRun::new("太字", font, WritingDirection::Horizontal);
    run.translation = RunTranslation::Translated("Bold words".to_string());
    page.push_block(LayoutBlock::text(Rect::new(20.0, 30.0, 300.0, 20.0), 1, 1.0, vec![run]))
        .unwrap();

    let text = as_latin1(&emit(&[&page]));
    assert!(text.contains("/F2 12 Tf"));
    assert!(text.contains("/Helvetica-Bold"));
}

#[test]
fn test_emit_withJpegImage_shouldEmbedDctStream() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    page.push_block(LayoutBlock::image(
        Rect::new(50.0, 100.0, 120.0, 80.0),
        0,
        ImageRef::new(tiny_jpeg()),
    ))
    .unwrap();

    let text = as_latin1(&emit(&[&page]));
    assert!(text.contains("/Filter /DCTDecode"));
    // Dimensions parsed from the SOF header: 32x16.
    assert!(text.contains("/Width 32"));
    assert!(text.contains("/Height 16"));
    // Placement at the exact source box: y = 600 - 100 - 80 = 420.
    assert!(text.contains("120 0 0 80 50 420 cm"));
    assert!(text.contains("/Im1 Do"));
}

#[test]
fn test_emit_withNonJpegImage_shouldDrawPlaceholderAtExactBox() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    page.push_block(LayoutBlock::image(
        Rect::new(10.0, 20.0, 100.0, 50.0),
        0,
        ImageRef::new(tiny_png()),
    ))
    .unwrap();

    let text = as_latin1(&emit(&[&page]));
    // y = 600 - 20 - 50 = 530; same box, outlined.
    assert!(text.contains("10 530 100 50 re S"));
    assert!(!text.contains("/DCTDecode"));
}

#[test]
fn test_emit_withParentheses_shouldEscapeLiterals() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    page.push_block(LayoutBlock::text(
        Rect::new(20.0, 30.0, 300.0, 20.0),
        1,
        1.0,
        vec![translated_run("注記", "(note) with \\ backslash", 12.0)],
    ))
    .unwrap();

    let text = as_latin1(&emit(&[&page]));
    assert!(text.contains("(\\(note\\) with \\\\ backslash) Tj"));
}

#[test]
fn test_emit_withMultiplePages_shouldCountThemInPagesNode() {
    let page0 = Page::new(0, 400.0, 600.0).unwrap();
    let page1 = Page::new(1, 400.0, 600.0).unwrap();

    let text = as_latin1(&emit(&[&page0, &page1]));
    assert!(text.contains("/Count 2"));
}

#[test]
fn test_emit_isByteDeterministic() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    page.push_block(LayoutBlock::text(
        Rect::new(20.0, 30.0, 300.0, 20.0),
        1,
        1.0,
        vec![translated_run("本文", "Stable bytes", 12.0)],
    ))
    .unwrap();
    page.push_block(LayoutBlock::image(
        Rect::new(50.0, 100.0, 120.0, 80.0),
        0,
        ImageRef::new(tiny_jpeg()),
    ))
    .unwrap();

    assert_eq!(emit(&[&page]), emit(&[&page]));
}
