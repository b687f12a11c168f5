/*!
 * Tests for the HTML emitter
 */

use pagelift::layout::{
    FontStyle, ImageRef, LayoutBlock, Page, Rect, RunTranslation, TextRun, WritingDirection,
};
use pagelift::render::{escape_html, html, layout_page, FitOptions, HtmlOptions};

use crate::common::tiny_jpeg;

fn translated_run(source: &str, translated: &str, size: f32) -> TextRun {
    let mut run = TextRun::new(source, FontStyle::sized(size), WritingDirection::Horizontal);
    run.translation = RunTranslation::Translated(translated.to_string());
    run
}

fn render(page: &Page) -> String {
    let laid_out = layout_page(page, &FitOptions::default()).unwrap();
    html::render_page(&laid_out, &HtmlOptions::default())
}

#[test]
fn test_render_page_shouldEmitPageSizedSection() {
    let page = Page::new(2, 420.0, 595.0).unwrap();
    let output = render(&page);

    assert!(output.contains("id=\"page-3\""));
    assert!(output.contains("width:420pt"));
    assert!(output.contains("height:595pt"));
}

#[test]
fn test_render_page_withTextBlock_shouldPositionAtBoundingBox() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    page.push_block(LayoutBlock::text(
        Rect::new(25.5, 40.0, 200.0, 20.0),
        1,
        1.0,
        vec![translated_run("本文", "Body copy", 12.0)],
    ))
    .unwrap();

    let output = render(&page);
    assert!(output.contains("left:25.5pt"));
    assert!(output.contains("top:40pt"));
    assert!(output.contains("font-size:12pt"));
    assert!(output.contains("Body copy"));
}

#[test]
fn test_render_page_withOversizedText_shouldEmitHeadingTag() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    // Body copy establishes the median; the 30pt block reads as a heading.
    for i in 0..3 {
        page.push_block(LayoutBlock::text(
            Rect::new(10.0, 100.0 + 30.0 * i as f32, 300.0, 16.0),
            1,
            1.0,
            vec![translated_run("本文", "Body text paragraph", 10.0)],
        ))
        .unwrap();
    }
    page.push_block(LayoutBlock::text(
        Rect::new(10.0, 10.0, 380.0, 40.0),
        1,
        1.0,
        vec![translated_run("大見出し", "Big Headline", 30.0)],
    ))
    .unwrap();

    let output = render(&page);
    assert!(output.contains("<h1") || output.contains("<h2"));
    assert!(output.contains("Big Headline"));
}

#[test]
fn test_render_page_withImage_shouldEmbedDataUri() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    page.push_block(LayoutBlock::image(
        Rect::new(50.0, 60.0, 120.0, 80.0),
        0,
        ImageRef::new(tiny_jpeg()),
    ))
    .unwrap();

    let output = render(&page);
    assert!(output.contains("data:image/jpeg;base64,"));
    assert!(output.contains("left:50pt"));
    assert!(output.contains("top:60pt"));
    assert!(output.contains("width:120pt"));
    assert!(output.contains("height:80pt"));
}

#[test]
fn test_render_page_withFailedTranslation_shouldMarkBlock() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    let mut run = TextRun::new("失敗", FontStyle::sized(12.0), WritingDirection::Horizontal);
    run.translation = RunTranslation::Failed;
    page.push_block(LayoutBlock::text(Rect::new(10.0, 10.0, 200.0, 20.0), 1, 1.0, vec![run]))
        .unwrap();

    let output = render(&page);
    assert!(output.contains("translation-failed"));
    assert!(output.contains("[translation failed]"));
}

#[test]
fn test_render_page_withLowConfidenceBlock_shouldExposeConfidence() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    page.push_block(LayoutBlock::text(
        Rect::new(10.0, 10.0, 200.0, 20.0),
        1,
        0.65,
        vec![translated_run("不鮮明", "Blurry scan text", 12.0)],
    ))
    .unwrap();

    let output = render(&page);
    assert!(output.contains("low-confidence"));
    assert!(output.contains("data-confidence=\"0.65\""));
}

#[test]
fn test_render_document_shouldContainAllPagesAsSections() {
    let pages: Vec<_> = (0..3)
        .map(|i| {
            let page = Page::new(i, 400.0, 600.0).unwrap();
            layout_page(&page, &FitOptions::default()).unwrap()
        })
        .collect();

    let output = html::render_document(&pages, "magazine.pdf", &HtmlOptions::default());
    assert!(output.starts_with("<!DOCTYPE html>"));
    assert!(output.contains("<title>magazine.pdf</title>"));
    assert!(output.contains("id=\"page-1\""));
    assert!(output.contains("id=\"page-2\""));
    assert!(output.contains("id=\"page-3\""));
}

#[test]
fn test_render_page_shouldEscapeMarkupInText() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    page.push_block(LayoutBlock::text(
        Rect::new(10.0, 10.0, 300.0, 20.0),
        1,
        1.0,
        vec![translated_run("比較", "a < b & \"c\"", 12.0)],
    ))
    .unwrap();

    let output = render(&page);
    assert!(output.contains("a &lt; b &amp; &quot;c&quot;"));
    assert!(!output.contains("a < b"));
}

#[test]
fn test_escape_html_shouldCoverAllSpecials() {
    assert_eq!(escape_html("<a href=\"x\">&'</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;");
}

#[test]
fn test_render_page_isIdempotent() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    page.push_block(LayoutBlock::text(
        Rect::new(10.0, 10.0, 200.0, 20.0),
        1,
        1.0,
        vec![translated_run("本文", "Stable output", 12.0)],
    ))
    .unwrap();

    assert_eq!(render(&page), render(&page));
}
