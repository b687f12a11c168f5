/*!
 * Tests for text re-flow: wrapping, shrink-to-fit, overflow truncation
 */

use pagelift::layout::{FontStyle, LayoutBlock, Page, Rect, RunTranslation, TextRun, WritingDirection};
use pagelift::render::{layout_page, DegradeFlag, FitOptions, LaidOutItem};

fn translated_page(text: &str, translated: &str, bbox: Rect, size: f32) -> Page {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    let mut run = TextRun::new(text, FontStyle::sized(size), WritingDirection::Horizontal);
    run.translation = RunTranslation::Translated(translated.to_string());
    page.push_block(LayoutBlock::text(bbox, 1, 1.0, vec![run])).unwrap();
    page
}

fn first_text(page: &Page, options: &FitOptions) -> pagelift::render::PlacedText {
    let laid_out = layout_page(page, options).unwrap();
    laid_out
        .items
        .into_iter()
        .find_map(|item| match item {
            LaidOutItem::Text(t) => Some(t),
            _ => None,
        })
        .expect("one placed text block")
}

#[test]
fn test_layout_withShortTextInWideBox_shouldKeepOriginalFontSize() {
    // "こんにちは世界" at (0,0,100,20), 12pt, translated to "Hello World" -
    // fits in width 100 at 12pt, so no shrink.
    let page = translated_page(
        "こんにちは世界",
        "Hello World",
        Rect::new(0.0, 0.0, 100.0, 20.0),
        12.0,
    );
    let placed = first_text(&page, &FitOptions::default());

    assert_eq!(placed.font_size_pt, 12.0);
    assert_eq!(placed.lines.len(), 1);
    assert_eq!(placed.lines[0].text(), "Hello World");
    assert!(placed.flags.is_empty());
}

#[test]
fn test_layout_withLongTranslation_shouldShrinkInHalfPointSteps() {
    let page = translated_page(
        "長い見出し",
        "An unusually long translated headline that will not fit at the original size",
        Rect::new(0.0, 0.0, 120.0, 30.0),
        14.0,
    );
    let placed = first_text(&page, &FitOptions::default());

    assert!(placed.font_size_pt < 14.0);
    assert!(placed.font_size_pt >= FitOptions::default().min_font_size_pt);
    // Shrink happens in fixed steps from the base size.
    let steps = (14.0 - placed.font_size_pt) / 0.5;
    assert!((steps - steps.round()).abs() < 1e-3);
    assert!(!placed.flags.contains(&DegradeFlag::OverflowTruncated));
}

#[test]
fn test_layout_withImpossibleFit_shouldTruncateWithEllipsis() {
    let long_text = "word ".repeat(300);
    let page = translated_page(
        "本文",
        &long_text,
        Rect::new(0.0, 0.0, 60.0, 18.0),
        12.0,
    );
    let placed = first_text(&page, &FitOptions::default());

    assert_eq!(placed.font_size_pt, FitOptions::default().min_font_size_pt);
    assert!(placed.flags.contains(&DegradeFlag::OverflowTruncated));
    let last_line = placed.lines.last().unwrap().text();
    assert!(last_line.ends_with('\u{2026}'));
}

#[test]
fn test_layout_withoutOverflow_shouldRespectHeightBound() {
    let options = FitOptions::default();
    let bbox = Rect::new(0.0, 0.0, 200.0, 60.0);
    let page = translated_page(
        "記事",
        "A paragraph of translated body copy that wraps over a few lines comfortably",
        bbox,
        10.0,
    );
    let placed = first_text(&page, &options);

    assert!(!placed.flags.contains(&DegradeFlag::OverflowTruncated));
    let max_height = bbox.height * (1.0 + options.overflow_allowance_pct / 100.0);
    assert!(placed.lines.len() as f32 * placed.line_height_pt <= max_height);
}

#[test]
fn test_layout_withFailedRun_shouldRenderSentinelAndFlag() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    let mut run = TextRun::new(
        "訳せない",
        FontStyle::sized(12.0),
        WritingDirection::Horizontal,
    );
    run.translation = RunTranslation::Failed;
    page.push_block(LayoutBlock::text(Rect::new(0.0, 0.0, 200.0, 20.0), 1, 1.0, vec![run]))
        .unwrap();

    let placed = first_text(&page, &FitOptions::default());
    assert!(placed.flags.contains(&DegradeFlag::TranslationFailed));
    assert_eq!(placed.lines[0].text(), "[translation failed]");
}

#[test]
fn test_layout_withVerticalSourceRun_shouldRenderHorizontally() {
    // Vertical source text renders as horizontal output; a deliberate
    // transform, not a bug.
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    let mut run = TextRun::new(
        "縦書きの見出し",
        FontStyle::sized(12.0),
        WritingDirection::Vertical,
    );
    run.translation = RunTranslation::Translated("Vertical headline".to_string());
    page.push_block(LayoutBlock::text(Rect::new(10.0, 10.0, 150.0, 200.0), 1, 1.0, vec![run]))
        .unwrap();

    let placed = first_text(&page, &FitOptions::default());
    assert_eq!(placed.lines.len(), 1);
    assert_eq!(placed.lines[0].text(), "Vertical headline");
}

#[test]
fn test_layout_withLowConfidenceBlock_shouldFlagIt() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    let mut run = TextRun::new("OCR文", FontStyle::sized(12.0), WritingDirection::Horizontal);
    run.translation = RunTranslation::Translated("OCR text".to_string());
    page.push_block(LayoutBlock::text(Rect::new(0.0, 0.0, 200.0, 20.0), 1, 0.7, vec![run]))
        .unwrap();

    let placed = first_text(&page, &FitOptions::default());
    assert!(placed.flags.contains(&DegradeFlag::LowConfidence));
    assert_eq!(placed.confidence, 0.7);
}

#[test]
fn test_layout_withBoldRun_shouldPreserveEmphasisSegments() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    let mut bold_font = FontStyle::sized(12.0);
    bold_font.bold = true;
    let mut bold_run = TextRun::new("太字", bold_font, WritingDirection::Horizontal);
    bold_run.translation = RunTranslation::Translated("Bold".to_string());
    let mut plain_run = TextRun::new("本文", FontStyle::sized(12.0), WritingDirection::Horizontal);
    plain_run.translation = RunTranslation::Translated("text".to_string());
    page.push_block(LayoutBlock::text(
        Rect::new(0.0, 0.0, 200.0, 20.0),
        1,
        1.0,
        vec![bold_run, plain_run],
    ))
    .unwrap();

    let placed = first_text(&page, &FitOptions::default());
    let segments = &placed.lines[0].segments;
    assert_eq!(segments.len(), 2);
    assert!(segments[0].bold);
    assert!(!segments[1].bold);
}

#[test]
fn test_layout_withEmptyOcrBlock_shouldPlaceNothing() {
    let mut page = Page::new(0, 400.0, 600.0).unwrap();
    let mut run = TextRun::new("", FontStyle::sized(12.0), WritingDirection::Horizontal);
    run.translation = RunTranslation::Translated(String::new());
    page.push_block(LayoutBlock::text(Rect::new(0.0, 0.0, 200.0, 20.0), 1, 0.0, vec![run]))
        .unwrap();

    let laid_out = layout_page(&page, &FitOptions::default()).unwrap();
    assert!(laid_out.items.is_empty());
}
