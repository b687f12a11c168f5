/*!
 * HTML emission from laid-out pages.
 *
 * One absolutely positioned `<section>` per page, sized to the page
 * dimensions; every placed item becomes an absolutely positioned element at
 * its bounding box with the computed font size. Text whose size clearly
 * exceeds the page's median is emitted as a heading - a best-effort
 * heuristic, not guaranteed classification. Degraded blocks carry marker
 * classes (`overflow-truncated`, `translation-failed`, `low-confidence`) so
 * a reviewer can find them.
 */

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::layout::ImageRef;

use super::text_fit::{DegradeFlag, LaidOutItem, LaidOutPage, PlacedText};

/// Options for HTML emission
#[derive(Debug, Clone)]
pub struct HtmlOptions {
    /// Text at or above this multiple of the page median font size becomes
    /// a heading element
    pub heading_size_ratio: f32,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self { heading_size_ratio: 1.5 }
    }
}

/// Stylesheet shared by every emitted document
const STYLESHEET: &str = "\
body { margin: 0; background: #707070; font-family: Helvetica, Arial, sans-serif; }\n\
section.page { position: relative; margin: 16px auto; background: #ffffff; overflow: hidden; }\n\
section.page > .block { position: absolute; margin: 0; line-height: inherit; }\n\
section.page > img.page-background { position: absolute; left: 0; top: 0; width: 100%; height: 100%; }\n\
.overflow-truncated { outline: 1px dashed #c08000; }\n\
.translation-failed { outline: 1px dashed #c00000; }\n\
.low-confidence { outline: 1px dotted #8080c0; }\n";

/// Render one page as a `<section>` fragment
pub fn render_page(page: &LaidOutPage, options: &HtmlOptions) -> String {
    let median = median_font_size(page);
    let mut out = String::with_capacity(4096);

    out.push_str(&format!(
        "<section class=\"page\" id=\"page-{}\" style=\"width:{}pt;height:{}pt\">\n",
        page.index + 1,
        fmt_pt(page.width),
        fmt_pt(page.height)
    ));

    if let Some(background) = &page.background {
        out.push_str(&format!(
            "<img class=\"page-background\" alt=\"page {} scan\" src=\"{}\"/>\n",
            page.index + 1,
            data_uri(background)
        ));
    }

    for item in &page.items {
        match item {
            LaidOutItem::Image(image) => {
                out.push_str(&format!(
                    "<img class=\"block\" style=\"left:{}pt;top:{}pt;width:{}pt;height:{}pt\" alt=\"\" src=\"{}\"/>\n",
                    fmt_pt(image.bbox.x),
                    fmt_pt(image.bbox.y),
                    fmt_pt(image.bbox.width),
                    fmt_pt(image.bbox.height),
                    data_uri(&image.image)
                ));
            }
            LaidOutItem::Text(text) => {
                out.push_str(&render_text_block(text, median, options));
            }
        }
    }

    out.push_str("</section>\n");
    out
}

/// Render a full document: page sections in order inside one HTML file
pub fn render_document(pages: &[LaidOutPage], title: &str, options: &HtmlOptions) -> String {
    let mut out = String::with_capacity(16 * 1024);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    out.push_str("<style>\n");
    out.push_str(STYLESHEET);
    out.push_str("</style>\n</head>\n<body>\n");
    for page in pages {
        out.push_str(&render_page(page, options));
    }
    out.push_str("</body>\n</html>\n");
    out
}

fn render_text_block(text: &PlacedText, median_size: f32, options: &HtmlOptions) -> String {
    let tag = heading_tag(text.font_size_pt, median_size, options);

    let mut classes = String::from("block");
    for flag in &text.flags {
        classes.push(' ');
        classes.push_str(match flag {
            DegradeFlag::OverflowTruncated => "overflow-truncated",
            DegradeFlag::TranslationFailed => "translation-failed",
            DegradeFlag::LowConfidence => "low-confidence",
        });
    }

    let confidence_attr = if text.confidence < 1.0 {
        format!(" data-confidence=\"{:.2}\"", text.confidence)
    } else {
        String::new()
    };

    let mut out = format!(
        "<{} class=\"{}\"{} style=\"left:{}pt;top:{}pt;width:{}pt;font-size:{}pt;line-height:{}pt;color:#{:02x}{:02x}{:02x};font-weight:normal\">",
        tag,
        classes,
        confidence_attr,
        fmt_pt(text.bbox.x),
        fmt_pt(text.bbox.y),
        fmt_pt(text.bbox.width),
        fmt_pt(text.font_size_pt),
        fmt_pt(text.line_height_pt),
        text.color.r,
        text.color.g,
        text.color.b,
    );

    for (i, line) in text.lines.iter().enumerate() {
        if i > 0 {
            out.push_str("<br/>");
        }
        for segment in &line.segments {
            let escaped = escape_html(&segment.text);
            match (segment.bold, segment.italic) {
                (true, true) => out.push_str(&format!("<b><i>{}</i></b>", escaped)),
                (true, false) => out.push_str(&format!("<b>{}</b>", escaped)),
                (false, true) => out.push_str(&format!("<i>{}</i>", escaped)),
                (false, false) => out.push_str(&escaped),
            }
        }
    }

    out.push_str(&format!("</{}>\n", tag));
    out
}

/// Heading tag for oversized text; `div` for body copy
fn heading_tag(size: f32, median: f32, options: &HtmlOptions) -> &'static str {
    if median <= 0.0 {
        return "div";
    }
    let ratio = size / median;
    if ratio >= options.heading_size_ratio * 1.5 {
        "h1"
    } else if ratio >= options.heading_size_ratio {
        "h2"
    } else {
        "div"
    }
}

/// Median font size across the page's placed text, for the heading heuristic
fn median_font_size(page: &LaidOutPage) -> f32 {
    let mut sizes: Vec<f32> = page
        .items
        .iter()
        .filter_map(|item| match item {
            LaidOutItem::Text(t) => Some(t.font_size_pt),
            LaidOutItem::Image(_) => None,
        })
        .collect();
    if sizes.is_empty() {
        return 0.0;
    }
    sizes.sort_by(f32::total_cmp);
    sizes[sizes.len() / 2]
}

/// Embed image bytes as a data URI
fn data_uri(image: &ImageRef) -> String {
    format!(
        "data:{};base64,{}",
        image.format.mime_type(),
        BASE64.encode(&image.data)
    )
}

/// Minimal HTML escaping for text content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Format a point value without trailing noise (two decimals, trimmed)
fn fmt_pt(value: f32) -> String {
    let formatted = format!("{:.2}", value);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
