/*!
 * Reconstruction renderer: re-flows translated text into the original
 * geometry and emits HTML and PDF outputs.
 *
 * - `text_fit`: greedy line-breaking, shrink-to-fit, overflow policy
 * - `html`: positioned HTML emission with degradation markers
 * - `pdf`: small deterministic PDF writer
 */

use crate::app_config::RenderConfig;
use crate::errors::RenderError;
use crate::layout::Page;

pub use self::html::{escape_html, HtmlOptions};
pub use self::pdf::PdfEmitter;
pub use self::text_fit::{
    layout_page, DegradeFlag, FitOptions, LaidOutItem, LaidOutPage, PlacedImage, PlacedLine,
    PlacedSegment, PlacedText,
};

pub mod html;
pub mod pdf;
pub mod text_fit;

/// Rendered outputs for one page
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// The fitted layout both outputs were produced from
    pub layout: LaidOutPage,
    /// Page HTML fragment (one `<section>`)
    pub html: String,
    /// Single-page PDF bytes
    pub pdf: Vec<u8>,
}

/// Page renderer combining the fit pass with both emitters
#[derive(Debug, Clone)]
pub struct PageRenderer {
    fit: FitOptions,
    html: HtmlOptions,
}

impl PageRenderer {
    /// Build a renderer from the render configuration
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            fit: FitOptions {
                overflow_allowance_pct: config.overflow_allowance_pct,
                min_font_size_pt: config.min_font_size_pt,
                font_shrink_step_pt: config.font_shrink_step_pt,
                line_height_factor: config.line_height_factor,
            },
            html: HtmlOptions {
                heading_size_ratio: config.heading_size_ratio,
            },
        }
    }

    /// Fit options in use
    pub fn fit_options(&self) -> &FitOptions {
        &self.fit
    }

    /// HTML options in use
    pub fn html_options(&self) -> &HtmlOptions {
        &self.html
    }

    /// Render one translated page into both outputs
    pub fn render_page(&self, page: &Page) -> Result<RenderedPage, RenderError> {
        let layout = layout_page(page, &self.fit)?;
        let html = html::render_page(&layout, &self.html);
        let pdf = PdfEmitter::new().emit(std::slice::from_ref(&layout))?;
        Ok(RenderedPage { layout, html, pdf })
    }

    /// Assemble one HTML document from rendered pages
    pub fn assemble_html(&self, pages: &[RenderedPage], title: &str) -> String {
        let layouts: Vec<LaidOutPage> = pages.iter().map(|p| p.layout.clone()).collect();
        html::render_document(&layouts, title, &self.html)
    }

    /// Assemble one PDF document from rendered pages
    pub fn assemble_pdf(&self, pages: &[RenderedPage]) -> Result<Vec<u8>, RenderError> {
        let layouts: Vec<LaidOutPage> = pages.iter().map(|p| p.layout.clone()).collect();
        PdfEmitter::new().emit(&layouts)
    }
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self::new(&RenderConfig::default())
    }
}
