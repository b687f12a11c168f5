/*!
 * The pipeline coordinator.
 *
 * Pages are independent units of work: each one runs extraction ->
 * translation -> reconstruction inside one worker task, and a bounded pool
 * processes pages concurrently. The only cross-page shared state is the
 * translation cache, whose concurrency contract lives in the cache module.
 *
 * Failures below page granularity never surface here; page failures are
 * recorded and the run continues. The whole run fails only when zero pages
 * succeeded end to end.
 */

use std::sync::Arc;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use log::{error, info};

use crate::app_config::{Config, OutputFormat};
use crate::backends::build_backends;
use crate::errors::{PageError, PipelineError, TranslationError};
use crate::extraction::{
    ClusteringOptions, ColumnOptions, ExtractionEngine, ExtractionOptions, OcrEngine,
    PdfContentSource,
};
use crate::render::{PageRenderer, RenderedPage};
use crate::translation::{
    OrchestratorOptions, PageTranslationReport, TranslationCache, TranslationOrchestrator,
};

use super::CancelToken;

/// Coordinator tuning knobs
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Target language for translation
    pub target_language: String,
    /// Page worker pool size
    pub worker_pool_size: usize,
    /// Which outputs to assemble
    pub outputs: OutputFormat,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            target_language: "en".to_string(),
            worker_pool_size: default_worker_pool_size(),
            outputs: OutputFormat::Both,
        }
    }
}

/// Default worker pool size: available CPU parallelism
pub fn default_worker_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// One successfully processed page
#[derive(Debug)]
pub struct PageSuccess {
    /// 0-based page index
    pub page_index: usize,
    /// Translation stage summary, including unit-level failures
    pub report: PageTranslationReport,
    /// Rendered outputs
    pub rendered: RenderedPage,
}

/// One failed page
#[derive(Debug)]
pub struct PageFailure {
    /// 0-based page index
    pub page_index: usize,
    /// The recorded error
    pub error: PageError,
}

/// Aggregate counters for a run
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    /// Total pages in the document
    pub pages_total: usize,
    /// Pages that failed end to end
    pub pages_failed: usize,
    /// Unique units translated (including cache hits)
    pub units_translated: usize,
    /// Units that received the failure sentinel
    pub units_failed: usize,
    /// Units answered from the cache
    pub cache_hits: usize,
}

/// Document-level pipeline result: successful pages plus enumerated errors
#[derive(Debug)]
pub struct DocumentResult {
    /// Successful pages in page order
    pub pages: Vec<PageSuccess>,
    /// Per-page failures in page order
    pub errors: Vec<PageFailure>,
    /// Assembled HTML document, when requested
    pub html: Option<String>,
    /// Assembled PDF document, when requested
    pub pdf: Option<Vec<u8>>,
    /// Aggregate counters
    pub stats: RunStats,
}

/// Owns the pipeline stages and surfaces the single translate contract
pub struct PipelineCoordinator {
    extraction: Arc<ExtractionEngine>,
    orchestrator: Arc<TranslationOrchestrator>,
    renderer: PageRenderer,
    options: PipelineOptions,
    cancel: CancelToken,
}

impl PipelineCoordinator {
    /// Create a coordinator from already-built stages
    pub fn new(
        extraction: ExtractionEngine,
        orchestrator: TranslationOrchestrator,
        renderer: PageRenderer,
        options: PipelineOptions,
    ) -> Self {
        Self {
            extraction: Arc::new(extraction),
            orchestrator: Arc::new(orchestrator),
            renderer,
            options,
            cancel: CancelToken::new(),
        }
    }

    /// Wire a full pipeline from configuration.
    ///
    /// The cache is passed in by handle so the caller controls its lifecycle
    /// (load persisted entries before, flush after).
    pub fn from_config(
        config: &Config,
        source: Arc<dyn PdfContentSource>,
        ocr: Option<Arc<dyn OcrEngine>>,
        cache: TranslationCache,
    ) -> Result<Self> {
        let backends = build_backends(&config.translation)?;
        let orchestrator = TranslationOrchestrator::new(
            backends,
            cache,
            OrchestratorOptions {
                source_language: config.source_language.clone(),
                max_retries_per_backend: config.translation.common.max_retries_per_backend,
                retry_backoff_ms: config.translation.common.retry_backoff_ms,
                max_concurrent_requests: config.translation.common.max_concurrent_requests,
            },
        )?;

        let extraction = ExtractionEngine::new(
            source,
            ocr,
            ExtractionOptions {
                text_coverage_threshold: config.extraction.text_coverage_threshold,
                clustering: ClusteringOptions {
                    line_gap_factor: config.extraction.line_gap_factor,
                    font_size_tolerance: config.extraction.font_size_tolerance,
                    span_gap_factor: config.extraction.span_gap_factor,
                },
                columns: ColumnOptions {
                    column_gap_min_pt: config.extraction.column_gap_min_pt,
                },
            },
        );

        Ok(Self::new(
            extraction,
            orchestrator,
            PageRenderer::new(&config.render),
            PipelineOptions {
                target_language: config.target_language.clone(),
                worker_pool_size: config
                    .pipeline
                    .worker_pool_size
                    .unwrap_or_else(default_worker_pool_size),
                outputs: config.pipeline.outputs,
            },
        ))
    }

    /// Handle for requesting cooperative cancellation
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Shared cache handle (for persistence flushes)
    pub fn cache(&self) -> &TranslationCache {
        self.orchestrator.cache()
    }

    /// Translate the whole document.
    ///
    /// `progress` is called with `(completed, total)` after each page
    /// finishes, successful or not. Returns a partial result unless zero
    /// pages succeeded.
    pub async fn translate_document(
        &self,
        progress: impl Fn(usize, usize) + Clone + Send + Sync + 'static,
    ) -> Result<DocumentResult, PipelineError> {
        let page_count = self.extraction.page_count()?;
        if page_count == 0 {
            return Err(PipelineError::EmptyDocument);
        }
        info!(
            "translating {} page(s) with {} worker(s)",
            page_count, self.options.worker_pool_size
        );

        let completed = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let results: Vec<(usize, Result<PageSuccess, PageError>)> =
            stream::iter(0..page_count)
                .map(|page_index| {
                    let completed = completed.clone();
                    let progress = progress.clone();
                    async move {
                        let result = self.process_page(page_index).await;
                        let done = completed.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
                        progress(done, page_count);
                        (page_index, result)
                    }
                })
                .buffer_unordered(self.options.worker_pool_size.max(1))
                .collect()
                .await;

        let mut sorted = results;
        sorted.sort_by_key(|(idx, _)| *idx);

        let mut pages = Vec::new();
        let mut errors = Vec::new();
        let mut stats = RunStats {
            pages_total: page_count,
            ..Default::default()
        };

        for (page_index, result) in sorted {
            match result {
                Ok(success) => {
                    stats.units_translated += success.report.translated_units;
                    stats.units_failed += success.report.failures.len();
                    stats.cache_hits += success.report.cache_hits;
                    pages.push(success);
                }
                Err(page_error) => {
                    error!("page {} failed: {}", page_index, page_error);
                    errors.push(PageFailure { page_index, error: page_error });
                }
            }
        }
        stats.pages_failed = errors.len();

        if pages.is_empty() {
            return Err(PipelineError::NoPagesSucceeded { failed: errors.len() });
        }

        let rendered: Vec<RenderedPage> = pages.iter().map(|p| p.rendered.clone()).collect();
        let html = self
            .options
            .outputs
            .wants_html()
            .then(|| self.renderer.assemble_html(&rendered, "Translated document"));
        let pdf = if self.options.outputs.wants_pdf() {
            match self.renderer.assemble_pdf(&rendered) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    // Assembly re-runs the emitter that already succeeded
                    // per page; keep the partial result if it ever fails.
                    error!("document PDF assembly failed: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let (hits, misses, hit_rate) = self.orchestrator.cache().stats();
        info!(
            "run complete: {}/{} page(s), cache {} hit(s) / {} miss(es) ({:.0}%)",
            pages.len(),
            page_count,
            hits,
            misses,
            hit_rate * 100.0
        );

        Ok(DocumentResult { pages, errors, html, pdf, stats })
    }

    /// One page through all three stages
    async fn process_page(&self, page_index: usize) -> Result<PageSuccess, PageError> {
        if self.cancel.is_cancelled() {
            return Err(PageError::Cancelled);
        }

        // Extraction is synchronous capability work; keep it off the
        // async runtime threads.
        let extraction = self.extraction.clone();
        let mut page = tokio::task::spawn_blocking(move || extraction.extract_page(page_index))
            .await
            .map_err(|e| {
                PageError::Extraction(crate::errors::ExtractionError::TextLayer(format!(
                    "extraction worker panicked: {}",
                    e
                )))
            })??;

        let report = self
            .orchestrator
            .translate_page(&mut page, &self.options.target_language, &self.cancel)
            .await
            .map_err(|e| match e {
                TranslationError::Cancelled => PageError::Cancelled,
                other => PageError::Translation(other),
            })?;

        let rendered = self.renderer.render_page(&page)?;

        Ok(PageSuccess { page_index, report, rendered })
    }
}
