/*!
 * Translation orchestration over a page's layout graph.
 *
 * The orchestrator collects the page's translation units, resolves each
 * unique text through cache -> backend priority list (bounded retries with
 * exponential backoff per backend), and writes results back through the
 * units' run references. A unit for which every backend is exhausted gets
 * the explicit failure marker and a recorded diagnostic; the page is never
 * aborted for unit-level failures.
 *
 * Write-back happens after all units resolve, iterating them in collection
 * order, so the final graph content is deterministic for deterministic
 * backends regardless of request completion order.
 */

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use rand::Rng;

use crate::backends::TranslationBackend;
use crate::errors::{TranslationError, TranslationUnitError};
use crate::layout::{Page, RunTranslation};
use crate::pipeline::CancelToken;

use super::cache::{CacheKey, TranslationCache};
use super::units::{collect_units, preview, TranslationUnit};

/// Orchestrator tuning knobs
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Source language code sent to backends
    pub source_language: String,
    /// Attempts per backend before falling to the next one
    pub max_retries_per_backend: u32,
    /// Base backoff in milliseconds, doubled per attempt
    pub retry_backoff_ms: u64,
    /// Maximum in-flight backend requests per page
    pub max_concurrent_requests: usize,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            source_language: "ja".to_string(),
            max_retries_per_backend: 3,
            retry_backoff_ms: 1000,
            max_concurrent_requests: 4,
        }
    }
}

/// Per-page translation outcome summary
#[derive(Debug, Default)]
pub struct PageTranslationReport {
    /// Index of the page
    pub page_index: usize,
    /// Unique units resolved through a backend or the cache
    pub translated_units: usize,
    /// Units answered from the cache
    pub cache_hits: usize,
    /// Units for which every backend was exhausted
    pub failures: Vec<TranslationUnitError>,
}

/// How one unique text resolved
enum Resolution {
    Translated { text: String, from_cache: bool },
    Failed { attempts: u32, last_error: String },
}

/// Main translation orchestrator
pub struct TranslationOrchestrator {
    /// Backends in configured priority order
    backends: Vec<Arc<dyn TranslationBackend>>,
    /// Process-wide read-through cache
    cache: TranslationCache,
    /// Tuning knobs
    options: OrchestratorOptions,
}

impl TranslationOrchestrator {
    /// Create a new orchestrator over a priority-ordered backend list
    pub fn new(
        backends: Vec<Arc<dyn TranslationBackend>>,
        cache: TranslationCache,
        options: OrchestratorOptions,
    ) -> Result<Self, TranslationError> {
        if backends.is_empty() {
            return Err(TranslationError::NoBackends);
        }
        Ok(Self { backends, cache, options })
    }

    /// Id of the preferred (first configured) backend.
    ///
    /// Cache entries are attributed to the preferred backend even when a
    /// fallback produced them, so re-runs hit the cache identically.
    pub fn preferred_backend_id(&self) -> &str {
        self.backends[0].id()
    }

    /// Shared cache handle
    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Translate every text run of a page in place.
    ///
    /// Fails only for stage-level problems (cancellation, dangling
    /// references); unit-level backend exhaustion is reported, not raised.
    pub async fn translate_page(
        &self,
        page: &mut Page,
        target_language: &str,
        cancel: &CancelToken,
    ) -> Result<PageTranslationReport, TranslationError> {
        let collection = collect_units(page);
        let mut report = PageTranslationReport {
            page_index: page.index(),
            ..Default::default()
        };

        debug!(
            "page {}: {} unique unit(s), {} passthrough run(s)",
            page.index(),
            collection.units.len(),
            collection.passthrough.len()
        );

        // Empty and whitespace-only runs pass through unchanged without ever
        // reaching a backend.
        for run_ref in &collection.passthrough {
            let run = page.run_mut(*run_ref)?;
            run.translation = RunTranslation::Translated(run.source.clone());
        }

        // Resolve unique texts concurrently; the index keeps results
        // addressable independent of completion order.
        let resolutions: Vec<(usize, Resolution)> =
            stream::iter(collection.units.iter().enumerate())
                .map(|(idx, unit)| async move {
                    if cancel.is_cancelled() {
                        return (
                            idx,
                            Resolution::Failed {
                                attempts: 0,
                                last_error: "cancelled".to_string(),
                            },
                        );
                    }
                    (idx, self.resolve(unit, target_language).await)
                })
                .buffer_unordered(self.options.max_concurrent_requests.max(1))
                .collect()
                .await;

        if cancel.is_cancelled() {
            // In-flight calls completed above (and were cached), but their
            // results are discarded rather than written back.
            return Err(TranslationError::Cancelled);
        }

        let mut by_index: Vec<Option<Resolution>> =
            (0..collection.units.len()).map(|_| None).collect();
        for (idx, resolution) in resolutions {
            by_index[idx] = Some(resolution);
        }

        // Deterministic write-back in collection order.
        for (unit, resolution) in collection.units.iter().zip(by_index.into_iter()) {
            let resolution = resolution.expect("every unit resolves exactly once");
            match resolution {
                Resolution::Translated { text, from_cache } => {
                    report.translated_units += 1;
                    if from_cache {
                        report.cache_hits += 1;
                    }
                    for run_ref in &unit.refs {
                        page.run_mut(*run_ref)?.translation =
                            RunTranslation::Translated(text.clone());
                    }
                }
                Resolution::Failed { attempts, last_error } => {
                    warn!(
                        "page {}: all backends failed for '{}': {}",
                        page.index(),
                        preview(&unit.text, 30),
                        last_error
                    );
                    report.failures.push(TranslationUnitError {
                        page_index: page.index(),
                        text_preview: preview(&unit.text, 60),
                        attempts,
                        last_error,
                    });
                    for run_ref in &unit.refs {
                        page.run_mut(*run_ref)?.translation = RunTranslation::Failed;
                    }
                }
            }
        }

        Ok(report)
    }

    /// Resolve one unique text: cache, then backends in priority order with
    /// bounded retries each
    async fn resolve(&self, unit: &TranslationUnit, target_language: &str) -> Resolution {
        let cache_key = CacheKey::new(&unit.key, target_language, self.preferred_backend_id());
        if let Some(cached) = self.cache.get(&cache_key) {
            return Resolution::Translated { text: cached, from_cache: true };
        }

        let mut attempts = 0u32;
        let mut last_error = String::from("no backend attempted");

        for backend in &self.backends {
            let max_attempts = self.options.max_retries_per_backend.max(1);
            for attempt in 1..=max_attempts {
                attempts += 1;
                match backend
                    .translate(&unit.text, &self.options.source_language, target_language)
                    .await
                {
                    Ok(translated) if !translated.trim().is_empty() => {
                        self.cache.store(cache_key, &translated);
                        return Resolution::Translated { text: translated, from_cache: false };
                    }
                    Ok(_) => {
                        last_error = format!("{} returned an empty translation", backend.id());
                        debug!("{}", last_error);
                    }
                    Err(e) => {
                        last_error = format!("{}: {}", backend.id(), e);
                        debug!(
                            "attempt {}/{} on {} failed: {}",
                            attempt,
                            max_attempts,
                            backend.id(),
                            e
                        );
                        if !e.is_retryable() {
                            break;
                        }
                    }
                }

                if attempt < max_attempts {
                    tokio::time::sleep(self.backoff_delay(attempt)).await;
                }
            }
        }

        Resolution::Failed { attempts, last_error }
    }

    /// Exponential backoff with +/-25% jitter to avoid thundering retries
    /// across concurrent units
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.options.retry_backoff_ms.max(1) * (1u64 << (attempt - 1).min(10));
        let jitter = rand::rng().random_range(0.75..1.25);
        Duration::from_millis((base as f64 * jitter) as u64)
    }
}
