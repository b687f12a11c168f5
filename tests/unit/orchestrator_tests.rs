/*!
 * Tests for the translation orchestrator: caching, fallback, retries,
 * sentinel substitution, and write-back determinism
 */

use std::sync::Arc;

use pagelift::backends::mock::MockBackend;
use pagelift::backends::TranslationBackend;
use pagelift::errors::TranslationError;
use pagelift::layout::{Rect, RunTranslation};
use pagelift::pipeline::CancelToken;
use pagelift::translation::{
    CacheKey, OrchestratorOptions, TranslationCache, TranslationOrchestrator,
};

use crate::common::page_with_blocks;

fn fast_options() -> OrchestratorOptions {
    OrchestratorOptions {
        source_language: "ja".to_string(),
        max_retries_per_backend: 2,
        retry_backoff_ms: 1,
        max_concurrent_requests: 4,
    }
}

fn orchestrator_with(
    backends: Vec<Arc<dyn TranslationBackend>>,
    cache: TranslationCache,
) -> TranslationOrchestrator {
    TranslationOrchestrator::new(backends, cache, fast_options()).unwrap()
}

fn simple_page() -> pagelift::layout::Page {
    page_with_blocks(
        0,
        400.0,
        600.0,
        &[
            ("こんにちは", Rect::new(10.0, 10.0, 200.0, 20.0), 12.0),
            ("さようなら", Rect::new(10.0, 40.0, 200.0, 20.0), 12.0),
        ],
    )
}

#[tokio::test]
async fn test_translate_page_withWorkingBackend_shouldTranslateAllRuns() {
    let orchestrator = orchestrator_with(
        vec![Arc::new(MockBackend::working())],
        TranslationCache::new(true),
    );
    let mut page = simple_page();

    let report = orchestrator
        .translate_page(&mut page, "en", &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(report.translated_units, 2);
    assert!(report.failures.is_empty());
    for (_, run) in page.runs() {
        assert!(matches!(run.translation, RunTranslation::Translated(_)));
    }
}

#[tokio::test]
async fn test_translate_page_withDuplicateText_shouldCallBackendOnce() {
    let backend = MockBackend::working();
    let counter = backend.request_counter();
    let orchestrator =
        orchestrator_with(vec![Arc::new(backend)], TranslationCache::new(true));

    let mut page = page_with_blocks(
        0,
        400.0,
        600.0,
        &[
            ("見出し", Rect::new(10.0, 10.0, 200.0, 20.0), 12.0),
            ("見出し", Rect::new(10.0, 40.0, 200.0, 20.0), 12.0),
            ("見出し", Rect::new(10.0, 70.0, 200.0, 20.0), 12.0),
        ],
    );

    orchestrator
        .translate_page(&mut page, "en", &CancelToken::new())
        .await
        .unwrap();

    // Deduplication: one call fans out to all three occurrences.
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 1);
    let texts: Vec<String> = page
        .runs()
        .map(|(_, r)| r.output_text().to_string())
        .collect();
    assert!(texts.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_translate_page_withWhitespaceOnlyRun_shouldNeverCallBackend() {
    let backend = MockBackend::working();
    let counter = backend.request_counter();
    let orchestrator =
        orchestrator_with(vec![Arc::new(backend)], TranslationCache::new(true));

    let mut page = page_with_blocks(
        0,
        400.0,
        600.0,
        &[("   \u{3000} ", Rect::new(10.0, 10.0, 200.0, 20.0), 12.0)],
    );

    let report = orchestrator
        .translate_page(&mut page, "en", &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(report.translated_units, 0);
    // The run passes through unchanged.
    let (_, run) = page.runs().next().unwrap();
    assert_eq!(run.output_text(), "   \u{3000} ");
}

#[tokio::test]
async fn test_translate_page_withAllBackendsFailing_shouldSubstituteSentinel() {
    let orchestrator = orchestrator_with(
        vec![
            Arc::new(MockBackend::failing()),
            Arc::new(MockBackend::new("mock-failing-2", pagelift::backends::mock::MockBehavior::Failing)),
        ],
        TranslationCache::new(true),
    );
    let mut page = page_with_blocks(
        0,
        400.0,
        600.0,
        &[("翻訳不能", Rect::new(10.0, 10.0, 200.0, 20.0), 12.0)],
    );

    let report = orchestrator
        .translate_page(&mut page, "en", &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    // Both backends retried before giving up.
    assert_eq!(report.failures[0].attempts, 4);
    let (_, run) = page.runs().next().unwrap();
    assert_eq!(run.translation, RunTranslation::Failed);
    assert_eq!(run.output_text(), "[translation failed]");
}

#[tokio::test]
async fn test_translate_page_withFailingPrimary_shouldFallToSecondary() {
    let secondary = MockBackend::working();
    let orchestrator = orchestrator_with(
        vec![Arc::new(MockBackend::failing()), Arc::new(secondary)],
        TranslationCache::new(true),
    );
    let mut page = simple_page();

    let report = orchestrator
        .translate_page(&mut page, "en", &CancelToken::new())
        .await
        .unwrap();

    assert!(report.failures.is_empty());
    for (_, run) in page.runs() {
        assert!(run.output_text().starts_with("[mock-working]"));
    }
}

#[tokio::test]
async fn test_translate_page_withFallbackResult_shouldCacheUnderPreferredBackend() {
    let cache = TranslationCache::new(true);
    let orchestrator = orchestrator_with(
        vec![Arc::new(MockBackend::failing()), Arc::new(MockBackend::working())],
        cache.clone(),
    );
    let mut page = page_with_blocks(
        0,
        400.0,
        600.0,
        &[("特集", Rect::new(10.0, 10.0, 200.0, 20.0), 12.0)],
    );

    orchestrator
        .translate_page(&mut page, "en", &CancelToken::new())
        .await
        .unwrap();

    // The entry is attributed to the preferred backend so re-runs hit it.
    let cached = cache.get(&CacheKey::new("特集", "en", orchestrator.preferred_backend_id()));
    assert!(cached.is_some());
}

#[tokio::test]
async fn test_translate_page_withWarmCache_shouldNotCallBackend() {
    let cache = TranslationCache::new(true);
    cache.store(CacheKey::new("こんにちは", "en", "mock-working"), "hello");
    cache.store(CacheKey::new("さようなら", "en", "mock-working"), "goodbye");

    let backend = MockBackend::working();
    let counter = backend.request_counter();
    let orchestrator = orchestrator_with(vec![Arc::new(backend)], cache);
    let mut page = simple_page();

    let report = orchestrator
        .translate_page(&mut page, "en", &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(report.cache_hits, 2);
    let texts: Vec<String> = page
        .runs()
        .map(|(_, r)| r.output_text().to_string())
        .collect();
    assert_eq!(texts, vec!["hello", "goodbye"]);
}

#[tokio::test]
async fn test_translate_page_withEmptyBackendResult_shouldFallToNextBackend() {
    let orchestrator = orchestrator_with(
        vec![Arc::new(MockBackend::empty()), Arc::new(MockBackend::working())],
        TranslationCache::new(true),
    );
    let mut page = page_with_blocks(
        0,
        400.0,
        600.0,
        &[("空返答", Rect::new(10.0, 10.0, 200.0, 20.0), 12.0)],
    );

    let report = orchestrator
        .translate_page(&mut page, "en", &CancelToken::new())
        .await
        .unwrap();

    assert!(report.failures.is_empty());
    let (_, run) = page.runs().next().unwrap();
    assert!(run.output_text().starts_with("[mock-working]"));
}

#[tokio::test]
async fn test_translate_page_withCancelledToken_shouldDiscardResults() {
    let orchestrator = orchestrator_with(
        vec![Arc::new(MockBackend::working())],
        TranslationCache::new(true),
    );
    let mut page = simple_page();
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = orchestrator.translate_page(&mut page, "en", &cancel).await;
    assert!(matches!(result, Err(TranslationError::Cancelled)));
    // No write-back happened for translatable runs.
    assert!(page
        .runs()
        .all(|(_, run)| run.translation == RunTranslation::Pending));
}

#[tokio::test]
async fn test_new_withNoBackends_shouldFail() {
    let result = TranslationOrchestrator::new(
        Vec::new(),
        TranslationCache::new(true),
        fast_options(),
    );
    assert!(matches!(result, Err(TranslationError::NoBackends)));
}
