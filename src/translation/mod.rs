/*!
 * Translation orchestration over the layout graph.
 *
 * This module contains the translation stage of the pipeline, split into
 * several submodules:
 *
 * - `units`: translation unit collection and deduplication
 * - `cache`: the process-wide read-through cache
 * - `store`: optional SQLite persistence for the cache
 * - `orchestrator`: dispatch, retry/fallback, and write-back
 */

// Re-export main types for easier usage
pub use self::cache::{CacheKey, TranslationCache};
pub use self::orchestrator::{OrchestratorOptions, PageTranslationReport, TranslationOrchestrator};
pub use self::store::CacheStore;
pub use self::units::{collect_units, normalize_key, TranslationUnit, UnitCollection};

// Submodules
pub mod cache;
pub mod orchestrator;
pub mod store;
pub mod units;
