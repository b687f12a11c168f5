/*!
 * Translation caching functionality.
 *
 * Process-wide read-through cache shared by all page workers. Entries are
 * keyed by normalized source text, target language, and backend id; they are
 * never evicted within a run (bounded by document size) and can optionally
 * be persisted across runs through the store module.
 */

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;

use super::units::preview;

/// Cache key combining normalized source text, target language, and the
/// backend the entry is attributed to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Normalized source text
    pub source_text: String,
    /// Target language code
    pub target_language: String,
    /// Backend id the entry is attributed to
    pub backend_id: String,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(source_text: &str, target_language: &str, backend_id: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            target_language: target_language.to_string(),
            backend_id: backend_id.to_string(),
        }
    }
}

/// Translation cache for storing and retrieving translations.
///
/// Clones share storage; concurrent misses on the same key may both reach a
/// backend, which is acceptable duplicate work since writes for identical
/// keys are idempotent last-write-wins.
pub struct TranslationCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<CacheKey, String>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,

    /// Whether caching is enabled
    enabled: bool,
}

impl TranslationCache {
    /// Create a new translation cache
    pub fn new(enabled: bool) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
            enabled,
        }
    }

    /// Get a translation from the cache
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let cache = self.cache.read();
        match cache.get(key) {
            Some(translation) => {
                *self.hits.write() += 1;
                debug!(
                    "Cache hit for '{}' (-> {} via {})",
                    preview(&key.source_text, 30),
                    key.target_language,
                    key.backend_id
                );
                Some(translation.clone())
            }
            None => {
                *self.misses.write() += 1;
                None
            }
        }
    }

    /// Store a translation in the cache
    pub fn store(&self, key: CacheKey, translation: &str) {
        if !self.enabled {
            return;
        }

        debug!(
            "Cached translation for '{}' (-> {} via {})",
            preview(&key.source_text, 30),
            key.target_language,
            key.backend_id
        );
        self.cache.write().insert(key, translation.to_string());
    }

    /// Get cache statistics as (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Clear the cache and counters
    pub fn clear(&self) {
        self.cache.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;
        debug!("Translation cache cleared");
    }

    /// Number of entries in the cache
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Whether the cache is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Snapshot every entry, for persistence flushes
    pub fn entries(&self) -> Vec<(CacheKey, String)> {
        self.cache
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Clone for TranslationCache {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            hits: self.hits.clone(),
            misses: self.misses.clone(),
            enabled: self.enabled,
        }
    }
}
