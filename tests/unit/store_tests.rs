/*!
 * Tests for the persistent SQLite cache store
 */

use pagelift::translation::{CacheKey, CacheStore, TranslationCache};

#[test]
fn test_store_flush_and_load_shouldRoundTripEntries() {
    let store = CacheStore::open_in_memory().unwrap();

    let cache = TranslationCache::new(true);
    cache.store(CacheKey::new("こんにちは", "en", "openai"), "hello");
    cache.store(CacheKey::new("さようなら", "en", "openai"), "goodbye");
    assert_eq!(store.flush(&cache).unwrap(), 2);

    let restored = TranslationCache::new(true);
    assert_eq!(store.load_into(&restored).unwrap(), 2);
    assert_eq!(
        restored.get(&CacheKey::new("こんにちは", "en", "openai")),
        Some("hello".to_string())
    );
}

#[test]
fn test_store_flush_withEmptyCache_shouldWriteNothing() {
    let store = CacheStore::open_in_memory().unwrap();
    let cache = TranslationCache::new(true);
    assert_eq!(store.flush(&cache).unwrap(), 0);
}

#[test]
fn test_store_flush_withSameKeyTwice_shouldUpsert() {
    let store = CacheStore::open_in_memory().unwrap();

    let cache = TranslationCache::new(true);
    cache.store(CacheKey::new("特集", "en", "openai"), "feature");
    store.flush(&cache).unwrap();

    cache.store(CacheKey::new("特集", "en", "openai"), "special feature");
    store.flush(&cache).unwrap();

    let restored = TranslationCache::new(true);
    assert_eq!(store.load_into(&restored).unwrap(), 1);
    assert_eq!(
        restored.get(&CacheKey::new("特集", "en", "openai")),
        Some("special feature".to_string())
    );
}

#[test]
fn test_store_open_shouldPersistAcrossReopens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");

    {
        let store = CacheStore::open(&path).unwrap();
        let cache = TranslationCache::new(true);
        cache.store(CacheKey::new("表紙", "en", "anthropic"), "cover");
        store.flush(&cache).unwrap();
    }

    let store = CacheStore::open(&path).unwrap();
    let restored = TranslationCache::new(true);
    assert_eq!(store.load_into(&restored).unwrap(), 1);
    assert_eq!(
        restored.get(&CacheKey::new("表紙", "en", "anthropic")),
        Some("cover".to_string())
    );
}
