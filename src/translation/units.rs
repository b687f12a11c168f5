/*!
 * Translation units: the atomic items submitted to the orchestrator.
 *
 * Units are collected per page from the reading-order run traversal,
 * deduplicated by a normalized key so one backend call fans out to every
 * occurrence, and carry back-references for write-back. They are stateless
 * value objects whose lifetime spans only the translation stage.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::layout::{Page, RunRef};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize text for deduplication and cache keys: trim, collapse internal
/// whitespace, lowercase.
///
/// Case folding matters little for Japanese source text but keeps the cache
/// key stable for mixed-script magazine content (Latin product names,
/// romaji headings).
pub fn normalize_key(text: &str) -> String {
    WHITESPACE
        .replace_all(text.trim(), " ")
        .to_lowercase()
}

/// One unique text to translate, with every run that wants the result
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    /// Normalized dedup/cache key
    pub key: String,
    /// Representative source text (first occurrence, original spelling)
    pub text: String,
    /// Back-references to every owning run, in reading order
    pub refs: Vec<RunRef>,
}

/// Result of collecting units from a page
#[derive(Debug, Default)]
pub struct UnitCollection {
    /// Unique units in first-occurrence reading order
    pub units: Vec<TranslationUnit>,
    /// Runs whose text is empty or whitespace-only; they pass through
    /// unchanged and are never sent to a backend
    pub passthrough: Vec<RunRef>,
}

/// Collect translation units from a page in reading order.
///
/// Deduplication is by normalized key; the representative text of a unit is
/// the first occurrence's original spelling.
pub fn collect_units(page: &Page) -> UnitCollection {
    let mut collection = UnitCollection::default();

    for (run_ref, run) in page.runs() {
        if run.source.trim().is_empty() {
            collection.passthrough.push(run_ref);
            continue;
        }
        let key = normalize_key(&run.source);
        match collection.units.iter_mut().find(|u| u.key == key) {
            Some(unit) => unit.refs.push(run_ref),
            None => collection.units.push(TranslationUnit {
                key,
                text: run.source.clone(),
                refs: vec![run_ref],
            }),
        }
    }

    collection
}

/// Truncate text for log lines and error previews
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
