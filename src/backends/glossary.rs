/*!
 * Offline dictionary backend.
 *
 * Looks translations up in an exact-phrase glossary loaded from a JSON file
 * (`{"source": "translation", ...}`). Useful as the last entry in the
 * priority list: recurring magazine furniture (section headers, publisher
 * boilerplate, issue labels) still translates when every network backend is
 * down. Texts absent from the glossary fail with `NoTranslation`, which the
 * orchestrator treats as non-retryable.
 */

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use log::info;

use crate::app_config::BackendConfig;
use crate::errors::BackendError;
use crate::translation::normalize_key;

use super::TranslationBackend;

/// Exact-phrase dictionary backend
#[derive(Debug, Default)]
pub struct GlossaryBackend {
    /// Normalized source phrase -> translation
    terms: HashMap<String, String>,
}

impl GlossaryBackend {
    /// Create a backend from its configuration entry.
    ///
    /// The `endpoint` field doubles as the glossary file path for this
    /// backend; an empty path yields an empty glossary.
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        if config.endpoint.is_empty() {
            return Ok(Self::default());
        }
        Self::from_file(&config.endpoint)
    }

    /// Load a glossary from a JSON object file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BackendError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            BackendError::RequestFailed(format!(
                "cannot read glossary {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;
        let parsed: HashMap<String, String> = serde_json::from_str(&raw)
            .map_err(|e| BackendError::ParseError(format!("invalid glossary file: {}", e)))?;

        let backend = Self::from_terms(parsed);
        info!(
            "Loaded glossary with {} term(s) from {:?}",
            backend.terms.len(),
            path.as_ref()
        );
        Ok(backend)
    }

    /// Build a glossary from an in-memory term map
    pub fn from_terms(terms: HashMap<String, String>) -> Self {
        let terms = terms
            .into_iter()
            .map(|(source, translation)| (normalize_key(&source), translation))
            .collect();
        Self { terms }
    }

    /// Number of terms in the glossary
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the glossary has no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[async_trait]
impl TranslationBackend for GlossaryBackend {
    fn id(&self) -> &str {
        "glossary"
    }

    async fn translate(
        &self,
        text: &str,
        _source_lang: &str,
        _target_lang: &str,
    ) -> Result<String, BackendError> {
        self.terms
            .get(&normalize_key(text))
            .cloned()
            .ok_or(BackendError::NoTranslation)
    }
}
