/*!
 * Backend implementations for different translation services.
 *
 * This module contains client implementations for the supported backends:
 * - OpenAI: OpenAI-compatible chat completion APIs (hosted or local)
 * - Anthropic: Anthropic messages API
 * - Glossary: offline exact-phrase dictionary
 * - Mock: scripted behaviors for tests
 *
 * New backends are added as new variants implementing the trait and a new
 * arm in `build_backends`; dispatch is always through the configured
 * priority list, never ambient state.
 */

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::app_config::{BackendConfig, BackendKind, TranslationConfig};
use crate::errors::BackendError;

/// Common trait for all translation backends.
///
/// Each backend is a black box satisfying this single contract; the
/// orchestrator treats them interchangeably in priority order.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Stable identifier used in cache keys and diagnostics
    fn id(&self) -> &str;

    /// Translate `text` from `source_lang` to `target_lang`.
    ///
    /// # Returns
    /// * `Result<String, BackendError>` - The translated text or an error.
    ///   An empty result is treated as a failed attempt by the caller.
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, BackendError>;
}

/// Build the backend list in the configured priority order
pub fn build_backends(
    config: &TranslationConfig,
) -> Result<Vec<Arc<dyn TranslationBackend>>, BackendError> {
    let mut backends: Vec<Arc<dyn TranslationBackend>> = Vec::new();

    for kind in &config.backend_priority {
        let backend_config = config.backend_config(kind);
        let backend: Arc<dyn TranslationBackend> = match kind {
            BackendKind::OpenAI => Arc::new(openai::OpenAIBackend::from_config(
                &backend_config,
                &config.common.system_prompt,
                config.common.temperature,
            )?),
            BackendKind::Anthropic => Arc::new(anthropic::AnthropicBackend::from_config(
                &backend_config,
                &config.common.system_prompt,
                config.common.temperature,
            )?),
            BackendKind::Glossary => {
                Arc::new(glossary::GlossaryBackend::from_config(&backend_config)?)
            }
        };
        backends.push(backend);
    }

    Ok(backends)
}

/// Validate and normalize a configured endpoint URL.
///
/// Accepts bare `host:port` by assuming http, matching how local inference
/// servers are usually configured.
pub fn normalize_endpoint(endpoint: &str) -> Result<String, BackendError> {
    if endpoint.is_empty() {
        return Err(BackendError::ConnectionError(
            "endpoint cannot be empty".to_string(),
        ));
    }

    let with_scheme = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    };

    let url = url::Url::parse(&with_scheme)
        .map_err(|e| BackendError::ConnectionError(format!("invalid endpoint '{}': {}", endpoint, e)))?;
    if url.host_str().is_none() {
        return Err(BackendError::ConnectionError(format!(
            "invalid host in endpoint: {}",
            endpoint
        )));
    }

    Ok(with_scheme.trim_end_matches('/').to_string())
}

/// Fill a system prompt template's `{source_language}` / `{target_language}`
/// placeholders
pub(crate) fn render_system_prompt(template: &str, source_lang: &str, target_lang: &str) -> String {
    template
        .replace("{source_language}", source_lang)
        .replace("{target_language}", target_lang)
}

/// Helper for `from_config` constructors: reject missing API keys early
pub(crate) fn require_api_key(config: &BackendConfig, backend: &str) -> Result<String, BackendError> {
    if config.api_key.is_empty() {
        return Err(BackendError::AuthenticationError(format!(
            "API key is required for the {} backend",
            backend
        )));
    }
    Ok(config.api_key.clone())
}

pub mod anthropic;
pub mod glossary;
pub mod mock;
pub mod openai;
