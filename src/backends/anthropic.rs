use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::BackendConfig;
use crate::errors::BackendError;

use super::{normalize_endpoint, render_system_prompt, require_api_key, TranslationBackend};

/// Maximum completion tokens requested per translation.
///
/// A single magazine text block is far below this; the ceiling only guards
/// against runaway completions.
const MAX_TOKENS: u32 = 4096;

/// Anthropic messages API client
pub struct AnthropicBackend {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL
    endpoint: String,
    /// Model name
    model: String,
    /// System prompt template with language placeholders
    system_prompt: String,
    /// Sampling temperature
    temperature: f32,
}

impl std::fmt::Debug for AnthropicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicBackend")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

/// Anthropic message request
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<AnthropicMessage>,

    /// System prompt to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    max_tokens: u32,
}

/// Anthropic message format
#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    /// Role of the message sender (user, assistant)
    role: String,

    /// Content of the message
    content: String,
}

/// Anthropic response
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    /// The content of the response
    content: Vec<AnthropicContent>,
}

/// Individual content block in an Anthropic response
#[derive(Debug, Deserialize)]
struct AnthropicContent {
    /// The type of content
    #[serde(rename = "type")]
    content_type: String,

    /// The actual text content
    text: String,
}

impl AnthropicBackend {
    /// Create a backend from its configuration entry
    pub fn from_config(
        config: &BackendConfig,
        system_prompt: &str,
        temperature: f32,
    ) -> Result<Self, BackendError> {
        let api_key = require_api_key(config, "Anthropic")?;
        let endpoint = normalize_endpoint(&config.endpoint)?;

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key,
            endpoint,
            model: config.model.clone(),
            system_prompt: system_prompt.to_string(),
            temperature,
        })
    }

    /// Complete a messages request
    async fn complete(&self, request: AnthropicRequest) -> Result<AnthropicResponse, BackendError> {
        let api_url = format!("{}/v1/messages", self.endpoint);

        let response = self
            .client
            .post(&api_url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Anthropic API error ({}): {}", status, error_text);
            return Err(match status.as_u16() {
                401 | 403 => BackendError::AuthenticationError(error_text),
                429 => BackendError::RateLimitExceeded(error_text),
                code => BackendError::ApiError { status_code: code, message: error_text },
            });
        }

        response
            .json::<AnthropicResponse>()
            .await
            .map_err(|e| BackendError::ParseError(e.to_string()))
    }

    /// Extract text from an Anthropic response
    fn extract_text(response: &AnthropicResponse) -> String {
        response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect()
    }
}

#[async_trait]
impl TranslationBackend for AnthropicBackend {
    fn id(&self) -> &str {
        "anthropic"
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, BackendError> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: text.to_string(),
            }],
            system: Some(render_system_prompt(&self.system_prompt, source_lang, target_lang)),
            temperature: Some(self.temperature),
            max_tokens: MAX_TOKENS,
        };

        let response = self.complete(request).await?;
        let translated = Self::extract_text(&response).trim().to_string();

        if translated.is_empty() {
            return Err(BackendError::EmptyTranslation);
        }
        Ok(translated)
    }
}
