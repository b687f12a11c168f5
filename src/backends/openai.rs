use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::BackendConfig;
use crate::errors::BackendError;

use super::{normalize_endpoint, render_system_prompt, require_api_key, TranslationBackend};

/// OpenAI-compatible chat completion client.
///
/// Also serves self-hosted OpenAI-compatible servers; those typically accept
/// any API key.
pub struct OpenAIBackend {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Base endpoint URL (`.../v1`)
    endpoint: String,
    /// Model name
    model: String,
    /// System prompt template with language placeholders
    system_prompt: String,
    /// Sampling temperature
    temperature: f32,
}

impl std::fmt::Debug for OpenAIBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIBackend")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest {
    /// The model to use
    model: String,

    /// Conversation messages
    messages: Vec<ChatMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Chat message format
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    role: String,

    /// Content of the message
    content: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    /// Completion choices
    choices: Vec<ChatChoice>,
}

/// Individual completion choice
#[derive(Debug, Deserialize)]
struct ChatChoice {
    /// The generated message
    message: ChatMessage,
}

impl OpenAIBackend {
    /// Create a backend from its configuration entry
    pub fn from_config(
        config: &BackendConfig,
        system_prompt: &str,
        temperature: f32,
    ) -> Result<Self, BackendError> {
        let api_key = require_api_key(config, "OpenAI")?;
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

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, BackendError> {
        let api_url = format!("{}/chat/completions", self.endpoint);

        let response = self
            .client
            .post(&api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
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
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(match status.as_u16() {
                401 | 403 => BackendError::AuthenticationError(error_text),
                429 => BackendError::RateLimitExceeded(error_text),
                code => BackendError::ApiError { status_code: code, message: error_text },
            });
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| BackendError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl TranslationBackend for OpenAIBackend {
    fn id(&self) -> &str {
        "openai"
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, BackendError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: render_system_prompt(&self.system_prompt, source_lang, target_lang),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            temperature: Some(self.temperature),
        };

        let response = self.complete(request).await?;
        let translated = response
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();

        if translated.is_empty() {
            return Err(BackendError::EmptyTranslation);
        }
        Ok(translated)
    }
}
