//! Anthropic API client implementation
//!
//! This module implements the GenerationClient trait for the Anthropic
//! Messages API. One client is built at startup and shared by every job.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::{ConfigError, LlmConfig};
use crate::domain::ImageAttachment;
use crate::llm::client::GenerationClient;
use crate::llm::types::{Message, MessagesRequest, MessagesResponse, ProviderError, Usage};

/// Anthropic API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default API base URL
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Default model to use
const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";

/// Default max tokens
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Configuration for the Anthropic client
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub base_url: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(300),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl AnthropicConfig {
    /// Create a new config with a specific model
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

impl From<&LlmConfig> for AnthropicConfig {
    fn from(llm: &LlmConfig) -> Self {
        Self {
            model: llm.model.clone(),
            max_tokens: llm.max_tokens,
            timeout: Duration::from_millis(llm.timeout_ms),
            base_url: llm.base_url.clone(),
        }
    }
}

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    config: AnthropicConfig,
    usage: Arc<Mutex<Usage>>,
}

impl AnthropicClient {
    /// Create a client with an explicit API key, normally from `Config::api_key`
    pub fn with_api_key(api_key: impl Into<String>, config: AnthropicConfig) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("API key is blank".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            config,
            usage: Arc::new(Mutex::new(Usage::default())),
        })
    }

    /// Build the request body for the Messages API
    fn build_request(&self, prompt: &str, images: &[ImageAttachment]) -> MessagesRequest {
        MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            messages: vec![Message::user_with_images(prompt, images)],
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    /// Send a request and decode the response body
    async fn send_request(&self, body: &MessagesRequest) -> Result<MessagesResponse, ProviderError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ProviderError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::from_status(status.as_u16(), error_body));
        }

        response
            .json::<MessagesResponse>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    fn record_usage(&self, usage: Option<&Usage>) {
        if let Some(usage) = usage {
            let mut total = self.usage.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            total.input_tokens += usage.input_tokens;
            total.output_tokens += usage.output_tokens;
        }
    }

    /// Get cumulative token usage
    pub fn total_usage(&self) -> Usage {
        self.usage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl GenerationClient for AnthropicClient {
    async fn generate(&self, prompt: &str, images: &[ImageAttachment]) -> Result<String, ProviderError> {
        let body = self.build_request(prompt, images);
        tracing::debug!(model = %self.config.model, images = images.len(), "Sending generation request");

        let response = self.send_request(&body).await?;
        self.record_usage(response.usage.as_ref());

        let text = response.text().ok_or(ProviderError::EmptyContent)?;
        tracing::debug!(
            chars = text.chars().count(),
            stop_reason = response.stop_reason.as_deref().unwrap_or("unknown"),
            "Generation response received"
        );
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// Keep the API key out of debug output
impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("model", &self.config.model)
            .field("max_tokens", &self.config.max_tokens)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}
