//! Provider error and Messages API wire types
//!
//! Request bodies are built from these serde types rather than ad hoc JSON so
//! that image parts always carry the exact `source` shape the API expects.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors from a single generation call
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Model returned no text content")]
    EmptyContent,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether the acceptance loop may spend another attempt after this error.
    ///
    /// Credentials failures repeat identically on every call, so they end the job.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ProviderError::Unauthorized { .. })
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => ProviderError::Unauthorized { status, message },
            _ => ProviderError::Api { status, message },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// Role of a request turn; every request is a single user turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

/// Body of `POST /v1/messages`
#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// A user turn carrying the prompt followed by one part per image
    pub fn user_with_images(prompt: &str, images: &[crate::domain::ImageAttachment]) -> Self {
        let mut content = Vec::with_capacity(images.len() + 1);
        content.push(ContentBlock::Text {
            text: prompt.to_string(),
        });
        content.extend(images.iter().map(|img| ContentBlock::Image {
            source: ImageSource::Base64 {
                media_type: img.mime_type().to_string(),
                data: img.to_base64(),
            },
        }));
        Self {
            role: Role::User,
            content,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    Base64 { media_type: String, data: String },
}

/// The parts of a Messages API response we read
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ResponseBlock>,
    pub stop_reason: Option<String>,
    pub usage: Option<Usage>,
}

impl MessagesResponse {
    /// Concatenated text of every text block, `None` if there is none
    pub fn text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text.as_str()),
                ResponseBlock::Unsupported => None,
            })
            .collect();
        if parts.is_empty() { None } else { Some(parts.concat()) }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Unsupported,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ImageAttachment;

    #[test]
    fn test_unauthorized_is_not_retryable() {
        let err = ProviderError::from_status(401, "invalid x-api-key");
        assert!(matches!(err, ProviderError::Unauthorized { status: 401, .. }));
        assert!(!err.is_retryable());

        let err = ProviderError::from_status(403, "forbidden");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_transient_errors_are_retryable() {
        assert!(ProviderError::from_status(500, "overloaded").is_retryable());
        assert!(ProviderError::from_status(400, "bad request").is_retryable());
        assert!(ProviderError::Timeout.is_retryable());
        assert!(ProviderError::EmptyContent.is_retryable());
        assert!(ProviderError::Network("reset".into()).is_retryable());
        assert!(
            ProviderError::RateLimited {
                retry_after: Duration::from_secs(30)
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_message_with_images_serialization() {
        let image = ImageAttachment::new("image/png", b"png".to_vec()).unwrap();
        let msg = Message::user_with_images("Rewrite this", &[image]);
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["role"], "user");
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][0]["text"], "Rewrite this");
        assert_eq!(json["content"][1]["type"], "image");
        assert_eq!(json["content"][1]["source"]["type"], "base64");
        assert_eq!(json["content"][1]["source"]["media_type"], "image/png");
        assert_eq!(json["content"][1]["source"]["data"], "cG5n");
    }

    #[test]
    fn test_message_without_images_has_single_block() {
        let msg = Message::user_with_images("Rewrite this", &[]);
        assert_eq!(msg.content.len(), 1);
    }

    #[test]
    fn test_response_text_concatenates_blocks() {
        let response: MessagesResponse = serde_json::from_value(serde_json::json!({
            "content": [
                { "type": "text", "text": "Hello " },
                { "type": "tool_use", "id": "x", "name": "y", "input": {} },
                { "type": "text", "text": "world" }
            ],
            "stop_reason": "end_turn"
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello world"));
    }

    #[test]
    fn test_response_without_text() {
        let response: MessagesResponse = serde_json::from_value(serde_json::json!({
            "content": [],
            "stop_reason": "max_tokens"
        }))
        .unwrap();
        assert_eq!(response.text(), None);
    }
}
