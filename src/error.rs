//! Error types for rewritr
//!
//! Centralized error handling using thiserror. Each concern owns its own
//! error enum; `RewriteError` is the orchestration-level error that the
//! others fold into.

use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::RequestError;
use crate::llm::ProviderError;
use crate::scoring::ScorerError;

/// All errors that can end a rewrite job
#[derive(Debug, Error)]
pub enum RewriteError {
    /// Configuration was missing or invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The inbound request was malformed
    #[error("Invalid request: {0}")]
    Request(#[from] RequestError),

    /// A non-retryable generation failure
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Scoring a finished version failed
    #[error("Scorer error: {0}")]
    Scorer(#[from] ScorerError),

    /// Prompt template could not be rendered
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// A version task panicked or was aborted
    #[error("Version task failed: {0}")]
    TaskFailed(String),

    /// The whole job was cancelled by the caller
    #[error("Job cancelled")]
    Cancelled,

    /// Zero versions were requested
    #[error("Version count must be at least 1")]
    InvalidVersionCount,
}

/// Result type alias for rewritr operations
pub type Result<T> = std::result::Result<T, RewriteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error() {
        assert_eq!(RewriteError::Cancelled.to_string(), "Job cancelled");
    }

    #[test]
    fn test_invalid_version_count_error() {
        assert_eq!(
            RewriteError::InvalidVersionCount.to_string(),
            "Version count must be at least 1"
        );
    }

    #[test]
    fn test_provider_error_conversion() {
        let err: RewriteError = ProviderError::Unauthorized {
            status: 401,
            message: "invalid x-api-key".to_string(),
        }
        .into();
        assert!(matches!(err, RewriteError::Provider(_)));
        assert!(err.to_string().contains("invalid x-api-key"));
    }

    #[test]
    fn test_request_error_conversion() {
        let err: RewriteError = RequestError::EmptyText.into();
        assert!(matches!(err, RewriteError::Request(_)));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: RewriteError = ConfigError::MissingApiKey {
            env_var: "ANTHROPIC_API_KEY".to_string(),
        }
        .into();
        assert!(matches!(err, RewriteError::Config(_)));
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(RewriteError::TaskFailed("panicked".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
