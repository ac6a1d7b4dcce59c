//! Generation client layer - Anthropic Messages API integration
//!
//! This module provides:
//! - GenerationClient trait for API abstraction
//! - AnthropicClient implementation with image parts
//! - MockGenerationClient for tests
//! - ProviderError with retryability classification

pub mod anthropic;
pub mod client;
pub mod types;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use client::{GenerationClient, MockCall, MockGenerationClient};
pub use types::{ContentBlock, ImageSource, Message, MessagesRequest, MessagesResponse, ProviderError, Role, Usage};
