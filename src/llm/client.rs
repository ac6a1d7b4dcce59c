//! Generation client trait and a scripted mock

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ImageAttachment;
use crate::llm::types::ProviderError;

/// Stateless generation client - each call is one independent round trip.
///
/// Implementations never retry internally; retry policy belongs to the
/// acceptance loop.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Send the prompt with the images attached and return the raw text
    async fn generate(&self, prompt: &str, images: &[ImageAttachment]) -> Result<String, ProviderError>;

    /// Model identifier used for requests
    fn model(&self) -> &str;
}

/// What the mock knows about the call it is answering
#[derive(Debug, Clone)]
pub struct MockCall {
    pub prompt: String,
    /// 1-based count of calls made with this exact prompt
    pub attempt: u32,
    /// 1-based count of all calls made on this client
    pub call: u32,
    pub image_count: usize,
}

type Responder = Box<dyn Fn(&MockCall) -> Result<String, ProviderError> + Send + Sync>;

#[derive(Default)]
struct MockLog {
    calls: u32,
    per_prompt: HashMap<String, u32>,
    prompts: Vec<String>,
}

/// Generation client that answers from a script
pub struct MockGenerationClient {
    responder: Responder,
    log: Mutex<MockLog>,
}

impl MockGenerationClient {
    /// Answer every call with the same text
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::from_fn(move |_| Ok(text.clone()))
    }

    /// Replay responses in call order, repeating the last one once exhausted
    pub fn scripted(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self::from_fn(move |call| {
            let idx = (call.call as usize - 1).min(responses.len().saturating_sub(1));
            responses
                .get(idx)
                .cloned()
                .unwrap_or(Err(ProviderError::EmptyContent))
        })
    }

    /// Answer with an arbitrary function of the call
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&MockCall) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            log: Mutex::new(MockLog::default()),
        }
    }

    /// Total calls made so far
    pub fn call_count(&self) -> u32 {
        self.lock_log().calls
    }

    /// Calls made with this exact prompt
    pub fn calls_for_prompt(&self, prompt: &str) -> u32 {
        self.lock_log().per_prompt.get(prompt).copied().unwrap_or(0)
    }

    /// Every prompt received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.lock_log().prompts.clone()
    }

    fn lock_log(&self) -> std::sync::MutexGuard<'_, MockLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(&self, prompt: &str, images: &[ImageAttachment]) -> Result<String, ProviderError> {
        let call = {
            let mut log = self.lock_log();
            log.calls += 1;
            let attempt = {
                let count = log.per_prompt.entry(prompt.to_string()).or_insert(0);
                *count += 1;
                *count
            };
            log.prompts.push(prompt.to_string());
            MockCall {
                prompt: prompt.to_string(),
                attempt,
                call: log.calls,
                image_count: images.len(),
            }
        };
        // Yield so concurrent loops interleave the way real network calls do
        tokio::task::yield_now().await;
        (self.responder)(&call)
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

impl std::fmt::Debug for MockGenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockGenerationClient")
            .field("calls", &self.call_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_text_repeats() {
        let mock = MockGenerationClient::with_text("same");
        assert_eq!(mock.generate("p", &[]).await.unwrap(), "same");
        assert_eq!(mock.generate("p", &[]).await.unwrap(), "same");
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.model(), "mock-model");
    }

    #[tokio::test]
    async fn test_scripted_repeats_last() {
        let mock = MockGenerationClient::scripted(vec![
            Ok("first".to_string()),
            Err(ProviderError::Timeout),
            Ok("last".to_string()),
        ]);
        assert_eq!(mock.generate("p", &[]).await.unwrap(), "first");
        assert!(matches!(mock.generate("p", &[]).await, Err(ProviderError::Timeout)));
        assert_eq!(mock.generate("p", &[]).await.unwrap(), "last");
        assert_eq!(mock.generate("p", &[]).await.unwrap(), "last");
    }

    #[tokio::test]
    async fn test_empty_script_yields_empty_content() {
        let mock = MockGenerationClient::scripted(vec![]);
        assert!(matches!(mock.generate("p", &[]).await, Err(ProviderError::EmptyContent)));
    }

    #[tokio::test]
    async fn test_per_prompt_attempts() {
        let mock = MockGenerationClient::from_fn(|call| Ok(format!("{}#{}", call.prompt, call.attempt)));
        assert_eq!(mock.generate("a", &[]).await.unwrap(), "a#1");
        assert_eq!(mock.generate("b", &[]).await.unwrap(), "b#1");
        assert_eq!(mock.generate("a", &[]).await.unwrap(), "a#2");
        assert_eq!(mock.calls_for_prompt("a"), 2);
        assert_eq!(mock.calls_for_prompt("b"), 1);
        assert_eq!(mock.prompts(), ["a", "b", "a"]);
    }
}
