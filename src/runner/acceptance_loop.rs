//! Acceptance loop - generate one version until it is long enough.
//!
//! The prompt is rendered once and sent unchanged on every attempt. An
//! attempt is accepted when its non-whitespace character count reaches the
//! threshold. Otherwise the longest text seen so far (in characters) is kept
//! as the fallback, which is returned once the attempt budget is spent.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::GenerationConfig;
use crate::domain::{GenerationAttempt, LoopOutcome, LoopState, RewriteRequest};
use crate::error::Result;
use crate::llm::GenerationClient;
use crate::prompt::PromptBuilder;

/// Configuration for the AcceptanceLoop.
#[derive(Debug, Clone)]
pub struct AcceptanceLoopConfig {
    /// Minimum non-whitespace characters for an attempt to be accepted
    pub min_chars: usize,
    /// Generation calls per version before falling back
    pub max_attempts: u32,
}

impl Default for AcceptanceLoopConfig {
    fn default() -> Self {
        Self {
            min_chars: 1500,
            max_attempts: 10,
        }
    }
}

impl From<&GenerationConfig> for AcceptanceLoopConfig {
    fn from(generation: &GenerationConfig) -> Self {
        Self {
            min_chars: generation.min_chars,
            max_attempts: generation.max_attempts,
        }
    }
}

/// State machine for one version: `Attempting -> {Accepted, Exhausted}`.
///
/// Kept separate from the I/O so termination and fallback selection can be
/// driven directly.
#[derive(Debug)]
pub struct AttemptTracker {
    min_chars: usize,
    max_attempts: u32,
    attempts: u32,
    state: LoopState,
    accepted: Option<String>,
    fallback: String,
    fallback_chars: usize,
}

impl AttemptTracker {
    pub fn new(min_chars: usize, max_attempts: u32) -> Self {
        Self {
            min_chars,
            max_attempts,
            attempts: 0,
            state: LoopState::Attempting,
            accepted: None,
            fallback: String::new(),
            fallback_chars: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Current fallback candidate
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Record a call that returned text
    pub fn record_text(&mut self, attempt: GenerationAttempt) -> LoopState {
        if self.state.is_terminal() {
            return self.state;
        }
        self.attempts += 1;

        if attempt.non_whitespace_chars >= self.min_chars {
            self.accepted = Some(attempt.text);
            self.state = LoopState::Accepted;
            return self.state;
        }

        // Strictly longer only: ties keep the earliest text
        if attempt.chars > self.fallback_chars {
            self.fallback = attempt.text;
            self.fallback_chars = attempt.chars;
        }
        self.exhaust_if_spent()
    }

    /// Record a call that failed with a retryable error
    pub fn record_failure(&mut self) -> LoopState {
        if self.state.is_terminal() {
            return self.state;
        }
        self.attempts += 1;
        self.exhaust_if_spent()
    }

    /// Stop early (cancellation); the fallback becomes the result
    pub fn stop(&mut self) {
        if !self.state.is_terminal() {
            self.state = LoopState::Exhausted;
        }
    }

    fn exhaust_if_spent(&mut self) -> LoopState {
        if self.attempts >= self.max_attempts {
            self.state = LoopState::Exhausted;
        }
        self.state
    }

    pub fn into_outcome(self) -> LoopOutcome {
        match self.accepted {
            Some(text) => LoopOutcome {
                text,
                accepted: true,
                attempts: self.attempts,
                state: LoopState::Accepted,
            },
            None => LoopOutcome {
                text: self.fallback,
                accepted: false,
                attempts: self.attempts,
                state: LoopState::Exhausted,
            },
        }
    }
}

/// Runs the acceptance loop for one version at a time.
///
/// Holds no per-run state, so one instance is shared by every concurrent
/// version of a job.
pub struct AcceptanceLoop<C: GenerationClient + ?Sized> {
    client: Arc<C>,
    prompts: PromptBuilder,
    config: AcceptanceLoopConfig,
}

impl<C: GenerationClient + ?Sized> AcceptanceLoop<C> {
    pub fn new(client: Arc<C>, config: AcceptanceLoopConfig) -> Self {
        Self {
            client,
            prompts: PromptBuilder::new(config.min_chars),
            config,
        }
    }

    pub fn config(&self) -> &AcceptanceLoopConfig {
        &self.config
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    /// Generate one version.
    ///
    /// Retryable provider errors consume an attempt; a non-retryable error
    /// is returned immediately. Cancellation ends the loop with the current
    /// fallback.
    pub async fn run(
        &self,
        request: &RewriteRequest,
        version_index: u32,
        cancel: &CancellationToken,
    ) -> Result<LoopOutcome> {
        let prompt = self.prompts.build(request, version_index)?;
        let mut tracker = AttemptTracker::new(self.config.min_chars, self.config.max_attempts);

        while !tracker.state().is_terminal() {
            let attempt_no = tracker.attempts() + 1;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.client.generate(&prompt, request.images()) => Some(result),
            };
            let Some(result) = result else {
                tracing::info!(version = version_index, attempt = attempt_no, "Version cancelled");
                tracker.stop();
                break;
            };

            match result {
                Ok(text) => {
                    let attempt = GenerationAttempt::new(text);
                    tracing::debug!(
                        version = version_index,
                        attempt = attempt_no,
                        non_whitespace_chars = attempt.non_whitespace_chars,
                        min_chars = self.config.min_chars,
                        "Generation attempt finished"
                    );
                    tracker.record_text(attempt);
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(version = version_index, attempt = attempt_no, error = %e, "Generation attempt failed");
                    tracker.record_failure();
                }
                Err(e) => {
                    tracing::error!(version = version_index, attempt = attempt_no, error = %e, "Generation failed, not retrying");
                    return Err(e.into());
                }
            }
        }

        let outcome = tracker.into_outcome();
        if outcome.accepted {
            log::info!("Version {} accepted after {} attempt(s)", version_index, outcome.attempts);
        } else {
            log::warn!(
                "Version {}: minimum of {} characters not reached after {} attempt(s), returning longest output ({} chars)",
                version_index,
                self.config.min_chars,
                outcome.attempts,
                outcome.text.chars().count()
            );
        }
        Ok(outcome)
    }
}
