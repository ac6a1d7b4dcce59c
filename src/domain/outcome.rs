//! Attempt and version outcome types.

use serde::{Deserialize, Serialize};

use super::score::ScoreVector;

/// One generation call's text with its length metrics precomputed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationAttempt {
    pub text: String,
    /// Acceptance metric
    pub non_whitespace_chars: usize,
    /// Fallback metric: every character, whitespace included
    pub chars: usize,
}

impl GenerationAttempt {
    pub fn new(text: String) -> Self {
        let non_whitespace_chars = count_non_whitespace(&text);
        let chars = text.chars().count();
        Self {
            text,
            non_whitespace_chars,
            chars,
        }
    }
}

/// Count characters that are not Unicode whitespace
pub fn count_non_whitespace(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// State of an acceptance loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    /// Still calling the model
    Attempting,
    /// An attempt met the length threshold
    Accepted,
    /// Attempt budget spent (or the loop was cancelled) without acceptance
    Exhausted,
}

impl LoopState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoopState::Attempting)
    }
}

/// What one acceptance loop hands back to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub text: String,
    pub accepted: bool,
    /// Generation calls that completed, successfully or not
    pub attempts: u32,
    pub state: LoopState,
}

/// A finished, scored version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResult {
    pub version_index: u32,
    pub text: String,
    pub accepted: bool,
    pub attempts: u32,
    pub score: ScoreVector,
}

impl VersionResult {
    pub fn from_outcome(version_index: u32, outcome: LoopOutcome, score: ScoreVector) -> Self {
        Self {
            version_index,
            text: outcome.text,
            accepted: outcome.accepted,
            attempts: outcome.attempts,
            score,
        }
    }

    pub fn non_whitespace_chars(&self) -> usize {
        count_non_whitespace(&self.text)
    }
}
