//! Scorer trait and error

use thiserror::Error;

use crate::domain::ScoreVector;

/// Scoring failed; a version without a score is not a valid result
#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("Cannot score empty text for {0}")]
    EmptyInput(&'static str),

    #[error("Scoring failed: {0}")]
    Failed(String),
}

/// Assigns quality scores to a rewritten text.
///
/// Called synchronously once per finished version. Implementations must
/// return all six fields.
pub trait Scorer: Send + Sync {
    fn score(&self, original: &str, rewritten: &str) -> Result<ScoreVector, ScorerError>;
}

/// Returns the same vector for every input
#[derive(Debug, Clone, Copy)]
pub struct FixedScorer {
    score: ScoreVector,
}

impl FixedScorer {
    pub fn new(score: ScoreVector) -> Self {
        Self { score }
    }
}

impl Default for FixedScorer {
    fn default() -> Self {
        Self::new(ScoreVector::uniform(90.0))
    }
}

impl Scorer for FixedScorer {
    fn score(&self, _original: &str, _rewritten: &str) -> Result<ScoreVector, ScorerError> {
        Ok(self.score)
    }
}
