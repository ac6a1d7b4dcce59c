//! Placeholder scorer drawing every field uniformly from a fixed band.

use std::ops::Range;

use rand::Rng;

use crate::domain::ScoreVector;
use crate::scoring::traits::{Scorer, ScorerError};

/// Default band: [85, 95)
pub const DEFAULT_BAND: Range<f64> = 85.0..95.0;

#[derive(Debug, Clone)]
pub struct RandomBandScorer {
    band: Range<f64>,
}

impl RandomBandScorer {
    pub fn new(band: Range<f64>) -> Result<Self, ScorerError> {
        if !band.start.is_finite() || !band.end.is_finite() || band.start >= band.end {
            return Err(ScorerError::Failed(format!("empty score band {:?}", band)));
        }
        Ok(Self { band })
    }
}

impl Default for RandomBandScorer {
    fn default() -> Self {
        Self { band: DEFAULT_BAND }
    }
}

impl Scorer for RandomBandScorer {
    fn score(&self, original: &str, _rewritten: &str) -> Result<ScoreVector, ScorerError> {
        if original.trim().is_empty() {
            return Err(ScorerError::EmptyInput("original"));
        }
        let mut rng = rand::thread_rng();
        let mut draw = || rng.gen_range(self.band.clone());
        Ok(ScoreVector {
            total: draw(),
            plagiarism: draw(),
            similarity: draw(),
            diversity: draw(),
            naturalness: draw(),
            seo: draw(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores_stay_in_band() {
        let scorer = RandomBandScorer::default();
        for _ in 0..200 {
            let score = scorer.score("original", "rewritten").unwrap();
            assert!(score.is_complete());
            for (name, value) in score.fields() {
                assert!((85.0..95.0).contains(&value), "{} = {} out of band", name, value);
            }
        }
    }

    #[test]
    fn test_empty_rewrite_still_scored() {
        // An exhausted loop may hand back an empty fallback
        let scorer = RandomBandScorer::default();
        assert!(scorer.score("original", "").is_ok());
    }

    #[test]
    fn test_empty_original_rejected() {
        let scorer = RandomBandScorer::default();
        assert!(matches!(scorer.score("  ", "x"), Err(ScorerError::EmptyInput(_))));
    }

    #[test]
    fn test_invalid_band_rejected() {
        assert!(RandomBandScorer::new(90.0..90.0).is_err());
        assert!(RandomBandScorer::new(0.0..f64::INFINITY).is_err());
        assert!(RandomBandScorer::new(0.0..100.0).is_ok());
    }
}
