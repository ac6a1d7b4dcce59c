//! Six-field quality assessment attached to each version.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreVector {
    pub total: f64,
    pub plagiarism: f64,
    pub similarity: f64,
    pub diversity: f64,
    pub naturalness: f64,
    pub seo: f64,
}

impl ScoreVector {
    /// Every field set to the same value
    pub fn uniform(value: f64) -> Self {
        Self {
            total: value,
            plagiarism: value,
            similarity: value,
            diversity: value,
            naturalness: value,
            seo: value,
        }
    }

    /// Field name and value pairs, `total` first
    pub fn fields(&self) -> [(&'static str, f64); 6] {
        [
            ("total", self.total),
            ("plagiarism", self.plagiarism),
            ("similarity", self.similarity),
            ("diversity", self.diversity),
            ("naturalness", self.naturalness),
            ("seo", self.seo),
        ]
    }

    /// True when every field is a finite number
    pub fn is_complete(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.is_finite())
    }
}

/// Display band for a single score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ScoreGrade {
    pub fn of(score: f64) -> Self {
        if score >= 90.0 {
            ScoreGrade::Excellent
        } else if score >= 80.0 {
            ScoreGrade::Good
        } else if score >= 70.0 {
            ScoreGrade::Fair
        } else {
            ScoreGrade::Poor
        }
    }
}
