//! Scoring - quality assessment of finished versions
//!
//! The scoring algorithm itself is pluggable. `RandomBandScorer` is the
//! placeholder used in production; `FixedScorer` gives tests stable values.

mod band;
mod traits;

pub use band::{DEFAULT_BAND, RandomBandScorer};
pub use traits::{FixedScorer, Scorer, ScorerError};
