//! Domain types for rewritr
//!
//! - RewriteRequest / ImageAttachment: the inbound job
//! - GenerationAttempt / LoopOutcome / LoopState: acceptance loop bookkeeping
//! - VersionResult: a finished, scored version
//! - ScoreVector / ScoreGrade: quality assessment

pub mod outcome;
pub mod request;
pub mod score;

pub use outcome::{GenerationAttempt, LoopOutcome, LoopState, VersionResult, count_non_whitespace};
pub use request::{ImageAttachment, RequestError, RewriteRequest};
pub use score::{ScoreGrade, ScoreVector};
