//! Rewritr - multi-version article rewriting
//!
//! Rewritr produces several independently generated rewrites of one article.
//! Each version repeats generation with a fixed prompt until the output is
//! long enough, falling back to the longest attempt, and is then scored.

pub mod config;
pub mod domain;
pub mod error;
pub mod llm;
pub mod manager;
pub mod prompt;
pub mod runner;
pub mod scoring;
pub mod service;

pub use error::{Result, RewriteError};
pub use service::{JobError, RewriteService};
