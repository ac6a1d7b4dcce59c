//! Prompt System - rewrite instruction rendering
//!
//! This module renders the fixed rewrite instruction with the request's
//! constraints using Handlebars.

mod render;

pub use render::{NONE_MARKER, PromptBuilder, keyword_block};
