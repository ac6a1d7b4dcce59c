//! Acceptance loop module - repeated generation of a single version.
//!
//! This module provides:
//! - AcceptanceLoop for generating one version until it is long enough
//! - AttemptTracker, the state machine behind each run
//! - AcceptanceLoopConfig for the threshold and attempt budget

mod acceptance_loop;

pub use acceptance_loop::{AcceptanceLoop, AcceptanceLoopConfig, AttemptTracker};
