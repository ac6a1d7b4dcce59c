//! Version orchestration module
//!
//! Runs the versions of a rewrite job concurrently and collects their scored
//! results.

mod orchestrator;

pub use orchestrator::VersionOrchestrator;
