//! CLI module for rewritr - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for rewriting an article,
//! previewing the generation prompt and showing the effective configuration.

pub mod commands;

pub use commands::Cli;
