//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - rewrite: produce scored versions of an article
//! - prompt: print the prompt one version would send
//! - config: print the effective configuration

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Rewritr - multi-version article rewriting with an LLM
#[derive(Parser, Debug)]
#[command(name = "rewritr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite an article into several scored versions
    Rewrite {
        #[command(flatten)]
        request: RequestArgs,

        /// Number of versions (defaults to generation.version_count)
        #[arg(short = 'n', long)]
        versions: Option<u32>,

        /// Print the results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the prompt a version would send, without calling the API
    Prompt {
        #[command(flatten)]
        request: RequestArgs,

        /// Version index to render
        #[arg(long = "version-index", default_value_t = 1)]
        version_index: u32,
    },

    /// Show the effective configuration
    Config,
}

/// The article and the constraints every version must honour
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Article to rewrite; "-" reads stdin
    #[arg(short, long)]
    pub input: PathBuf,

    /// Keyword that must appear (repeatable)
    #[arg(short, long = "keyword")]
    pub keywords: Vec<String>,

    /// Content the rewrite must cover
    #[arg(short, long)]
    pub required: Option<String>,

    /// Free-form additional instructions
    #[arg(long)]
    pub instructions: Option<String>,

    /// Reference image to attach (repeatable)
    #[arg(long = "image")]
    pub images: Vec<PathBuf>,
}

impl RequestArgs {
    /// Whether the article is read from stdin
    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }
}
