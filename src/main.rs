use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use log::info;
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::PathBuf;

mod cli;

use cli::Cli;
use cli::commands::{Commands, RequestArgs};
use rewritr::config::Config;
use rewritr::domain::{ImageAttachment, RewriteRequest, ScoreGrade, VersionResult};
use rewritr::llm::GenerationClient;
use rewritr::service::RewriteService;

/// Logger filters, strongest first: --verbose, RUST_LOG, then the configured level
fn log_builder(rust_log: Option<&str>, config_level: Option<&str>, verbose: bool) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    if let Some(filters) = rust_log.or(config_level) {
        builder.parse_filters(filters);
    }
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder
}

fn setup_logging(config: &Config, verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rewritr")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("rewritr.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let rust_log = std::env::var("RUST_LOG").ok();
    log_builder(rust_log.as_deref(), config.log_level.as_deref(), verbose)
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// JSON report written by `rewrite --json`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RewriteReport<'a> {
    generated_at: chrono::DateTime<chrono::Utc>,
    model: &'a str,
    versions: &'a [VersionResult],
}

fn read_article(args: &RequestArgs) -> Result<String> {
    if args.reads_stdin() {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read article from stdin")?;
        Ok(text)
    } else {
        fs::read_to_string(&args.input).with_context(|| format!("Failed to read article {}", args.input.display()))
    }
}

fn build_request(args: &RequestArgs) -> Result<RewriteRequest> {
    let text = read_article(args)?;

    let images = args
        .images
        .iter()
        .map(|path| ImageAttachment::from_path(path))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut request = RewriteRequest::new(text)?
        .with_keywords(args.keywords.iter().map(String::as_str))
        .with_images(images);
    if let Some(required) = &args.required {
        request = request.with_required_content(required.as_str());
    }
    if let Some(instructions) = &args.instructions {
        request = request.with_additional_instructions(instructions.as_str());
    }
    Ok(request)
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Rewrite { request, versions, json } => {
            handle_rewrite_command(request, *versions, *json, config).await
        }
        Commands::Prompt { request, version_index } => handle_prompt_command(request, *version_index, config),
        Commands::Config => handle_config_command(config),
    }
}

async fn handle_rewrite_command(args: &RequestArgs, versions: Option<u32>, json: bool, config: &Config) -> Result<()> {
    let request = build_request(args)?;
    let service = RewriteService::from_config(config).context("Failed to create rewrite service")?;
    let version_count = versions.unwrap_or(config.generation.version_count);
    if version_count == 0 {
        bail!("--versions must be at least 1");
    }

    if !json {
        println!(
            "{} {} version(s) with {}...",
            "Rewriting:".green(),
            version_count,
            service.client().model()
        );
    }

    let job = service.orchestrator();
    let run = service.run_job(&job, &request, version_count);
    tokio::pin!(run);
    let finished = tokio::select! {
        results = &mut run => Some(results),
        _ = tokio::signal::ctrl_c() => None,
    };
    let results = match finished {
        Some(results) => results,
        None => {
            eprintln!("{}", "Cancelling...".yellow());
            job.cancel();
            run.await
        }
    }?;

    if json {
        let report = RewriteReport {
            generated_at: chrono::Utc::now(),
            model: service.client().model(),
            versions: &results,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for result in &results {
            print_version(result, config.generation.min_chars);
        }
    }

    let usage = service.client().total_usage();
    info!(
        "Token usage: {} input, {} output",
        usage.input_tokens, usage.output_tokens
    );
    Ok(())
}

fn grade_colored(value: f64) -> ColoredString {
    let text = format!("{:.1}", value);
    match ScoreGrade::of(value) {
        ScoreGrade::Excellent => text.green(),
        ScoreGrade::Good => text.blue(),
        ScoreGrade::Fair => text.yellow(),
        ScoreGrade::Poor => text.red(),
    }
}

fn print_version(result: &VersionResult, min_chars: usize) {
    println!();
    println!("{}", format!("=== Version {} ===", result.version_index).bold());

    let status = if result.accepted {
        "accepted".green()
    } else {
        format!("below {} characters, longest attempt kept", min_chars).yellow()
    };
    println!(
        "  Status: {} ({} attempt(s), {} characters excluding whitespace)",
        status,
        result.attempts,
        result.non_whitespace_chars()
    );

    let scores = result
        .score
        .fields()
        .iter()
        .map(|(name, value)| format!("{} {}", name, grade_colored(*value)))
        .collect::<Vec<_>>()
        .join("  ");
    println!("  Scores: {}", scores);
    println!();
    println!("{}", result.text);
}

fn handle_prompt_command(args: &RequestArgs, version_index: u32, config: &Config) -> Result<()> {
    info!("Rendering prompt for version {}", version_index);
    if version_index == 0 {
        bail!("--version-index must be at least 1");
    }
    let request = build_request(args)?;
    let prompt = rewritr::prompt::PromptBuilder::new(config.generation.min_chars).build(&request, version_index)?;
    println!("{}", prompt);
    Ok(())
}

fn handle_config_command(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    print!("{}", yaml);
    match config.api_key() {
        Ok(_) => println!("{} {} is set", "API key:".green(), config.llm.api_key_env),
        Err(_) => println!("{} {} is not set", "API key:".red(), config.llm.api_key_env),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration; it decides the log level
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging
    setup_logging(&config, cli.is_verbose()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;

    #[test]
    fn test_config_level_used_without_rust_log() {
        let logger = log_builder(None, Some("info"), false).build();
        assert_eq!(logger.filter(), LevelFilter::Info);
    }

    #[test]
    fn test_rust_log_overrides_config_level() {
        let logger = log_builder(Some("warn"), Some("debug"), false).build();
        assert_eq!(logger.filter(), LevelFilter::Warn);
    }

    #[test]
    fn test_verbose_overrides_everything() {
        let logger = log_builder(Some("error"), Some("warn"), true).build();
        assert_eq!(logger.filter(), LevelFilter::Debug);
    }

    #[test]
    fn test_default_config_logs_info() {
        let config = Config::default();
        let logger = log_builder(None, config.log_level.as_deref(), false).build();
        assert_eq!(logger.filter(), LevelFilter::Info);
    }
}
