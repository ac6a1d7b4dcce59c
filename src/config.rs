//! Configuration loading
//!
//! Configuration is read from YAML with a fallback chain: an explicit path,
//! then `~/.config/rewritr/rewritr.yml`, then `./rewritr.yml`, then defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::scoring::DEFAULT_BAND;

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing API key: environment variable {env_var} not set")]
    MissingApiKey { env_var: String },

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub generation: GenerationConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-sonnet-20240229".to_string(),
            max_tokens: 4096,
            timeout_ms: 300000,
            base_url: "https://api.anthropic.com".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Acceptance threshold, counted in non-whitespace characters
    pub min_chars: usize,
    pub max_attempts: u32,
    pub version_count: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            min_chars: 1500,
            max_attempts: 10,
            version_count: 2,
        }
    }
}

/// Band the placeholder scorer draws every field from, `[band_min, band_max)`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub band_min: f64,
    pub band_max: f64,
}

impl ScoringConfig {
    pub fn band(&self) -> Range<f64> {
        self.band_min..self.band_max
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            band_min: DEFAULT_BAND.start,
            band_max: DEFAULT_BAND.end,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            generation: GenerationConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self, ConfigError> {
        // An explicit path must load; no fallback
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let project_name = env!("CARGO_PKG_NAME");

        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Reject values that would make a job meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.max_attempts == 0 {
            return Err(ConfigError::Invalid("generation.max_attempts must be at least 1".into()));
        }
        if self.generation.version_count == 0 {
            return Err(ConfigError::Invalid("generation.version_count must be at least 1".into()));
        }
        if self.generation.min_chars == 0 {
            return Err(ConfigError::Invalid("generation.min_chars must be at least 1".into()));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::Invalid("llm.max_tokens must be at least 1".into()));
        }
        let ScoringConfig { band_min, band_max } = self.scoring;
        if !band_min.is_finite() || !band_max.is_finite() || band_min >= band_max {
            return Err(ConfigError::Invalid(format!(
                "scoring.band_min ({}) must be below scoring.band_max ({})",
                band_min, band_max
            )));
        }
        Ok(())
    }

    /// Read the provider API key from the configured environment variable
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey {
                env_var: self.llm.api_key_env.clone(),
            })
    }
}
