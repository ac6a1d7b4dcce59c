//! Rewrite service - the entry point callers submit jobs to.
//!
//! Owns the shared generation client and scorer. Every job gets its own
//! VersionOrchestrator so cancelling one job never touches another.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::config::{Config, ConfigError, GenerationConfig};
use crate::domain::{RewriteRequest, VersionResult};
use crate::error::{Result, RewriteError};
use crate::llm::{AnthropicClient, AnthropicConfig, GenerationClient};
use crate::manager::VersionOrchestrator;
use crate::prompt::PromptBuilder;
use crate::runner::AcceptanceLoopConfig;
use crate::scoring::{RandomBandScorer, Scorer};

/// Caller-facing failure of a rewrite job
#[derive(Debug, Error)]
#[error("content rewriting failed: {0}")]
pub struct JobError(#[from] pub RewriteError);

impl JobError {
    /// The underlying failure
    pub fn kind(&self) -> &RewriteError {
        &self.0
    }
}

pub struct RewriteService<C, S>
where
    C: GenerationClient + ?Sized + 'static,
    S: Scorer + ?Sized,
{
    client: Arc<C>,
    scorer: Arc<S>,
    generation: GenerationConfig,
}

impl RewriteService<AnthropicClient, RandomBandScorer> {
    /// Build the production service: Anthropic client plus band scorer
    pub fn from_config(config: &Config) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let api_key = config.api_key()?;
        let client = AnthropicClient::with_api_key(api_key, AnthropicConfig::from(&config.llm))?;
        let scorer = band_scorer(config)?;
        log::info!("Rewrite service using model {}", config.llm.model);

        Ok(Self::new(
            Arc::new(client),
            Arc::new(scorer),
            config.generation.clone(),
        ))
    }
}

fn band_scorer(config: &Config) -> std::result::Result<RandomBandScorer, ConfigError> {
    RandomBandScorer::new(config.scoring.band()).map_err(|e| ConfigError::Invalid(e.to_string()))
}

impl<C, S> RewriteService<C, S>
where
    C: GenerationClient + ?Sized + 'static,
    S: Scorer + ?Sized,
{
    pub fn new(client: Arc<C>, scorer: Arc<S>, generation: GenerationConfig) -> Self {
        Self {
            client,
            scorer,
            generation,
        }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn generation(&self) -> &GenerationConfig {
        &self.generation
    }

    /// A fresh orchestrator for one job
    pub fn orchestrator(&self) -> VersionOrchestrator<C, S> {
        VersionOrchestrator::new(
            Arc::clone(&self.client),
            Arc::clone(&self.scorer),
            AcceptanceLoopConfig::from(&self.generation),
        )
    }

    /// Rewrite with the configured number of versions
    pub async fn submit_rewrite_job(&self, request: &RewriteRequest) -> std::result::Result<Vec<VersionResult>, JobError> {
        self.submit_with_versions(request, self.generation.version_count)
            .await
    }

    pub async fn submit_with_versions(
        &self,
        request: &RewriteRequest,
        version_count: u32,
    ) -> std::result::Result<Vec<VersionResult>, JobError> {
        let job = self.orchestrator();
        self.run_job(&job, request, version_count).await
    }

    /// Run a job on an orchestrator the caller holds, so it can cancel it
    pub async fn run_job(
        &self,
        job: &VersionOrchestrator<C, S>,
        request: &RewriteRequest,
        version_count: u32,
    ) -> std::result::Result<Vec<VersionResult>, JobError> {
        let started = Instant::now();
        log::info!(
            "Rewrite job started: {} chars, {} keyword(s), {} image(s), {} version(s)",
            request.original_text().chars().count(),
            request.keywords().len(),
            request.images().len(),
            version_count
        );

        match job.produce_versions(request, version_count).await {
            Ok(results) => {
                let accepted = results.iter().filter(|r| r.accepted).count();
                log::info!(
                    "Rewrite job finished in {:?}: {}/{} version(s) accepted",
                    started.elapsed(),
                    accepted,
                    results.len()
                );
                Ok(results)
            }
            Err(e) => {
                log::error!("Rewrite job failed after {:?}: {}", started.elapsed(), e);
                Err(JobError(e))
            }
        }
    }

    /// The exact prompt version `version_index` would send
    pub fn preview_prompt(&self, request: &RewriteRequest, version_index: u32) -> Result<String> {
        if version_index == 0 {
            return Err(RewriteError::InvalidVersionCount);
        }
        PromptBuilder::new(self.generation.min_chars).build(request, version_index)
    }
}
