//! Version Orchestrator implementation
//!
//! VersionOrchestrator runs one acceptance loop per requested version
//! concurrently, waits for all of them, scores each text and returns the
//! results ordered by version index.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::domain::{LoopOutcome, RewriteRequest, VersionResult};
use crate::error::{Result, RewriteError};
use crate::llm::GenerationClient;
use crate::runner::{AcceptanceLoop, AcceptanceLoopConfig};
use crate::scoring::Scorer;

/// Runs the versions of a single job.
///
/// Create one per job: cancelling it cancels that job only.
pub struct VersionOrchestrator<C, S>
where
    C: GenerationClient + ?Sized + 'static,
    S: Scorer + ?Sized,
{
    runner: Arc<AcceptanceLoop<C>>,
    scorer: Arc<S>,
    cancel: CancellationToken,
    versions: Mutex<HashMap<u32, CancellationToken>>,
}

impl<C, S> VersionOrchestrator<C, S>
where
    C: GenerationClient + ?Sized + 'static,
    S: Scorer + ?Sized,
{
    pub fn new(client: Arc<C>, scorer: Arc<S>, config: AcceptanceLoopConfig) -> Self {
        Self {
            runner: Arc::new(AcceptanceLoop::new(client, config)),
            scorer,
            cancel: CancellationToken::new(),
            versions: Mutex::new(HashMap::new()),
        }
    }

    /// Cancel the whole job. `produce_versions` returns `Cancelled`.
    pub fn cancel(&self) {
        log::info!("Cancelling job");
        self.cancel.cancel();
    }

    /// Cancel one running version. It finishes with its fallback text.
    ///
    /// Returns false if no version with that index is running.
    pub fn cancel_version(&self, version_index: u32) -> bool {
        let versions = self.versions.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match versions.get(&version_index) {
            Some(token) => {
                log::info!("Cancelling version {}", version_index);
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Indices of versions currently running
    pub fn running_versions(&self) -> Vec<u32> {
        let versions = self.versions.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut indices: Vec<u32> = versions.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// Produce `version_count` versions of the request.
    ///
    /// All versions run concurrently. The first non-retryable failure aborts
    /// the others and is returned; no partial results are produced.
    pub async fn produce_versions(&self, request: &RewriteRequest, version_count: u32) -> Result<Vec<VersionResult>> {
        if version_count == 0 {
            return Err(RewriteError::InvalidVersionCount);
        }
        if self.cancel.is_cancelled() {
            return Err(RewriteError::Cancelled);
        }

        log::info!("Producing {} version(s)", version_count);
        let outcomes = self.run_versions(request, version_count).await;
        self.clear_versions();
        let mut outcomes = outcomes?;

        if self.cancel.is_cancelled() {
            return Err(RewriteError::Cancelled);
        }

        outcomes.sort_by_key(|(index, _)| *index);

        let mut results = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes {
            let score = self.scorer.score(request.original_text(), &outcome.text)?;
            log::debug!("Version {} scored {:.1}", index, score.total);
            results.push(VersionResult::from_outcome(index, outcome, score));
        }
        Ok(results)
    }

    async fn run_versions(&self, request: &RewriteRequest, version_count: u32) -> Result<Vec<(u32, LoopOutcome)>> {
        let request = Arc::new(request.clone());
        let mut tasks = JoinSet::new();

        {
            let mut versions = self.versions.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            for index in 1..=version_count {
                let token = self.cancel.child_token();
                versions.insert(index, token.clone());

                let runner = Arc::clone(&self.runner);
                let request = Arc::clone(&request);
                tasks.spawn(async move {
                    let outcome = runner.run(&request, index, &token).await;
                    (index, outcome)
                });
            }
        }

        let mut outcomes = Vec::with_capacity(version_count as usize);
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    log::error!("Version task failed: {}", e);
                    tasks.abort_all();
                    return Err(RewriteError::TaskFailed(e.to_string()));
                }
            };

            match outcome {
                Ok(outcome) => {
                    self.forget_version(index);
                    outcomes.push((index, outcome));
                }
                Err(e) => {
                    log::error!("Version {} failed, aborting remaining versions: {}", index, e);
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        Ok(outcomes)
    }

    fn forget_version(&self, version_index: u32) {
        let mut versions = self.versions.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        versions.remove(&version_index);
    }

    fn clear_versions(&self) {
        let mut versions = self.versions.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        versions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScoreVector;
    use crate::llm::{MockGenerationClient, ProviderError};
    use crate::scoring::{FixedScorer, ScorerError};

    fn config() -> AcceptanceLoopConfig {
        AcceptanceLoopConfig {
            min_chars: 20,
            max_attempts: 4,
        }
    }

    fn request() -> RewriteRequest {
        RewriteRequest::new("Original article").unwrap()
    }

    struct FailingScorer;

    impl Scorer for FailingScorer {
        fn score(&self, _original: &str, _rewritten: &str) -> std::result::Result<ScoreVector, ScorerError> {
            Err(ScorerError::Failed("scoring backend down".into()))
        }
    }

    #[tokio::test]
    async fn test_results_ordered_by_index() {
        let mock = Arc::new(MockGenerationClient::from_fn(|call| {
            let version = if call.prompt.contains("as version 1 ") { 1 } else { 2 };
            Ok(format!("version {} {}", version, "z".repeat(30)))
        }));
        let orchestrator = VersionOrchestrator::new(mock, Arc::new(FixedScorer::default()), config());

        let results = orchestrator.produce_versions(&request(), 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].version_index, 1);
        assert_eq!(results[1].version_index, 2);
        assert!(results[0].text.starts_with("version 1"));
        assert!(results[1].text.starts_with("version 2"));
        assert!(results.iter().all(|r| r.accepted));
        assert!(orchestrator.running_versions().is_empty());
    }

    #[tokio::test]
    async fn test_single_version() {
        let mock = Arc::new(MockGenerationClient::with_text("a".repeat(25)));
        let orchestrator = VersionOrchestrator::new(mock.clone(), Arc::new(FixedScorer::default()), config());

        let results = orchestrator.produce_versions(&request(), 1).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_versions_rejected() {
        let mock = Arc::new(MockGenerationClient::with_text("text"));
        let orchestrator = VersionOrchestrator::new(mock.clone(), Arc::new(FixedScorer::default()), config());

        let err = orchestrator.produce_versions(&request(), 0).await.unwrap_err();

        assert!(matches!(err, RewriteError::InvalidVersionCount));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_scores_attached() {
        let mock = Arc::new(MockGenerationClient::with_text("b".repeat(25)));
        let scorer = Arc::new(FixedScorer::new(ScoreVector::uniform(88.0)));
        let orchestrator = VersionOrchestrator::new(mock, scorer, config());

        let results = orchestrator.produce_versions(&request(), 3).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.score.total == 88.0));
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_job() {
        let mock = Arc::new(MockGenerationClient::from_fn(|call| {
            if call.prompt.contains("as version 2 ") {
                Err(ProviderError::Unauthorized {
                    status: 401,
                    message: "invalid key".into(),
                })
            } else {
                Ok("short".to_string())
            }
        }));
        let orchestrator = VersionOrchestrator::new(mock, Arc::new(FixedScorer::default()), config());

        let err = orchestrator.produce_versions(&request(), 2).await.unwrap_err();

        assert!(matches!(err, RewriteError::Provider(ProviderError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_scorer_error_fails_job() {
        let mock = Arc::new(MockGenerationClient::with_text("c".repeat(25)));
        let orchestrator = VersionOrchestrator::new(mock, Arc::new(FailingScorer), config());

        let err = orchestrator.produce_versions(&request(), 2).await.unwrap_err();

        assert!(matches!(err, RewriteError::Scorer(_)));
    }

    #[tokio::test]
    async fn test_cancelled_job_returns_cancelled() {
        let mock = Arc::new(MockGenerationClient::with_text("d".repeat(25)));
        let orchestrator = VersionOrchestrator::new(mock.clone(), Arc::new(FixedScorer::default()), config());
        orchestrator.cancel();

        let err = orchestrator.produce_versions(&request(), 2).await.unwrap_err();

        assert!(matches!(err, RewriteError::Cancelled));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_unknown_version() {
        let mock = Arc::new(MockGenerationClient::with_text("e"));
        let orchestrator = VersionOrchestrator::new(mock, Arc::new(FixedScorer::default()), config());
        assert!(!orchestrator.cancel_version(1));
    }

    #[tokio::test]
    async fn test_cancel_one_version_keeps_others() {
        let mock = Arc::new(MockGenerationClient::from_fn(|call| {
            if call.prompt.contains("as version 1 ") {
                Ok("f".repeat(25))
            } else {
                Ok("short".to_string())
            }
        }));
        let orchestrator = Arc::new(VersionOrchestrator::new(
            mock.clone(),
            Arc::new(FixedScorer::default()),
            AcceptanceLoopConfig {
                min_chars: 20,
                max_attempts: u32::MAX,
            },
        ));

        let job = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.produce_versions(&request(), 2).await })
        };

        // Version 2 never reaches the threshold; let it record one attempt first
        while !mock.prompts().iter().any(|p| p.contains("as version 2 ")) {
            tokio::task::yield_now().await;
        }
        assert!(orchestrator.cancel_version(2));

        let results = job.await.unwrap().unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].accepted);
        assert!(!results[1].accepted);
        assert_eq!(results[1].text, "short");
    }
}
