use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tab_sorter_core::{Counters, GroupProposal, Tab};
use tab_sorter_providers::{ClassificationProvider, ModelConfig, ProviderError, TabSummary};
use thiserror::Error;
use tokio::sync::Mutex;

pub const MISSING_KEY_MESSAGE: &str = "API key is not configured. Add one in settings.";

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Idle,
    Analyzing,
    Success,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Error)
    }
}

/// Coarse failure class, so a caller can tell "fix settings", "retry" and
/// "try another model" apart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobErrorKind {
    Configuration,
    Transport,
    Schema,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<GroupProposal>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<JobErrorKind>,
}

impl JobSnapshot {
    pub fn idle() -> Self {
        Self {
            status: JobStatus::Idle,
            result: None,
            error: None,
            error_kind: None,
        }
    }

    fn analyzing() -> Self {
        Self {
            status: JobStatus::Analyzing,
            ..Self::idle()
        }
    }

    fn success(groups: Vec<GroupProposal>) -> Self {
        Self {
            status: JobStatus::Success,
            result: Some(groups),
            ..Self::idle()
        }
    }

    fn failed(kind: JobErrorKind, message: String) -> Self {
        Self {
            status: JobStatus::Error,
            error: Some(message),
            error_kind: Some(kind),
            ..Self::idle()
        }
    }

    fn from_provider_error(error: &ProviderError) -> Self {
        match error {
            ProviderError::Configuration => {
                Self::failed(JobErrorKind::Configuration, MISSING_KEY_MESSAGE.to_string())
            }
            ProviderError::Transport(_) | ProviderError::Api(_) => {
                Self::failed(JobErrorKind::Transport, error.to_string())
            }
            ProviderError::Schema(_) | ProviderError::Parse(_) => Self::failed(
                JobErrorKind::Schema,
                format!("{}. Try a different model.", error),
            ),
        }
    }
}

impl Default for JobSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

struct JobSlot {
    snapshot: JobSnapshot,
    /// Bumped by every start and reset; a completion only lands if its
    /// generation is still current.
    generation: u64,
}

/// Single-slot runner for classification jobs.
///
/// At most one job is current. Starting a new job replaces the slot without
/// aborting the previous request; that request still runs to completion but
/// its result is discarded.
pub struct JobRunner {
    provider: Arc<dyn ClassificationProvider>,
    slot: Arc<Mutex<JobSlot>>,
    counters: Arc<Counters>,
}

impl JobRunner {
    pub fn new(provider: Arc<dyn ClassificationProvider>, counters: Arc<Counters>) -> Self {
        Self {
            provider,
            slot: Arc::new(Mutex::new(JobSlot {
                snapshot: JobSnapshot::idle(),
                generation: 0,
            })),
            counters,
        }
    }

    /// Starts classifying `tabs` in the background and returns immediately.
    pub async fn start_job(&self, tabs: &[Tab], config: ModelConfig) -> Result<(), JobError> {
        let mut slot = self.slot.lock().await;
        slot.generation += 1;

        if !config.has_credential() {
            slot.snapshot = JobSnapshot::from_provider_error(&ProviderError::Configuration);
            self.counters.inc_jobs_failed();
            tracing::warn!("Classification rejected: no API key configured");
            return Err(JobError::Configuration(MISSING_KEY_MESSAGE.to_string()));
        }

        let generation = slot.generation;
        slot.snapshot = JobSnapshot::analyzing();
        drop(slot);

        self.counters.inc_jobs_started();
        let summaries: Vec<TabSummary> = tabs.iter().map(TabSummary::from).collect();
        tracing::info!(
            "Started classification job {} ({} tabs, model {}, provider {})",
            generation,
            summaries.len(),
            config.model_id,
            self.provider.name()
        );

        let provider = self.provider.clone();
        let slot = self.slot.clone();
        let counters = self.counters.clone();
        tokio::spawn(async move {
            let outcome = provider.classify(&summaries, &config).await;

            let mut slot = slot.lock().await;
            if slot.generation != generation {
                tracing::debug!("Discarding result of superseded job {}", generation);
                return;
            }

            slot.snapshot = match outcome {
                Ok(groups) => {
                    tracing::info!("Job {} produced {} groups", generation, groups.len());
                    JobSnapshot::success(groups)
                }
                Err(e) => {
                    tracing::warn!("Job {} failed: {}", generation, e);
                    counters.inc_jobs_failed();
                    JobSnapshot::from_provider_error(&e)
                }
            };
        });

        Ok(())
    }

    pub async fn get_status(&self) -> JobSnapshot {
        self.slot.lock().await.snapshot.clone()
    }

    /// Returns the slot to idle. Any in-flight request is discarded on completion.
    pub async fn reset(&self) {
        let mut slot = self.slot.lock().await;
        slot.generation += 1;
        slot.snapshot = JobSnapshot::idle();
        tracing::debug!("Classification job slot reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tab_sorter_core::GroupColor;

    struct ScriptedProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ClassificationProvider for ScriptedProvider {
        async fn classify(
            &self,
            tabs: &[TabSummary],
            config: &ModelConfig,
        ) -> Result<Vec<GroupProposal>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match config.model_id.as_str() {
                "slow" => {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok(vec![GroupProposal::new(
                        "slow",
                        GroupColor::Grey,
                        tabs.iter().map(|t| t.id).collect(),
                    )])
                }
                "broken" => Err(ProviderError::Parse("expected value".to_string())),
                "offline" => Err(ProviderError::Transport("connection refused".to_string())),
                "overloaded" => Err(ProviderError::Api(
                    "500 Internal Server Error: upstream overloaded".to_string(),
                )),
                "chatty" => Err(ProviderError::Schema(
                    "missing field `groups`".to_string(),
                )),
                _ => Ok(vec![GroupProposal::new(
                    config.model_id.clone(),
                    GroupColor::Blue,
                    tabs.iter().map(|t| t.id).collect(),
                )]),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn runner() -> (JobRunner, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider {
            calls: AtomicUsize::new(0),
        });
        (JobRunner::new(provider.clone(), Counters::new()), provider)
    }

    fn tabs() -> Vec<Tab> {
        vec![Tab {
            id: 1,
            title: "Docs".to_string(),
            url: "https://docs.rs".to_string(),
            fav_icon_url: None,
            last_accessed: 0,
        }]
    }

    async fn settle(runner: &JobRunner) -> JobSnapshot {
        for _ in 0..100 {
            let snapshot = runner.get_status().await;
            if snapshot.status.is_terminal() {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job did not settle");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let (runner, provider) = runner();

        let err = runner
            .start_job(&tabs(), ModelConfig::new("", "gpt-4o-mini"))
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::Configuration(_)));
        let status = runner.get_status().await;
        assert_eq!(status.status, JobStatus::Error);
        assert_eq!(status.error_kind, Some(JobErrorKind::Configuration));
        assert!(status.error.unwrap().contains("API key"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_then_reset() {
        let (runner, _) = runner();
        assert_eq!(runner.get_status().await.status, JobStatus::Idle);

        runner
            .start_job(&tabs(), ModelConfig::new("key", "fast"))
            .await
            .unwrap();
        let done = settle(&runner).await;
        assert_eq!(done.status, JobStatus::Success);
        assert_eq!(done.result.unwrap()[0].tab_ids, vec![1]);

        runner.reset().await;
        assert_eq!(runner.get_status().await, JobSnapshot::idle());
    }

    #[tokio::test]
    async fn test_error_kinds() {
        let (runner, _) = runner();

        runner
            .start_job(&tabs(), ModelConfig::new("key", "broken"))
            .await
            .unwrap();
        let broken = settle(&runner).await;
        assert_eq!(broken.error_kind, Some(JobErrorKind::Schema));
        assert!(broken.error.unwrap().contains("different model"));

        runner
            .start_job(&tabs(), ModelConfig::new("key", "offline"))
            .await
            .unwrap();
        let offline = settle(&runner).await;
        assert_eq!(offline.error_kind, Some(JobErrorKind::Transport));
        assert!(offline.error.unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_api_and_schema_failures_surface_their_kind() {
        let (runner, provider) = runner();

        runner
            .start_job(&tabs(), ModelConfig::new("key", "overloaded"))
            .await
            .unwrap();
        let overloaded = settle(&runner).await;
        assert_eq!(overloaded.status, JobStatus::Error);
        assert_eq!(overloaded.error_kind, Some(JobErrorKind::Transport));
        assert_eq!(
            overloaded.error.unwrap(),
            "API error: 500 Internal Server Error: upstream overloaded"
        );
        assert!(overloaded.result.is_none());

        runner.reset().await;
        runner
            .start_job(&tabs(), ModelConfig::new("key", "chatty"))
            .await
            .unwrap();
        let chatty = settle(&runner).await;
        assert_eq!(chatty.status, JobStatus::Error);
        assert_eq!(chatty.error_kind, Some(JobErrorKind::Schema));
        let message = chatty.error.unwrap();
        assert!(message.contains("missing field `groups`"));
        assert!(message.ends_with("Try a different model."));

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_new_job_clears_previous_result() {
        let (runner, _) = runner();
        runner
            .start_job(&tabs(), ModelConfig::new("key", "fast"))
            .await
            .unwrap();
        settle(&runner).await;

        runner
            .start_job(&tabs(), ModelConfig::new("key", "slow"))
            .await
            .unwrap();
        let snapshot = runner.get_status().await;
        assert_eq!(snapshot.status, JobStatus::Analyzing);
        assert!(snapshot.result.is_none());
    }

    #[tokio::test]
    async fn test_superseded_completion_is_discarded() {
        let (runner, provider) = runner();
        runner
            .start_job(&tabs(), ModelConfig::new("key", "slow"))
            .await
            .unwrap();
        runner
            .start_job(&tabs(), ModelConfig::new("key", "second"))
            .await
            .unwrap();

        let done = settle(&runner).await;
        assert_eq!(done.result.as_ref().unwrap()[0].name, "second");

        tokio::time::sleep(Duration::from_millis(200)).await;
        let later = runner.get_status().await;
        assert_eq!(later.result.unwrap()[0].name, "second");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reset_during_flight_stays_idle() {
        let (runner, _) = runner();
        runner
            .start_job(&tabs(), ModelConfig::new("key", "slow"))
            .await
            .unwrap();
        runner.reset().await;

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(runner.get_status().await.status, JobStatus::Idle);
    }
}
