//! Long-lived owner of the strategy cache and the job slot.

use crate::messages::{BackgroundRequest, BackgroundResponse};
use crate::traits::{MessageChannel, ProtocolError};
use async_trait::async_trait;
use std::sync::Arc;
use tab_sorter_core::{
    list_tabs, now_ms, ApplyEngine, Counters, StrategyDetector, TabFilter, TabHost,
};
use tab_sorter_providers::ClassificationProvider;
use tab_sorter_tasks::JobRunner;

pub struct BackgroundService {
    host: Arc<dyn TabHost>,
    detector: Arc<StrategyDetector>,
    jobs: JobRunner,
    engine: ApplyEngine,
    filter: TabFilter,
    counters: Arc<Counters>,
}

impl BackgroundService {
    pub fn new(
        host: Arc<dyn TabHost>,
        provider: Arc<dyn ClassificationProvider>,
        filter: TabFilter,
    ) -> Self {
        let detector = Arc::new(StrategyDetector::new());
        let counters = Counters::new();
        Self {
            jobs: JobRunner::new(provider, counters.clone()),
            engine: ApplyEngine::new(host.clone(), detector.clone(), counters.clone()),
            host,
            detector,
            filter,
            counters,
        }
    }

    pub async fn handle(&self, request: BackgroundRequest) -> BackgroundResponse {
        match request {
            BackgroundRequest::StartCategorization { tabs, config } => {
                match self.jobs.start_job(&tabs, config).await {
                    Ok(()) => BackgroundResponse::ok(),
                    Err(e) => BackgroundResponse::failed(e.to_string()),
                }
            }
            BackgroundRequest::GetCategorizationStatus => {
                BackgroundResponse::Status(self.jobs.get_status().await)
            }
            BackgroundRequest::ResetCategorizationStatus => {
                self.jobs.reset().await;
                BackgroundResponse::ok()
            }
            BackgroundRequest::GetStrategy => BackgroundResponse::Strategy {
                strategy: self.detector.detect(self.host.as_ref()).await,
            },
            BackgroundRequest::ApplyCleanup {
                tab_ids_to_close,
                groups,
            } => match self.engine.apply_cleanup(&tab_ids_to_close, groups).await {
                Ok(report) => BackgroundResponse::Applied {
                    success: true,
                    error: None,
                    report: Some(report),
                },
                Err(e) => {
                    tracing::warn!("Apply failed: {}", e);
                    BackgroundResponse::Applied {
                        success: false,
                        error: Some(e.to_string()),
                        report: None,
                    }
                }
            },
            BackgroundRequest::ListTabs => {
                match list_tabs(self.host.as_ref(), &self.filter, now_ms()).await {
                    Ok(tabs) => BackgroundResponse::Tabs { tabs },
                    Err(e) => BackgroundResponse::failed(e.to_string()),
                }
            }
            BackgroundRequest::GetStats => BackgroundResponse::Stats(self.counters.snapshot()),
        }
    }

    /// Decodes a serialized request, handles it and encodes the response.
    pub async fn handle_json(&self, raw: &str) -> Result<String, ProtocolError> {
        let request: BackgroundRequest = serde_json::from_str(raw)?;
        let response = self.handle(request).await;
        Ok(serde_json::to_string(&response)?)
    }
}

#[async_trait]
impl MessageChannel for BackgroundService {
    async fn send(&self, request: BackgroundRequest) -> Result<BackgroundResponse, ProtocolError> {
        Ok(self.handle(request).await)
    }
}
