use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tab_sorter_core::{GroupProposal, Tab, TabId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API key is not configured")]
    Configuration,
    #[error("HTTP error: {0}")]
    Transport(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Response did not match the grouping schema: {0}")]
    Schema(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Schema and parse failures point at the model, not the network.
    pub fn is_model_output(&self) -> bool {
        matches!(self, ProviderError::Schema(_) | ProviderError::Parse(_))
    }
}

/// Credential and model selection for one classification request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub api_key: String,
    pub model_id: String,
}

impl ModelConfig {
    pub fn new(api_key: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_id: model_id.into(),
        }
    }

    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Compact tab form sent to the model. The favicon is left out on purpose.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TabSummary {
    pub id: TabId,
    pub title: String,
    pub url: String,
}

impl From<&Tab> for TabSummary {
    fn from(tab: &Tab) -> Self {
        Self {
            id: tab.id,
            title: tab.title.clone(),
            url: tab.url.clone(),
        }
    }
}

#[async_trait]
pub trait ClassificationProvider: Send + Sync {
    async fn classify(
        &self,
        tabs: &[TabSummary],
        config: &ModelConfig,
    ) -> Result<Vec<GroupProposal>, ProviderError>;

    fn name(&self) -> &str;
}
