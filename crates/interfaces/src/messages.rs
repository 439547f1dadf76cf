//! Messages exchanged between a UI process and the background process.

use serde::{Deserialize, Serialize};
use tab_sorter_core::{ApplyReport, CountersSnapshot, GroupProposal, GroupingStrategy, Tab, TabId};
use tab_sorter_providers::ModelConfig;
use tab_sorter_tasks::JobSnapshot;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BackgroundRequest {
    StartCategorization {
        tabs: Vec<Tab>,
        config: ModelConfig,
    },
    GetCategorizationStatus,
    ResetCategorizationStatus,
    GetStrategy,
    ApplyCleanup {
        #[serde(rename = "tabIdsToClose", default)]
        tab_ids_to_close: Vec<TabId>,
        #[serde(default)]
        groups: Vec<GroupProposal>,
    },
    ListTabs,
    GetStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BackgroundResponse {
    Ack {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Status(JobSnapshot),
    Strategy {
        strategy: GroupingStrategy,
    },
    Applied {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        report: Option<ApplyReport>,
    },
    Tabs {
        tabs: Vec<Tab>,
    },
    Stats(CountersSnapshot),
}

impl BackgroundResponse {
    pub fn ok() -> Self {
        BackgroundResponse::Ack {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        BackgroundResponse::Ack {
            success: false,
            error: Some(error.into()),
        }
    }
}
