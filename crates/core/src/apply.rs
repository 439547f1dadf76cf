//! Closes tabs and applies group proposals with the host's grouping strategy.

use crate::host::{HostError, TabHost};
use crate::metrics::Counters;
use crate::palette::{native_color, stack_color};
use crate::strategy::StrategyDetector;
use crate::types::{prune_proposals, GroupProposal, GroupingStrategy, TabId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

pub const STACK_ID_KEY: &str = "group";
pub const STACK_TITLE_KEY: &str = "fixedGroupTitle";
pub const STACK_COLOR_KEY: &str = "groupColor";

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("Tab grouping is not supported in this browser")]
    Unsupported,
    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

/// What an apply call actually did.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub closed: Vec<TabId>,
    /// Tabs that were already gone when closing or grouping reached them.
    pub skipped: Vec<TabId>,
    pub groups_applied: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<GroupingStrategy>,
}

pub struct ApplyEngine {
    host: Arc<dyn TabHost>,
    detector: Arc<StrategyDetector>,
    counters: Arc<Counters>,
}

impl ApplyEngine {
    pub fn new(
        host: Arc<dyn TabHost>,
        detector: Arc<StrategyDetector>,
        counters: Arc<Counters>,
    ) -> Self {
        Self {
            host,
            detector,
            counters,
        }
    }

    /// Closes `tab_ids_to_close`, then groups what is left of `groups`.
    ///
    /// The strategy is resolved before anything is closed so that an
    /// unsupported host rejects a grouping request without side effects.
    pub async fn apply_cleanup(
        &self,
        tab_ids_to_close: &[TabId],
        groups: Vec<GroupProposal>,
    ) -> Result<ApplyReport, ApplyError> {
        let groups = prune_proposals(groups, tab_ids_to_close);

        let strategy = if groups.is_empty() {
            None
        } else {
            match self.detector.detect(self.host.as_ref()).await {
                GroupingStrategy::Unsupported => return Err(ApplyError::Unsupported),
                strategy => Some(strategy),
            }
        };

        let mut report = ApplyReport {
            strategy,
            ..Default::default()
        };

        self.close_tabs(tab_ids_to_close, &mut report).await?;

        match strategy {
            None => {}
            Some(GroupingStrategy::NativeGroups) => self.apply_native(&groups, &mut report).await?,
            Some(GroupingStrategy::MetadataStacks) => {
                self.apply_stacks(&groups, &mut report).await?
            }
            Some(GroupingStrategy::Unsupported) => return Err(ApplyError::Unsupported),
        }

        tracing::info!(
            "Applied cleanup: {} closed, {} groups, {} skipped",
            report.closed.len(),
            report.groups_applied,
            report.skipped.len()
        );
        Ok(report)
    }

    async fn close_tabs(
        &self,
        tab_ids: &[TabId],
        report: &mut ApplyReport,
    ) -> Result<(), ApplyError> {
        for &tab_id in tab_ids {
            match self.host.remove_tab(tab_id).await {
                Ok(()) => {
                    self.counters.inc_tabs_closed();
                    report.closed.push(tab_id);
                }
                Err(e) if e.is_tab_not_found() => {
                    tracing::warn!("Tab {} already closed, skipping", tab_id);
                    self.counters.inc_tabs_skipped();
                    report.skipped.push(tab_id);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    async fn apply_native(
        &self,
        groups: &[GroupProposal],
        report: &mut ApplyReport,
    ) -> Result<(), ApplyError> {
        // Proposals may reference tabs the user closed while reviewing.
        let existing: HashSet<TabId> = self
            .host
            .query_current_window()
            .await?
            .into_iter()
            .map(|tab| tab.id)
            .collect();

        for group in groups {
            let (present, missing): (Vec<TabId>, Vec<TabId>) = group
                .tab_ids
                .iter()
                .copied()
                .partition(|id| existing.contains(id));

            for tab_id in missing {
                tracing::warn!("Tab {} vanished before grouping '{}'", tab_id, group.name);
                self.counters.inc_tabs_skipped();
                report.skipped.push(tab_id);
            }
            if present.is_empty() {
                tracing::debug!("Skipping empty group '{}'", group.name);
                continue;
            }

            let group_id = self.host.group_tabs(&present).await?;
            self.host
                .update_group(group_id, &group.name, native_color(group.color))
                .await?;
            self.counters.inc_groups_applied();
            report.groups_applied += 1;
        }
        Ok(())
    }

    async fn apply_stacks(
        &self,
        groups: &[GroupProposal],
        report: &mut ApplyReport,
    ) -> Result<(), ApplyError> {
        for group in groups {
            let stack_id = uuid::Uuid::new_v4().to_string();
            let mut written = 0usize;

            for &tab_id in &group.tab_ids {
                match self.write_stack_entry(tab_id, &stack_id, group).await {
                    Ok(()) => written += 1,
                    Err(e) if e.is_tab_not_found() => {
                        tracing::warn!("Tab {} vanished before stacking '{}'", tab_id, group.name);
                        self.counters.inc_tabs_skipped();
                        report.skipped.push(tab_id);
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            if written > 0 {
                tracing::debug!("Stacked {} tabs into '{}' ({})", written, group.name, stack_id);
                self.counters.inc_groups_applied();
                report.groups_applied += 1;
            }
        }
        Ok(())
    }

    async fn write_stack_entry(
        &self,
        tab_id: TabId,
        stack_id: &str,
        group: &GroupProposal,
    ) -> Result<(), HostError> {
        let tab = self.host.get_tab(tab_id).await?;
        let merged = merge_stack_metadata(tab.ext_data.as_deref(), stack_id, group);
        self.host.update_ext_data(tab_id, &merged).await
    }
}

/// Merges stack fields into an existing metadata blob, keeping its other keys.
/// A missing or unparsable blob is treated as empty.
pub fn merge_stack_metadata(existing: Option<&str>, stack_id: &str, group: &GroupProposal) -> String {
    let mut data = existing
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .and_then(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_else(Map::new);

    data.insert(STACK_ID_KEY.to_string(), Value::String(stack_id.to_string()));
    data.insert(STACK_TITLE_KEY.to_string(), Value::String(group.name.clone()));
    data.insert(
        STACK_COLOR_KEY.to_string(),
        Value::String(stack_color(group.color).to_string()),
    );

    Value::Object(data).to_string()
}
