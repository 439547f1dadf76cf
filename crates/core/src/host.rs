//! Browser host abstraction and the tab source built on it.

use crate::palette::NativeColor;
use crate::types::{GroupId, HostTab, Tab, TabId, DEFAULT_TAB_TITLE};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Tab not found: {0}")]
    TabNotFound(TabId),
    #[error("Host capability unavailable: {0}")]
    Unavailable(String),
    #[error("Host operation failed: {0}")]
    Operation(String),
}

impl HostError {
    pub fn is_tab_not_found(&self) -> bool {
        matches!(self, HostError::TabNotFound(_))
    }
}

/// Tab primitives exposed by the browser, scoped to the current window.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// All tabs of the current window, unfiltered.
    async fn query_current_window(&self) -> Result<Vec<HostTab>, HostError>;

    async fn get_tab(&self, tab_id: TabId) -> Result<HostTab, HostError>;

    async fn remove_tab(&self, tab_id: TabId) -> Result<(), HostError>;

    /// Whether the native tab-group primitive exists at all.
    fn supports_native_groups(&self) -> bool;

    async fn group_tabs(&self, tab_ids: &[TabId]) -> Result<GroupId, HostError>;

    async fn update_group(
        &self,
        group_id: GroupId,
        title: &str,
        color: NativeColor,
    ) -> Result<(), HostError>;

    /// Replaces the tab's metadata blob.
    async fn update_ext_data(&self, tab_id: TabId, ext_data: &str) -> Result<(), HostError>;
}

/// Excludes pinned tabs and tabs whose URL is empty or internal.
#[derive(Debug, Clone, Default)]
pub struct TabFilter {
    internal_prefixes: Vec<String>,
}

impl TabFilter {
    pub fn new(internal_prefixes: Vec<String>) -> Self {
        Self { internal_prefixes }
    }

    pub fn is_internal(&self, url: &str) -> bool {
        self.internal_prefixes
            .iter()
            .any(|prefix| url.starts_with(prefix.as_str()))
    }

    /// Converts a host record into a [`Tab`], or `None` if it is excluded.
    /// `now_ms` stands in for a missing last-accessed time.
    pub fn accept(&self, raw: HostTab, now_ms: i64) -> Option<Tab> {
        if raw.pinned {
            return None;
        }
        let url = raw.url.filter(|url| !url.is_empty())?;
        if self.is_internal(&url) {
            return None;
        }

        let title = raw
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TAB_TITLE.to_string());

        Some(Tab {
            id: raw.id,
            title,
            url,
            fav_icon_url: raw.fav_icon_url,
            last_accessed: raw.last_accessed.unwrap_or(now_ms),
        })
    }
}

/// Lists the current window's tabs through `filter`.
pub async fn list_tabs(
    host: &dyn TabHost,
    filter: &TabFilter,
    now_ms: i64,
) -> Result<Vec<Tab>, HostError> {
    let raw = host.query_current_window().await?;
    let total = raw.len();
    let tabs: Vec<Tab> = raw
        .into_iter()
        .filter_map(|tab| filter.accept(tab, now_ms))
        .collect();
    tracing::debug!("Listed {} of {} tabs in current window", tabs.len(), total);
    Ok(tabs)
}
