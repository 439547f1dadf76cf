//! In-memory [`TabHost`] backed by a serializable window snapshot.

use crate::host::{HostError, TabHost};
use crate::palette::NativeColor;
use crate::types::{GroupId, HostTab, TabId};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NativeGroup {
    pub id: GroupId,
    pub title: String,
    pub color: NativeColor,
    pub tab_ids: Vec<TabId>,
}

/// Serialized form of a window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    #[serde(default)]
    pub native_groups: bool,
    #[serde(default)]
    pub tabs: Vec<HostTab>,
    #[serde(default)]
    pub groups: Vec<NativeGroup>,
}

pub struct MemoryHost {
    window: Mutex<WindowSnapshot>,
    fail_queries: AtomicBool,
    queries: AtomicUsize,
    removals: AtomicUsize,
}

impl MemoryHost {
    pub fn new(native_groups: bool, tabs: Vec<HostTab>) -> Self {
        Self::from_snapshot(WindowSnapshot {
            native_groups,
            tabs,
            groups: Vec::new(),
        })
    }

    pub fn from_snapshot(snapshot: WindowSnapshot) -> Self {
        Self {
            window: Mutex::new(snapshot),
            fail_queries: AtomicBool::new(false),
            queries: AtomicUsize::new(0),
            removals: AtomicUsize::new(0),
        }
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        self.window.lock().clone()
    }

    pub fn tab(&self, tab_id: TabId) -> Option<HostTab> {
        self.window
            .lock()
            .tabs
            .iter()
            .find(|tab| tab.id == tab_id)
            .cloned()
    }

    pub fn groups(&self) -> Vec<NativeGroup> {
        self.window.lock().groups.clone()
    }

    /// Closes a tab outside of any engine call, as a user would.
    pub fn close_out_of_band(&self, tab_id: TabId) {
        self.window.lock().tabs.retain(|tab| tab.id != tab_id);
    }

    /// Makes window queries fail until reset.
    pub fn set_query_failure(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn removal_count(&self) -> usize {
        self.removals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TabHost for MemoryHost {
    async fn query_current_window(&self) -> Result<Vec<HostTab>, HostError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(HostError::Operation("tab query rejected".to_string()));
        }
        Ok(self.window.lock().tabs.clone())
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<HostTab, HostError> {
        self.tab(tab_id).ok_or(HostError::TabNotFound(tab_id))
    }

    async fn remove_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        self.removals.fetch_add(1, Ordering::SeqCst);
        let mut window = self.window.lock();
        let before = window.tabs.len();
        window.tabs.retain(|tab| tab.id != tab_id);
        if window.tabs.len() == before {
            return Err(HostError::TabNotFound(tab_id));
        }
        for group in &mut window.groups {
            group.tab_ids.retain(|id| *id != tab_id);
        }
        window.groups.retain(|group| !group.tab_ids.is_empty());
        Ok(())
    }

    fn supports_native_groups(&self) -> bool {
        self.window.lock().native_groups
    }

    async fn group_tabs(&self, tab_ids: &[TabId]) -> Result<GroupId, HostError> {
        let mut window = self.window.lock();
        if !window.native_groups {
            return Err(HostError::Unavailable("tab groups".to_string()));
        }
        if let Some(missing) = tab_ids
            .iter()
            .find(|id| !window.tabs.iter().any(|tab| tab.id == **id))
        {
            return Err(HostError::TabNotFound(*missing));
        }

        let group_id = window.groups.iter().map(|g| g.id).max().unwrap_or(0) + 1;
        for tab in window.tabs.iter_mut().filter(|tab| tab_ids.contains(&tab.id)) {
            tab.group_id = Some(group_id);
        }
        for group in &mut window.groups {
            group.tab_ids.retain(|id| !tab_ids.contains(id));
        }
        window.groups.retain(|group| !group.tab_ids.is_empty());
        window.groups.push(NativeGroup {
            id: group_id,
            title: String::new(),
            color: NativeColor::Grey,
            tab_ids: tab_ids.to_vec(),
        });
        Ok(group_id)
    }

    async fn update_group(
        &self,
        group_id: GroupId,
        title: &str,
        color: NativeColor,
    ) -> Result<(), HostError> {
        let mut window = self.window.lock();
        let group = window
            .groups
            .iter_mut()
            .find(|group| group.id == group_id)
            .ok_or_else(|| HostError::Operation(format!("No group with id {}", group_id)))?;
        group.title = title.to_string();
        group.color = color;
        Ok(())
    }

    async fn update_ext_data(&self, tab_id: TabId, ext_data: &str) -> Result<(), HostError> {
        let mut window = self.window.lock();
        let tab = window
            .tabs
            .iter_mut()
            .find(|tab| tab.id == tab_id)
            .ok_or(HostError::TabNotFound(tab_id))?;
        tab.ext_data = Some(ext_data.to_string());
        Ok(())
    }
}
