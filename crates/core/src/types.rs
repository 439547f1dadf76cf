use serde::{Deserialize, Deserializer, Serialize};

/// Session-scoped tab handle assigned by the browser.
pub type TabId = i64;

/// Handle of a native tab group.
pub type GroupId = i64;

pub const DEFAULT_TAB_TITLE: &str = "Untitled";

/// One open tab as listed by the tab source, after filtering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub last_accessed: i64,
}

/// Tab record exactly as the host reports it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HostTab {
    pub id: TabId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub fav_icon_url: Option<String>,
    /// Hosts report this as a float; the fraction is dropped.
    #[serde(default, deserialize_with = "deserialize_millis")]
    pub last_accessed: Option<i64>,
    #[serde(default)]
    pub pinned: bool,
    /// Host-specific per-tab metadata blob (JSON text) used for tab stacks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis: Option<f64> = Option::deserialize(deserializer)?;
    Ok(millis.filter(|ms| ms.is_finite()).map(|ms| ms.trunc() as i64))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupReason {
    Stale,
    Duplicate,
    StaleAndDuplicate,
}

impl CleanupReason {
    pub fn is_duplicate(self) -> bool {
        matches!(self, Self::Duplicate | Self::StaleAndDuplicate)
    }

    pub fn is_stale(self) -> bool {
        matches!(self, Self::Stale | Self::StaleAndDuplicate)
    }
}

/// Recommendation to close one tab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CleanupCandidate {
    pub tab_id: TabId,
    pub reason: CleanupReason,
    pub last_accessed: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_of_tab_id: Option<TabId>,
}

/// Colors a proposal may carry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GroupColor {
    Grey,
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
}

impl GroupColor {
    pub const ALL: [GroupColor; 8] = [
        GroupColor::Grey,
        GroupColor::Blue,
        GroupColor::Red,
        GroupColor::Yellow,
        GroupColor::Green,
        GroupColor::Pink,
        GroupColor::Purple,
        GroupColor::Cyan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GroupColor::Grey => "grey",
            GroupColor::Blue => "blue",
            GroupColor::Red => "red",
            GroupColor::Yellow => "yellow",
            GroupColor::Green => "green",
            GroupColor::Pink => "pink",
            GroupColor::Purple => "purple",
            GroupColor::Cyan => "cyan",
        }
    }
}

/// One proposed logical grouping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupProposal {
    pub name: String,
    pub color: GroupColor,
    pub tab_ids: Vec<TabId>,
}

impl GroupProposal {
    pub fn new(name: impl Into<String>, color: GroupColor, tab_ids: Vec<TabId>) -> Self {
        Self {
            name: name.into(),
            color,
            tab_ids,
        }
    }

    /// Removes a tab from the proposal. Returns whether it was present.
    pub fn remove_tab(&mut self, tab_id: TabId) -> bool {
        let before = self.tab_ids.len();
        self.tab_ids.retain(|id| *id != tab_id);
        self.tab_ids.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.tab_ids.is_empty()
    }
}

/// Drops `removed` ids from every proposal, then drops proposals left empty.
pub fn prune_proposals(groups: Vec<GroupProposal>, removed: &[TabId]) -> Vec<GroupProposal> {
    groups
        .into_iter()
        .map(|mut group| {
            group.tab_ids.retain(|id| !removed.contains(id));
            group
        })
        .filter(|group| !group.is_empty())
        .collect()
}

/// Grouping capability family of the host browser.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum GroupingStrategy {
    NativeGroups,
    MetadataStacks,
    Unsupported,
}

impl GroupingStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupingStrategy::NativeGroups => "native-groups",
            GroupingStrategy::MetadataStacks => "metadata-stacks",
            GroupingStrategy::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for GroupingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
