use crate::types::{CleanupCandidate, CleanupReason, Tab, TabId};
use std::collections::{BTreeMap, HashMap};

pub const STALE_THRESHOLD_MS: i64 = 2 * 60 * 60 * 1000;

/// Finds duplicate and stale tabs using the default two-hour threshold.
pub fn detect_candidates(tabs: &[Tab], now_ms: i64) -> Vec<CleanupCandidate> {
    detect_candidates_with_threshold(tabs, now_ms, STALE_THRESHOLD_MS)
}

pub fn detect_candidates_with_threshold(
    tabs: &[Tab],
    now_ms: i64,
    stale_after_ms: i64,
) -> Vec<CleanupCandidate> {
    let mut candidates: BTreeMap<TabId, CleanupCandidate> = BTreeMap::new();

    // Duplicates must be recorded first; the staleness pass upgrades them.
    let mut by_url: HashMap<&str, Vec<&Tab>> = HashMap::new();
    for tab in tabs {
        by_url.entry(tab.url.as_str()).or_default().push(tab);
    }

    for group in by_url.values().filter(|group| group.len() > 1) {
        let Some(keeper) = group
            .iter()
            .max_by_key(|tab| (tab.last_accessed, tab.id))
        else {
            continue;
        };

        for tab in group.iter().filter(|tab| tab.id != keeper.id) {
            candidates.insert(
                tab.id,
                CleanupCandidate {
                    tab_id: tab.id,
                    reason: CleanupReason::Duplicate,
                    last_accessed: tab.last_accessed,
                    duplicate_of_tab_id: Some(keeper.id),
                },
            );
        }
    }

    for tab in tabs {
        let idle = now_ms.saturating_sub(tab.last_accessed);
        if idle < stale_after_ms {
            continue;
        }

        candidates
            .entry(tab.id)
            .and_modify(|candidate| candidate.reason = CleanupReason::StaleAndDuplicate)
            .or_insert_with(|| CleanupCandidate {
                tab_id: tab.id,
                reason: CleanupReason::Stale,
                last_accessed: tab.last_accessed,
                duplicate_of_tab_id: None,
            });
    }

    let mut ranked: Vec<CleanupCandidate> = candidates.into_values().collect();
    ranked.sort_by_key(|candidate| (candidate.last_accessed, candidate.tab_id));

    tracing::debug!(
        "Cleanup detection: {} candidates from {} tabs",
        ranked.len(),
        tabs.len()
    );
    ranked
}
