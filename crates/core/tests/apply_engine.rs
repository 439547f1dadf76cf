//! Apply engine behavior across grouping strategies.

use serde_json::Value;
use std::sync::Arc;
use tab_sorter_core::apply::{STACK_COLOR_KEY, STACK_ID_KEY, STACK_TITLE_KEY};
use tab_sorter_core::palette::stack_color;
use tab_sorter_core::*;

fn tab(id: TabId, with_ext_data: bool) -> HostTab {
    HostTab {
        id,
        title: Some(format!("Tab {}", id)),
        url: Some(format!("https://site{}.com", id)),
        last_accessed: Some(1_000 + id),
        ext_data: with_ext_data.then(|| r#"{"keep":true}"#.to_string()),
        ..Default::default()
    }
}

fn engine(host: Arc<MemoryHost>) -> (ApplyEngine, Arc<Counters>) {
    let counters = Counters::new();
    let engine = ApplyEngine::new(host, Arc::new(StrategyDetector::new()), counters.clone());
    (engine, counters)
}

fn native_host(ids: &[TabId]) -> Arc<MemoryHost> {
    Arc::new(MemoryHost::new(
        true,
        ids.iter().map(|id| tab(*id, false)).collect(),
    ))
}

fn stack_host(ids: &[TabId]) -> Arc<MemoryHost> {
    Arc::new(MemoryHost::new(
        false,
        ids.iter().map(|id| tab(*id, true)).collect(),
    ))
}

#[tokio::test]
async fn test_grouping_only_creates_native_groups() {
    let host = native_host(&[1, 2, 3, 4]);
    let (engine, _) = engine(host.clone());

    let report = engine
        .apply_cleanup(
            &[],
            vec![
                GroupProposal::new("🦀 Rust", GroupColor::Red, vec![1, 2]),
                GroupProposal::new("📰 News", GroupColor::Cyan, vec![3, 4]),
            ],
        )
        .await
        .unwrap();

    assert_eq!(report.groups_applied, 2);
    assert!(report.closed.is_empty());
    assert_eq!(report.strategy, Some(GroupingStrategy::NativeGroups));
    assert_eq!(host.removal_count(), 0);

    let groups = host.groups();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].title, "🦀 Rust");
    assert_eq!(groups[0].color, NativeColor::Red);
    assert_eq!(groups[0].tab_ids, vec![1, 2]);
    assert_eq!(groups[1].color, NativeColor::Cyan);
}

#[tokio::test]
async fn test_closed_ids_removed_from_groups_and_empty_groups_dropped() {
    let host = native_host(&[1, 2, 3]);
    let (engine, counters) = engine(host.clone());

    let report = engine
        .apply_cleanup(
            &[2, 3],
            vec![
                GroupProposal::new("Keep", GroupColor::Blue, vec![1, 2]),
                GroupProposal::new("Gone", GroupColor::Green, vec![3]),
            ],
        )
        .await
        .unwrap();

    assert_eq!(report.closed, vec![2, 3]);
    assert_eq!(report.groups_applied, 1);
    let groups = host.groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].title, "Keep");
    assert_eq!(groups[0].tab_ids, vec![1]);
    assert_eq!(counters.snapshot().tabs_closed, 2);
}

#[tokio::test]
async fn test_already_closed_tab_does_not_abort_batch() {
    let host = native_host(&[1, 2, 3]);
    host.close_out_of_band(2);
    let (engine, counters) = engine(host.clone());

    let report = engine.apply_cleanup(&[1, 2, 3], Vec::new()).await.unwrap();

    assert_eq!(report.closed, vec![1, 3]);
    assert_eq!(report.skipped, vec![2]);
    assert!(host.snapshot().tabs.is_empty());
    assert_eq!(counters.snapshot().tabs_skipped, 1);
}

#[tokio::test]
async fn test_native_path_filters_vanished_tabs() {
    let host = native_host(&[1, 2, 3]);
    host.close_out_of_band(2);
    host.close_out_of_band(3);
    let (engine, _) = engine(host.clone());

    let report = engine
        .apply_cleanup(
            &[],
            vec![
                GroupProposal::new("Mixed", GroupColor::Purple, vec![1, 2]),
                GroupProposal::new("All gone", GroupColor::Pink, vec![3]),
            ],
        )
        .await
        .unwrap();

    assert_eq!(report.groups_applied, 1);
    assert_eq!(report.skipped, vec![2, 3]);
    let groups = host.groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].tab_ids, vec![1]);
}

#[tokio::test]
async fn test_stack_path_writes_merged_metadata() {
    let host = stack_host(&[1, 2, 3]);
    let (engine, _) = engine(host.clone());

    let report = engine
        .apply_cleanup(
            &[],
            vec![
                GroupProposal::new("Work", GroupColor::Green, vec![1, 2]),
                GroupProposal::new("Fun", GroupColor::Pink, vec![3]),
            ],
        )
        .await
        .unwrap();

    assert_eq!(report.strategy, Some(GroupingStrategy::MetadataStacks));
    assert_eq!(report.groups_applied, 2);

    let data = |id| -> Value {
        serde_json::from_str(host.tab(id).unwrap().ext_data.as_deref().unwrap()).unwrap()
    };
    let (one, two, three) = (data(1), data(2), data(3));

    assert_eq!(one["keep"], true);
    assert_eq!(one[STACK_TITLE_KEY], "Work");
    assert_eq!(one[STACK_COLOR_KEY], stack_color(GroupColor::Green));
    assert_eq!(one[STACK_ID_KEY], two[STACK_ID_KEY]);
    assert_ne!(one[STACK_ID_KEY], three[STACK_ID_KEY]);
    assert!(host.groups().is_empty());
}

#[tokio::test]
async fn test_stack_path_skips_vanished_tab() {
    let host = stack_host(&[1, 2]);
    host.close_out_of_band(1);
    // Detection needs a tab carrying metadata; tab 2 is still there.
    let (engine, _) = engine(host.clone());

    let report = engine
        .apply_cleanup(&[], vec![GroupProposal::new("Solo", GroupColor::Grey, vec![1, 2])])
        .await
        .unwrap();

    assert_eq!(report.skipped, vec![1]);
    assert_eq!(report.groups_applied, 1);
    assert!(host.tab(2).unwrap().ext_data.unwrap().contains("Solo"));
}

#[tokio::test]
async fn test_unsupported_fails_without_closing() {
    let host = Arc::new(MemoryHost::new(
        false,
        vec![HostTab {
            id: 1,
            url: Some("https://a.com".to_string()),
            ..Default::default()
        }],
    ));
    let (engine, _) = engine(host.clone());

    let err = engine
        .apply_cleanup(&[1], vec![GroupProposal::new("X", GroupColor::Red, vec![1, 2])])
        .await
        .unwrap_err();

    assert!(matches!(err, ApplyError::Unsupported));
    assert!(err.to_string().contains("not supported in this browser"));
    assert_eq!(host.removal_count(), 0);
    assert!(host.tab(1).is_some());
}

#[tokio::test]
async fn test_unsupported_host_can_still_close() {
    let host = Arc::new(MemoryHost::new(
        false,
        vec![HostTab {
            id: 1,
            url: Some("https://a.com".to_string()),
            ..Default::default()
        }],
    ));
    let (engine, _) = engine(host.clone());

    let report = engine.apply_cleanup(&[1], Vec::new()).await.unwrap();

    assert_eq!(report.closed, vec![1]);
    assert_eq!(report.strategy, None);
}
