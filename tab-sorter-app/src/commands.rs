use crate::snapshot::SnapshotFile;
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tab_sorter_core::{
    detect_candidates_with_threshold, now_ms, CleanupCandidate, GroupProposal, MemoryHost, Tab,
    TabId,
};
use tab_sorter_interfaces::{
    poll_until_settled, BackgroundRequest, BackgroundResponse, BackgroundService,
};
use tab_sorter_providers::OpenAICompatibleProvider;
use tab_sorter_settings::{Settings, SettingsStore};
use tab_sorter_tasks::JobStatus;

/// Snapshot host plus the background service wired over it.
pub struct Session {
    pub host: Arc<MemoryHost>,
    pub service: BackgroundService,
    snapshot: SnapshotFile,
}

impl Session {
    pub async fn open(snapshot: SnapshotFile, settings: &Settings) -> Result<Self> {
        let host = Arc::new(snapshot.load().await?);
        let provider = Arc::new(
            OpenAICompatibleProvider::new(settings.base_url.clone())
                .context("Failed to set up the classification provider")?,
        );
        let service = BackgroundService::new(host.clone(), provider, settings.tab_filter());
        Ok(Self {
            host,
            service,
            snapshot,
        })
    }

    pub async fn tabs(&self) -> Result<Vec<Tab>> {
        match self.service.handle(BackgroundRequest::ListTabs).await {
            BackgroundResponse::Tabs { tabs } => Ok(tabs),
            other => bail!("Failed to list tabs: {}", describe(&other)),
        }
    }

    pub async fn apply(&self, close: Vec<TabId>, groups: Vec<GroupProposal>) -> Result<()> {
        let response = self
            .service
            .handle(BackgroundRequest::ApplyCleanup {
                tab_ids_to_close: close,
                groups,
            })
            .await;

        match response {
            BackgroundResponse::Applied {
                success: true,
                report: Some(report),
                ..
            } => {
                println!(
                    "Closed {} tabs, applied {} groups ({} tabs already gone)",
                    report.closed.len(),
                    report.groups_applied,
                    report.skipped.len()
                );
            }
            other => bail!("Apply failed: {}", describe(&other)),
        }

        self.snapshot.save(&self.host).await
    }
}

fn describe(response: &BackgroundResponse) -> String {
    match response {
        BackgroundResponse::Ack {
            error: Some(error), ..
        }
        | BackgroundResponse::Applied {
            error: Some(error), ..
        } => error.clone(),
        other => format!("{:?}", other),
    }
}

pub async fn run_tabs(session: &Session) -> Result<()> {
    let tabs = session.tabs().await?;
    for tab in &tabs {
        println!("{:>6}  {}  {}", tab.id, tab.title, tab.url);
    }
    println!("{} tabs", tabs.len());
    Ok(())
}

pub async fn run_cleanup(
    session: &Session,
    settings: &Settings,
    apply: bool,
    stale_minutes: Option<u64>,
) -> Result<()> {
    let stale_after_ms = match stale_minutes {
        Some(0) => bail!("--stale-minutes must be greater than 0"),
        Some(minutes) => i64::try_from(minutes)
            .unwrap_or(i64::MAX)
            .saturating_mul(60 * 1000),
        None => settings.stale_after_ms(),
    };

    let tabs = session.tabs().await?;
    let now = now_ms();
    let candidates = detect_candidates_with_threshold(&tabs, now, stale_after_ms);

    if candidates.is_empty() {
        println!("Nothing to clean up");
        return Ok(());
    }
    for line in format_candidates(&candidates, &tabs, now) {
        println!("{}", line);
    }

    if apply {
        let ids = candidates.iter().map(|c| c.tab_id).collect();
        session.apply(ids, Vec::new()).await?;
    }
    Ok(())
}

pub async fn run_strategy(session: &Session) -> Result<()> {
    match session.service.handle(BackgroundRequest::GetStrategy).await {
        BackgroundResponse::Strategy { strategy } => {
            println!("{}", strategy);
            Ok(())
        }
        other => bail!("Unexpected response: {}", describe(&other)),
    }
}

pub async fn run_classify(
    session: &Session,
    settings: &Settings,
    apply: bool,
    exclude: &[TabId],
    timeout: Duration,
) -> Result<()> {
    let tabs = session.tabs().await?;
    if tabs.is_empty() {
        println!("No tabs to classify");
        return Ok(());
    }

    let started = session
        .service
        .handle(BackgroundRequest::StartCategorization {
            tabs,
            config: settings.model_config(),
        })
        .await;
    if let BackgroundResponse::Ack { success: false, .. } = started {
        bail!(
            "{} Run `tab-sorter config set-key <KEY>` first.",
            describe(&started)
        );
    }

    let interval = Duration::from_millis(settings.poll_interval_ms);
    let snapshot = poll_until_settled(&session.service, interval, timeout)
        .await
        .context("Classification did not finish")?;

    if snapshot.status == JobStatus::Error {
        bail!(
            "Classification failed: {}",
            snapshot.error.unwrap_or_default()
        );
    }

    let mut groups = snapshot.result.unwrap_or_default();
    for group in &mut groups {
        for tab_id in exclude {
            group.remove_tab(*tab_id);
        }
    }
    groups.retain(|group| !group.is_empty());

    for group in &groups {
        println!(
            "{} [{}]: {:?}",
            group.name,
            group.color.as_str(),
            group.tab_ids
        );
    }

    if apply {
        session.apply(Vec::new(), groups).await?;
    }
    Ok(())
}

pub async fn run_config_show(store: &dyn SettingsStore) -> Result<()> {
    let settings = store.load().await?;
    println!("api_key:             {}", mask_key(&settings.api_key));
    println!("model_id:            {}", settings.model_id);
    println!("base_url:            {}", settings.base_url);
    println!("stale_after_minutes: {}", settings.stale_after_minutes);
    println!("poll_interval_ms:    {}", settings.poll_interval_ms);
    println!("internal_prefixes:   {}", settings.internal_prefixes.join(", "));
    Ok(())
}

pub async fn run_config_update(
    store: &dyn SettingsStore,
    update: impl FnOnce(&mut Settings),
) -> Result<()> {
    let mut settings = store.load().await?;
    update(&mut settings);
    store.save(&settings).await?;
    println!("Settings saved");
    Ok(())
}

pub fn mask_key(key: &str) -> String {
    if key.is_empty() {
        return "(not set)".to_string();
    }
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{}", tail)
}

pub fn format_candidates(candidates: &[CleanupCandidate], tabs: &[Tab], now: i64) -> Vec<String> {
    let by_id: HashMap<TabId, &Tab> = tabs.iter().map(|tab| (tab.id, tab)).collect();

    candidates
        .iter()
        .map(|candidate| {
            let title = by_id
                .get(&candidate.tab_id)
                .map(|tab| tab.title.as_str())
                .unwrap_or("?");
            let idle_minutes = now.saturating_sub(candidate.last_accessed).max(0) / 60_000;
            let mut reasons = Vec::new();
            if candidate.reason.is_stale() {
                reasons.push(format!("stale {}m", idle_minutes));
            }
            if candidate.reason.is_duplicate() {
                reasons.push(match candidate.duplicate_of_tab_id {
                    Some(keeper) => format!("duplicate of {}", keeper),
                    None => "duplicate".to_string(),
                });
            }
            let reason = reasons.join(", ");
            format!("{:>6}  {:<32}  {}", candidate.tab_id, reason, title)
        })
        .collect()
}
