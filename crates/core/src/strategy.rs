use crate::host::TabHost;
use crate::types::GroupingStrategy;
use tokio::sync::OnceCell;

/// Probes the host once and caches the grouping strategy for the process lifetime.
///
/// Concurrent callers that arrive while the probe is running wait on the same
/// initialization and observe the same result. A host that changes capability
/// later is not re-probed.
#[derive(Debug, Default)]
pub struct StrategyDetector {
    cached: OnceCell<GroupingStrategy>,
}

impl StrategyDetector {
    pub fn new() -> Self {
        Self {
            cached: OnceCell::new(),
        }
    }

    pub async fn detect(&self, host: &dyn TabHost) -> GroupingStrategy {
        *self.cached.get_or_init(|| probe(host)).await
    }

    pub fn cached(&self) -> Option<GroupingStrategy> {
        self.cached.get().copied()
    }
}

async fn probe(host: &dyn TabHost) -> GroupingStrategy {
    if host.supports_native_groups() {
        tracing::info!("Grouping strategy: native tab groups");
        return GroupingStrategy::NativeGroups;
    }

    let strategy = match host.query_current_window().await {
        Ok(tabs) => match tabs.first() {
            Some(tab) if tab.ext_data.is_some() => GroupingStrategy::MetadataStacks,
            _ => GroupingStrategy::Unsupported,
        },
        Err(e) => {
            tracing::warn!("Strategy probe failed: {}", e);
            GroupingStrategy::Unsupported
        }
    };

    tracing::info!("Grouping strategy: {}", strategy);
    strategy
}
