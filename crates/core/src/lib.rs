pub mod apply;
pub mod cleanup;
pub mod host;
pub mod memory_host;
pub mod metrics;
pub mod palette;
pub mod strategy;
pub mod types;

pub use apply::{ApplyEngine, ApplyError, ApplyReport};
pub use cleanup::{detect_candidates, detect_candidates_with_threshold, STALE_THRESHOLD_MS};
pub use host::{list_tabs, HostError, TabFilter, TabHost};
pub use memory_host::{MemoryHost, NativeGroup, WindowSnapshot};
pub use metrics::{Counters, CountersSnapshot};
pub use palette::NativeColor;
pub use strategy::StrategyDetector;
pub use types::*;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
