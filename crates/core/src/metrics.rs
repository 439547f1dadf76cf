use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-wide activity counters.
pub struct Counters {
    jobs_started: AtomicU64,
    jobs_failed: AtomicU64,
    tabs_closed: AtomicU64,
    tabs_skipped: AtomicU64,
    groups_applied: AtomicU64,
}

impl Counters {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            jobs_started: AtomicU64::new(0),
            jobs_failed: AtomicU64::new(0),
            tabs_closed: AtomicU64::new(0),
            tabs_skipped: AtomicU64::new(0),
            groups_applied: AtomicU64::new(0),
        })
    }

    pub fn inc_jobs_started(&self) {
        self.jobs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_jobs_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tabs_closed(&self) {
        self.tabs_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tabs_skipped(&self) {
        self.tabs_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_groups_applied(&self) {
        self.groups_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            jobs_started: self.jobs_started.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            tabs_closed: self.tabs_closed.load(Ordering::Relaxed),
            tabs_skipped: self.tabs_skipped.load(Ordering::Relaxed),
            groups_applied: self.groups_applied.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CountersSnapshot {
    pub jobs_started: u64,
    pub jobs_failed: u64,
    pub tabs_closed: u64,
    pub tabs_skipped: u64,
    pub groups_applied: u64,
}
