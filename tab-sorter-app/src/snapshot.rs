//! JSON snapshot of a browser window, used as the CLI's tab host.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tab_sorter_core::{MemoryHost, WindowSnapshot};

pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub async fn load(&self) -> Result<MemoryHost> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshot {}", self.path.display()))?;
        let snapshot: WindowSnapshot = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot {}", self.path.display()))?;
        tracing::debug!(
            "Loaded {} tabs from {}",
            snapshot.tabs.len(),
            self.path.display()
        );
        Ok(MemoryHost::from_snapshot(snapshot))
    }

    /// Writes the host's current window back, atomically.
    pub async fn save(&self, host: &MemoryHost) -> Result<()> {
        let content = serde_json::to_string_pretty(&host.snapshot())?;
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, content)
            .await
            .context("Failed to write snapshot")?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .context("Failed to replace snapshot")?;
        Ok(())
    }
}
