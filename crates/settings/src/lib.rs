use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tab_sorter_core::TabFilter;
use tab_sorter_providers::ModelConfig;
use thiserror::Error;

pub const DEFAULT_MODEL_ID: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_STALE_AFTER_MINUTES: u64 = 120;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

pub const ENV_API_KEY: &str = "TAB_SORTER_API_KEY";
pub const ENV_MODEL: &str = "TAB_SORTER_MODEL";
pub const ENV_BASE_URL: &str = "TAB_SORTER_BASE_URL";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub api_key: String,
    pub model_id: String,
    pub base_url: String,
    pub internal_prefixes: Vec<String>,
    pub stale_after_minutes: u64,
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            internal_prefixes: default_internal_prefixes(),
            stale_after_minutes: DEFAULT_STALE_AFTER_MINUTES,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

pub fn default_internal_prefixes() -> Vec<String> {
    [
        "chrome://",
        "chrome-extension://",
        "edge://",
        "brave://",
        "vivaldi://",
        "opera://",
        "devtools://",
        "about:",
    ]
    .iter()
    .map(|prefix| prefix.to_string())
    .collect()
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.model_id.trim().is_empty() {
            return Err(SettingsError::Invalid("model_id cannot be empty".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(SettingsError::Invalid("base_url cannot be empty".to_string()));
        }
        if self.stale_after_minutes == 0 {
            return Err(SettingsError::Invalid(
                "stale_after_minutes must be greater than 0".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(SettingsError::Invalid(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies `TAB_SORTER_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Ok(model) = std::env::var(ENV_MODEL) {
            self.model_id = model;
        }
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            self.base_url = url;
        }
        self
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig::new(self.api_key.clone(), self.model_id.clone())
    }

    pub fn tab_filter(&self) -> TabFilter {
        TabFilter::new(self.internal_prefixes.clone())
    }

    pub fn stale_after_ms(&self) -> i64 {
        i64::try_from(self.stale_after_minutes)
            .unwrap_or(i64::MAX)
            .saturating_mul(60 * 1000)
    }
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Loads settings, falling back to defaults when nothing is stored.
    async fn load(&self) -> Result<Settings, SettingsError>;

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

/// Settings persisted as a YAML file.
pub struct YamlSettingsStore {
    path: PathBuf,
}

impl YamlSettingsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `<config dir>/tab-sorter/settings.yaml`, or a relative path if the
    /// platform has no config dir.
    pub fn default_location() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join("tab-sorter").join("settings.yaml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for YamlSettingsStore {
    async fn load(&self) -> Result<Settings, SettingsError> {
        if !self.path.exists() {
            tracing::debug!("No settings at {:?}, using defaults", self.path);
            return Ok(Settings::default());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        settings.validate()?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_yaml::to_string(settings)?;
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, content).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        tracing::info!("Saved settings to {:?}", self.path);
        Ok(())
    }
}
