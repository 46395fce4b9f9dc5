// config.rs - Tracker configuration and data directory layout.
//
// All state lives under one data directory:
//   <data_dir>/config.toml              optional settings (this file's schema)
//   <data_dir>/trackdaily-goals.json    goal list (local backend)
//   <data_dir>/trackdaily-journal.json  journal (local backend)
//   <data_dir>/events.jsonl             event log
//   <data_dir>/session.json             remote auth session, when signed in

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::GoalError;
use crate::reconciler;

/// File name of the optional settings file inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Top-level settings from `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Where everything is stored. Not read from the file.
    #[serde(skip)]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub reconciler: ReconcilerConfig,

    #[serde(default)]
    pub countdown: CountdownConfig,

    /// Remote table API. When absent, the local JSON backend is used.
    #[serde(default)]
    pub remote: Option<RemoteConfig>,

    /// Override for the event log path.
    #[serde(default)]
    pub events_log: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Seconds between expiry checks in `td watch`.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownConfig {
    /// Show the time left in the day while watching.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Connection settings for the hosted backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub url: String,

    /// Public (anon) API key sent with every request.
    pub api_key: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Storage bucket that journal media is uploaded to.
    #[serde(default = "default_media_bucket")]
    pub media_bucket: String,
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_interval_secs() -> u64 {
    reconciler::DEFAULT_INTERVAL.as_secs()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_media_bucket() -> String {
    "journal-media".to_string()
}

impl TrackerConfig {
    /// Load `<data_dir>/config.toml`. A missing file yields defaults.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self, GoalError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let path = data_dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| GoalError::IoError {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str::<TrackerConfig>(&content).map_err(|e| GoalError::Config {
                path: path.display().to_string(),
                message: e.to_string(),
            })?
        } else {
            TrackerConfig::default()
        };
        config.data_dir = data_dir;
        Ok(config)
    }

    /// Like `load`, but falls back to defaults on a broken file.
    pub fn load_or_default(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self::load(data_dir).unwrap_or_else(|e| {
            tracing::warn!("{}; using default settings", e);
            Self {
                data_dir: data_dir.to_path_buf(),
                ..Self::default()
            }
        })
    }

    /// Platform data directory, e.g. `~/.local/share/trackdaily`.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trackdaily")
    }

    pub fn reconcile_interval(&self) -> Duration {
        // A zero interval would spin; clamp to one second.
        Duration::from_secs(self.reconciler.interval_secs.max(1))
    }

    pub fn events_log(&self) -> PathBuf {
        self.events_log
            .clone()
            .unwrap_or_else(|| self.data_dir.join("events.jsonl"))
    }

    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}
