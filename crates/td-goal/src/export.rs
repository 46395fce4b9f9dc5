// export.rs - Backup export of all goals and journal entries.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GoalError;
use crate::goal::Goal;
use crate::journal::JournalEntry;

/// The downloadable backup document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub goals: Vec<Goal>,
    pub journal: Vec<JournalEntry>,
    pub export_date: DateTime<Utc>,
}

impl ExportBundle {
    pub fn new(goals: Vec<Goal>, journal: Vec<JournalEntry>, export_date: DateTime<Utc>) -> Self {
        Self {
            goals,
            journal,
            export_date,
        }
    }

    /// `trackdaily-backup-YYYY-MM-DD.json`, dated by the local day.
    pub fn default_file_name(now: DateTime<Local>) -> String {
        format!("trackdaily-backup-{}.json", now.format("%Y-%m-%d"))
    }

    pub fn to_json(&self) -> Result<String, GoalError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the bundle to `path`, creating parent directories.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<PathBuf, GoalError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| GoalError::IoError {
                path: parent.display().to_string(),
                source,
            })?;
        }
        fs::write(&path, self.to_json()?).map_err(|source| GoalError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Ok(path)
    }
}
