// backend.rs - Persistence seam for goals and journal entries.
//
// The Tracker talks to storage only through `Backend`. Two implementations
// exist: `LocalBackend` below (two JSON documents in the data directory) and
// the remote table API in the `td-remote` crate.
//
// Goal updates carry the status the caller expects the persisted row to
// have. A write against a row that moved on (say, failed by a reconciler
// running elsewhere) is refused with `GoalError::Conflict` instead of
// silently overwriting it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::GoalError;
use crate::goal::{Goal, GoalStatus};
use crate::journal::JournalEntry;
use crate::reconciler;
use crate::store::GoalStore;

/// File name of the persisted goal list.
pub const GOALS_FILE: &str = "trackdaily-goals.json";

/// File name of the persisted journal.
pub const JOURNAL_FILE: &str = "trackdaily-journal.json";

/// Storage operations the tracker depends on.
pub trait Backend: Send {
    fn load_goals(&mut self) -> Result<Vec<Goal>, GoalError>;

    fn load_journal(&mut self) -> Result<Vec<JournalEntry>, GoalError>;

    fn insert_goal(&mut self, goal: &Goal) -> Result<(), GoalError>;

    /// Overwrite a goal, provided its persisted status is still `expected`.
    fn update_goal(&mut self, goal: &Goal, expected: GoalStatus) -> Result<(), GoalError>;

    fn delete_goal(&mut self, goal_id: Uuid) -> Result<(), GoalError>;

    /// Bulk-delete all pending goals.
    fn delete_pending_goals(&mut self) -> Result<(), GoalError>;

    /// Bulk-mark every pending goal whose deadline is before `now` as failed.
    fn mark_expired_failed(&mut self, now: DateTime<Utc>) -> Result<(), GoalError>;

    fn insert_journal_entry(&mut self, entry: &JournalEntry) -> Result<(), GoalError>;

    /// Forget all goals and journal entries.
    fn clear_all(&mut self) -> Result<(), GoalError>;
}

/// JSON-file persistence in a data directory.
///
/// Each document is rewritten whole on every change: written to a sibling
/// temp file, then renamed over the original.
pub struct LocalBackend {
    goals_path: PathBuf,
    journal_path: PathBuf,
}

impl LocalBackend {
    /// Create a backend rooted at `data_dir`, creating the directory if needed.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, GoalError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|source| GoalError::IoError {
            path: data_dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            goals_path: data_dir.join(GOALS_FILE),
            journal_path: data_dir.join(JOURNAL_FILE),
        })
    }

    pub fn goals_path(&self) -> &Path {
        &self.goals_path
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    fn modify_goals<F>(&mut self, f: F) -> Result<(), GoalError>
    where
        F: FnOnce(&mut Vec<Goal>) -> Result<(), GoalError>,
    {
        let mut goals: Vec<Goal> = read_array(&self.goals_path)?;
        f(&mut goals)?;
        write_array(&self.goals_path, &goals)
    }
}

impl Backend for LocalBackend {
    fn load_goals(&mut self) -> Result<Vec<Goal>, GoalError> {
        read_array(&self.goals_path)
    }

    fn load_journal(&mut self) -> Result<Vec<JournalEntry>, GoalError> {
        read_array(&self.journal_path)
    }

    fn insert_goal(&mut self, goal: &Goal) -> Result<(), GoalError> {
        self.modify_goals(|goals| {
            goals.push(goal.clone());
            Ok(())
        })
    }

    fn update_goal(&mut self, goal: &Goal, expected: GoalStatus) -> Result<(), GoalError> {
        self.modify_goals(|goals| {
            let slot = goals
                .iter_mut()
                .find(|g| g.id == goal.id)
                .ok_or(GoalError::NotFound(goal.id))?;
            if slot.status != expected {
                return Err(GoalError::Conflict {
                    goal_id: goal.id,
                    expected: expected.to_string(),
                });
            }
            *slot = goal.clone();
            Ok(())
        })
    }

    fn delete_goal(&mut self, goal_id: Uuid) -> Result<(), GoalError> {
        self.modify_goals(|goals| {
            goals.retain(|g| g.id != goal_id);
            Ok(())
        })
    }

    fn delete_pending_goals(&mut self) -> Result<(), GoalError> {
        self.modify_goals(|goals| {
            goals.retain(|g| !g.is_pending());
            Ok(())
        })
    }

    fn mark_expired_failed(&mut self, now: DateTime<Utc>) -> Result<(), GoalError> {
        let mut stored = GoalStore::from_goals(read_array(&self.goals_path)?);
        if reconciler::reconcile(&mut stored, now).is_empty() {
            return Ok(());
        }
        write_array(&self.goals_path, stored.all())
    }

    fn insert_journal_entry(&mut self, entry: &JournalEntry) -> Result<(), GoalError> {
        let mut entries: Vec<JournalEntry> = read_array(&self.journal_path)?;
        entries.push(entry.clone());
        write_array(&self.journal_path, &entries)
    }

    fn clear_all(&mut self) -> Result<(), GoalError> {
        for path in [&self.goals_path, &self.journal_path] {
            if path.exists() {
                fs::remove_file(path).map_err(|source| GoalError::IoError {
                    path: path.display().to_string(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

/// Read a JSON array document; a missing file is an empty array.
fn read_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, GoalError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let json = fs::read_to_string(path).map_err(|source| GoalError::IoError {
        path: path.display().to_string(),
        source,
    })?;
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&json)?)
}

fn write_array<T: Serialize>(path: &Path, items: &[T]) -> Result<(), GoalError> {
    let json = serde_json::to_string_pretty(items)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|source| GoalError::IoError {
        path: tmp.display().to_string(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| GoalError::IoError {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(path = %path.display(), count = items.len(), "wrote document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{JournalPayload, MediaType};
    use chrono::{Duration, Local, TimeZone};
    use tempfile::tempdir;

    fn make_goal(title: &str) -> Goal {
        let now = Local.with_ymd_and_hms(2026, 6, 10, 9, 0, 0).unwrap();
        Goal::new(title, "test description", now).unwrap()
    }

    #[test]
    fn missing_files_load_as_empty() {
        let dir = tempdir().unwrap();
        let mut backend = LocalBackend::new(dir.path().join("data")).unwrap();
        assert!(backend.load_goals().unwrap().is_empty());
        assert!(backend.load_journal().unwrap().is_empty());
    }

    #[test]
    fn insert_and_reload_survives_reopen() {
        let dir = tempdir().unwrap();
        let g = make_goal("Persistent");
        {
            let mut backend = LocalBackend::new(dir.path()).unwrap();
            backend.insert_goal(&g).unwrap();
        }
        let mut backend = LocalBackend::new(dir.path()).unwrap();
        let goals = backend.load_goals().unwrap();
        assert_eq!(goals, vec![g]);
    }

    #[test]
    fn update_requires_expected_status() {
        let dir = tempdir().unwrap();
        let mut backend = LocalBackend::new(dir.path()).unwrap();
        let mut g = make_goal("Goal");
        backend.insert_goal(&g).unwrap();

        backend
            .mark_expired_failed(g.target_date + Duration::minutes(1))
            .unwrap();
        g.complete(Utc::now()).unwrap();
        let result = backend.update_goal(&g, GoalStatus::Pending);
        assert!(matches!(result, Err(GoalError::Conflict { .. })));
        assert_eq!(backend.load_goals().unwrap()[0].status, GoalStatus::Failed);
    }

    #[test]
    fn update_unknown_goal_is_not_found() {
        let dir = tempdir().unwrap();
        let mut backend = LocalBackend::new(dir.path()).unwrap();
        let g = make_goal("Ghost");
        assert!(matches!(
            backend.update_goal(&g, GoalStatus::Pending),
            Err(GoalError::NotFound(_))
        ));
    }

    #[test]
    fn delete_pending_keeps_terminal() {
        let dir = tempdir().unwrap();
        let mut backend = LocalBackend::new(dir.path()).unwrap();
        let mut done = make_goal("Done");
        done.complete(Utc::now()).unwrap();
        backend.insert_goal(&done).unwrap();
        backend.insert_goal(&make_goal("Open")).unwrap();
        backend.delete_pending_goals().unwrap();
        let goals = backend.load_goals().unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].title, "Done");
    }

    #[test]
    fn documents_use_iso_timestamps() {
        let dir = tempdir().unwrap();
        let mut backend = LocalBackend::new(dir.path()).unwrap();
        let g = make_goal("Goal");
        backend.insert_goal(&g).unwrap();
        let entry = JournalEntry::for_goal(
            &g,
            &JournalPayload::new("done", "file:///a.jpg", MediaType::Photo),
            Utc::now(),
        )
        .unwrap();
        backend.insert_journal_entry(&entry).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(backend.goals_path()).unwrap()).unwrap();
        let target = raw[0]["targetDate"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(target).is_ok());
        assert_eq!(backend.load_journal().unwrap(), vec![entry]);
    }

    #[test]
    fn corrupt_document_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(GOALS_FILE), "{not json").unwrap();
        let mut backend = LocalBackend::new(dir.path()).unwrap();
        assert!(matches!(
            backend.load_goals(),
            Err(GoalError::SerializationError(_))
        ));
    }

    #[test]
    fn clear_all_removes_documents() {
        let dir = tempdir().unwrap();
        let mut backend = LocalBackend::new(dir.path()).unwrap();
        backend.insert_goal(&make_goal("Goal")).unwrap();
        backend.clear_all().unwrap();
        assert!(!backend.goals_path().exists());
        assert!(backend.load_goals().unwrap().is_empty());
    }
}
