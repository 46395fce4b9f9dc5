// rows.rs - Table rows and their validated mapping to domain types.
//
// The hosted tables use snake_case columns and carry a `user_id` owner.
// Rows are decoded one at a time from raw JSON so that a single bad row is
// skipped (and logged) instead of failing the whole listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use td_goal::goal::validate_progress;
use td_goal::{Goal, GoalStatus, JournalEntry, MediaType};

use crate::error::RemoteError;

pub const GOALS_TABLE: &str = "goals";
pub const JOURNAL_TABLE: &str = "journal_entries";

/// A row of the `goals` table as the service returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalRow {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub progress: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub target_date: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl GoalRow {
    pub fn from_goal(goal: &Goal, user_id: Uuid) -> Self {
        Self {
            id: goal.id,
            user_id: Some(user_id),
            title: goal.title.clone(),
            description: Some(goal.description.clone()),
            progress: Some(goal.progress.into()),
            status: goal.status.to_string(),
            created_at: goal.created_at,
            target_date: goal.target_date,
            completed_at: goal.completed_at,
        }
    }
}

impl TryFrom<GoalRow> for Goal {
    type Error = RemoteError;

    fn try_from(row: GoalRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let malformed = |reason: String| RemoteError::MalformedRow {
            table: GOALS_TABLE,
            reason: format!("{}: {}", id, reason),
        };
        let status: GoalStatus = row.status.parse().map_err(malformed)?;
        let progress = validate_progress(row.progress.unwrap_or(0))
            .map_err(|e| malformed(e.to_string()))?;
        if row.title.trim().is_empty() {
            return Err(malformed("empty title".to_string()));
        }
        if status == GoalStatus::Completed && row.completed_at.is_none() {
            return Err(malformed("completed without completed_at".to_string()));
        }
        Ok(Goal {
            id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            created_at: row.created_at,
            target_date: row.target_date,
            status,
            progress,
            completed_at: row.completed_at,
        })
    }
}

/// A row of the `journal_entries` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalRow {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub goal_id: Uuid,
    pub goal_title: String,
    pub text: String,
    #[serde(default)]
    pub media_url: Option<String>,
    pub media_type: String,
    pub created_at: DateTime<Utc>,
}

impl JournalRow {
    pub fn from_entry(entry: &JournalEntry, user_id: Uuid) -> Self {
        Self {
            id: entry.id,
            user_id: Some(user_id),
            goal_id: entry.goal_id,
            goal_title: entry.goal_title.clone(),
            text: entry.text.clone(),
            media_url: Some(entry.media_url.clone()),
            media_type: entry.media_type.to_string(),
            created_at: entry.created_at,
        }
    }
}

impl TryFrom<JournalRow> for JournalEntry {
    type Error = RemoteError;

    fn try_from(row: JournalRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let malformed = |reason: String| RemoteError::MalformedRow {
            table: JOURNAL_TABLE,
            reason: format!("{}: {}", id, reason),
        };
        let media_type: MediaType = row.media_type.parse().map_err(malformed)?;
        if row.text.trim().is_empty() {
            return Err(malformed("empty text".to_string()));
        }
        if row.goal_title.trim().is_empty() {
            return Err(malformed("empty goal_title".to_string()));
        }
        // Entries are always written with their media.
        let media_url = match row.media_url {
            Some(url) if !url.trim().is_empty() => url,
            _ => return Err(malformed("missing media_url".to_string())),
        };
        Ok(JournalEntry {
            id,
            goal_id: row.goal_id,
            goal_title: row.goal_title,
            text: row.text,
            media_url,
            media_type,
            created_at: row.created_at,
        })
    }
}

/// Decode a listing, skipping rows that don't map.
///
/// Returns the records plus the number of rows skipped.
pub fn decode_rows<R, T>(table: &'static str, rows: Vec<Value>) -> (Vec<T>, usize)
where
    R: serde::de::DeserializeOwned,
    T: TryFrom<R, Error = RemoteError>,
{
    let mut out = Vec::with_capacity(rows.len());
    let mut skipped = 0;
    for raw in rows {
        let decoded = serde_json::from_value::<R>(raw)
            .map_err(|e| RemoteError::MalformedRow {
                table,
                reason: e.to_string(),
            })
            .and_then(T::try_from);
        match decoded {
            Ok(record) => out.push(record),
            Err(e) => {
                tracing::warn!("skipping row: {}", e);
                skipped += 1;
            }
        }
    }
    (out, skipped)
}
