// journal.rs - Journal entries and the append-only JournalStore.
//
// An entry is written exactly once, when its goal is completed. Entries are
// never edited or deleted; the goal title is copied in so the entry still
// reads correctly if the goal is later cleared from the goal list.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::local_date;
use crate::error::GoalError;
use crate::goal::{require_text, Goal};

/// Kind of media attached to a journal entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Photo,
    Video,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Photo => write!(f, "photo"),
            MediaType::Video => write!(f, "video"),
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photo" => Ok(MediaType::Photo),
            "video" => Ok(MediaType::Video),
            other => Err(format!("unknown media type '{}'", other)),
        }
    }
}

/// What the user supplies when completing a goal.
#[derive(Debug, Clone)]
pub struct JournalPayload {
    pub text: String,
    pub media_url: Option<String>,
    pub media_type: MediaType,
}

impl JournalPayload {
    pub fn new(text: impl Into<String>, media_url: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            text: text.into(),
            media_url: Some(media_url.into()),
            media_type,
        }
    }
}

/// An immutable reflection written when a goal is completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub goal_title: String,
    pub text: String,
    pub media_url: String,
    pub media_type: MediaType,
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    /// Build the entry for `goal` from a payload, validating it first.
    pub fn for_goal(
        goal: &Goal,
        payload: &JournalPayload,
        now: DateTime<Utc>,
    ) -> Result<Self, GoalError> {
        let text = require_text(&payload.text, "journal text")?;
        let media_url = payload
            .media_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(GoalError::MissingMedia)?;
        Ok(Self {
            id: Uuid::new_v4(),
            goal_id: goal.id,
            goal_title: goal.title.clone(),
            text,
            media_url: media_url.to_string(),
            media_type: payload.media_type,
            created_at: now,
        })
    }
}

/// Append-only collection of journal entries for the session.
#[derive(Debug, Default, Clone)]
pub struct JournalStore {
    entries: Vec<JournalEntry>,
}

impl JournalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<JournalEntry>) -> Self {
        Self { entries }
    }

    pub fn append(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, most recent first.
    pub fn entries(&self) -> Vec<&JournalEntry> {
        let mut sorted: Vec<&JournalEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sorted
    }

    /// Entries written on a given local calendar day, most recent first.
    pub fn on_day(&self, day: NaiveDate) -> Vec<&JournalEntry> {
        self.entries()
            .into_iter()
            .filter(|e| local_date(e.created_at) == day)
            .collect()
    }

    pub fn for_goal(&self, goal_id: Uuid) -> Vec<&JournalEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.goal_id == goal_id)
            .collect()
    }

    /// Distinct local days that have at least one entry, newest first.
    pub fn days_with_entries(&self) -> Vec<NaiveDate> {
        let mut days: Vec<NaiveDate> = self.entries.iter().map(|e| local_date(e.created_at)).collect();
        days.sort_by(|a, b| b.cmp(a));
        days.dedup();
        days
    }

    /// Raw insertion-ordered slice, as persisted.
    pub fn as_slice(&self) -> &[JournalEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Local, TimeZone};

    fn goal() -> Goal {
        let now = Local.with_ymd_and_hms(2026, 6, 10, 9, 0, 0).unwrap();
        Goal::new("Read 20 Pages", "Atomic Habits", now).unwrap()
    }

    fn entry_at(day: u32, hour: u32) -> JournalEntry {
        let at = Local.with_ymd_and_hms(2026, 6, day, hour, 0, 0).unwrap();
        JournalEntry::for_goal(
            &goal(),
            &JournalPayload::new("done", "file:///tmp/a.jpg", MediaType::Photo),
            at.with_timezone(&Utc),
        )
        .unwrap()
    }

    #[test]
    fn entry_copies_goal_title_and_link() {
        let g = goal();
        let e = JournalEntry::for_goal(
            &g,
            &JournalPayload::new("  felt great ", "https://cdn/x.mp4", MediaType::Video),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(e.goal_id, g.id);
        assert_eq!(e.goal_title, "Read 20 Pages");
        assert_eq!(e.text, "felt great");
        assert_eq!(e.media_type, MediaType::Video);
    }

    #[test]
    fn empty_text_rejected() {
        let result = JournalEntry::for_goal(
            &goal(),
            &JournalPayload::new("  ", "file:///a.jpg", MediaType::Photo),
            Utc::now(),
        );
        assert!(matches!(result, Err(GoalError::EmptyField { .. })));
    }

    #[test]
    fn missing_media_rejected() {
        let mut payload = JournalPayload::new("done", "", MediaType::Photo);
        assert!(matches!(
            JournalEntry::for_goal(&goal(), &payload, Utc::now()),
            Err(GoalError::MissingMedia)
        ));
        payload.media_url = None;
        assert!(matches!(
            JournalEntry::for_goal(&goal(), &payload, Utc::now()),
            Err(GoalError::MissingMedia)
        ));
    }

    #[test]
    fn entries_are_newest_first() {
        let mut store = JournalStore::new();
        store.append(entry_at(10, 8));
        store.append(entry_at(12, 8));
        store.append(entry_at(11, 8));
        let times: Vec<_> = store.entries().iter().map(|e| e.created_at).collect();
        assert!(times.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn on_day_filters_by_local_date() {
        let mut store = JournalStore::new();
        store.append(entry_at(10, 0));
        store.append(entry_at(10, 23));
        store.append(entry_at(11, 0));
        let day = NaiveDate::from_ymd_opt(2026, 6, 10).unwrap();
        assert_eq!(store.on_day(day).len(), 2);
        assert_eq!(store.on_day(day + Duration::days(1)).len(), 1);
        assert!(store.on_day(day - Duration::days(1)).is_empty());
        assert_eq!(store.days_with_entries().len(), 2);
    }
}
