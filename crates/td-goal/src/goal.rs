// goal.rs - Goal: one daily task and its lifecycle.
//
// The state machine is deliberately small:
//   Pending → Completed   (user completes it with a journal entry)
//   Pending → Failed      (the reconciler sees the deadline has passed)
// Both end states are terminal. Progress only moves while pending.

use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock;
use crate::error::GoalError;

/// The lifecycle state of a Goal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Pending,
    Completed,
    Failed,
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalStatus::Pending => write!(f, "pending"),
            GoalStatus::Completed => write!(f, "completed"),
            GoalStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(GoalStatus::Pending),
            "completed" => Ok(GoalStatus::Completed),
            "failed" => Ok(GoalStatus::Failed),
            other => Err(format!("unknown goal status '{}'", other)),
        }
    }
}

impl GoalStatus {
    /// Check whether moving from this status to `next` is allowed.
    pub fn can_transition_to(&self, next: GoalStatus) -> bool {
        matches!(
            (self, next),
            (GoalStatus::Pending, GoalStatus::Completed) | (GoalStatus::Pending, GoalStatus::Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, GoalStatus::Pending)
    }
}

/// A goal for the day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Uuid,

    /// Short title shown in lists (e.g., "Morning Workout").
    pub title: String,

    pub description: String,

    pub created_at: DateTime<Utc>,

    /// Deadline: the last millisecond of the creation day, local time.
    pub target_date: DateTime<Utc>,

    pub status: GoalStatus,

    /// Percentage 0-100. Forced to 100 on completion.
    pub progress: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Goal {
    /// Create a pending goal due at the end of `now`'s local day.
    ///
    /// Title and description are trimmed and must not be empty.
    pub fn new(
        title: &str,
        description: &str,
        now: DateTime<Local>,
    ) -> Result<Self, GoalError> {
        let title = require_text(title, "title")?;
        let description = require_text(description, "description")?;
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            description,
            created_at: now.with_timezone(&Utc),
            target_date: clock::end_of_day(now.date_naive()),
            status: GoalStatus::Pending,
            progress: 0,
            completed_at: None,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == GoalStatus::Pending
    }

    /// True once `now` is strictly past the deadline.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now > self.target_date
    }

    /// Set progress on a pending goal. Returns `Ok(false)` if the goal is
    /// no longer pending (nothing changes).
    pub fn set_progress(&mut self, progress: i64) -> Result<bool, GoalError> {
        let progress = validate_progress(progress)?;
        if !self.is_pending() {
            return Ok(false);
        }
        self.progress = progress;
        Ok(true)
    }

    /// Mark the goal completed at `now`.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), GoalError> {
        self.transition(GoalStatus::Completed)?;
        self.progress = 100;
        self.completed_at = Some(now);
        Ok(())
    }

    /// Mark the goal failed if it is still pending and past its deadline.
    ///
    /// Returns whether the goal changed. A completed goal is never touched,
    /// whatever order completion and reconciliation happen in.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_pending() || !self.is_overdue(now) {
            return false;
        }
        self.status = GoalStatus::Failed;
        true
    }

    fn transition(&mut self, next: GoalStatus) -> Result<(), GoalError> {
        if !self.status.can_transition_to(next) {
            return Err(GoalError::InvalidTransition {
                goal_id: self.id,
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Check a progress value is a percentage.
pub fn validate_progress(progress: i64) -> Result<u8, GoalError> {
    u8::try_from(progress)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or(GoalError::ProgressOutOfRange(progress))
}

pub(crate) fn require_text(value: &str, field: &'static str) -> Result<String, GoalError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GoalError::EmptyField { field });
    }
    Ok(trimmed.to_string())
}
