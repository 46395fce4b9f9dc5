// events.rs - Change events and notification dispatch.
//
// Every mutation the Tracker applies, whether from a user command or from
// the reconciler timer, is announced as a `TrackerEvent`. Sinks subscribe to
// them: the JSONL log sink keeps a history on disk, the channel sink feeds an
// in-process consumer such as the `td watch` display.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GoalError;

/// Events emitted when goals or the journal change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum TrackerEvent {
    GoalCreated {
        goal_id: Uuid,
        title: String,
        target_date: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    ProgressUpdated {
        goal_id: Uuid,
        progress: u8,
        timestamp: DateTime<Utc>,
    },

    GoalCompleted {
        goal_id: Uuid,
        journal_entry_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// The reconciler expired a goal.
    GoalFailed {
        goal_id: Uuid,
        title: String,
        timestamp: DateTime<Utc>,
    },

    GoalRemoved {
        goal_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    PendingCleared {
        count: usize,
        timestamp: DateTime<Utc>,
    },

    DataReset {
        timestamp: DateTime<Utc>,
    },
}

impl TrackerEvent {
    pub fn event_type(&self) -> &str {
        match self {
            TrackerEvent::GoalCreated { .. } => "goal_created",
            TrackerEvent::ProgressUpdated { .. } => "progress_updated",
            TrackerEvent::GoalCompleted { .. } => "goal_completed",
            TrackerEvent::GoalFailed { .. } => "goal_failed",
            TrackerEvent::GoalRemoved { .. } => "goal_removed",
            TrackerEvent::PendingCleared { .. } => "pending_cleared",
            TrackerEvent::DataReset { .. } => "data_reset",
        }
    }
}

/// Receives tracker events.
pub trait NotificationSink: Send {
    /// Handle an event. Errors are logged but don't stop the tracker.
    fn send(&self, event: &TrackerEvent) -> Result<(), GoalError>;
}

/// Appends events as JSONL to a file.
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl NotificationSink for LogSink {
    fn send(&self, event: &TrackerEvent) -> Result<(), GoalError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| GoalError::IoError {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| GoalError::IoError {
                path: self.path.display().to_string(),
                source,
            })?;

        let json = serde_json::to_string(event)?;
        writeln!(file, "{}", json).map_err(|source| GoalError::IoError {
            path: self.path.display().to_string(),
            source,
        })?;

        Ok(())
    }
}

/// Forwards events over an mpsc channel.
pub struct ChannelSink {
    tx: Sender<TrackerEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<TrackerEvent>) -> Self {
        Self { tx }
    }
}

impl NotificationSink for ChannelSink {
    fn send(&self, event: &TrackerEvent) -> Result<(), GoalError> {
        self.tx
            .send(event.clone())
            .map_err(|e| GoalError::NotificationError(e.to_string()))
    }
}

/// Dispatches events to every registered sink.
///
/// A failing sink is logged and skipped; the others still get the event.
#[derive(Default)]
pub struct EventDispatcher {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    pub fn dispatch(&self, event: &TrackerEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.send(event) {
                tracing::warn!("notification sink error: {}", e);
            }
        }
    }
}
