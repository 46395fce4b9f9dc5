//! # td-goal
//!
//! Daily goal lifecycle, journal and expiry reconciliation for TrackDaily.
//!
//! A [`Goal`] is created for the current day and is due at the last
//! millisecond of that local day. It is either completed by the user (which
//! writes a [`JournalEntry`]) or failed by the reconciler once the deadline
//! passes. Both outcomes are permanent.
//!
//! ## Key components
//!
//! - [`Goal`]: the lifecycle state machine (Pending → Completed | Failed)
//! - [`GoalStore`] / [`JournalStore`]: the in-memory session collections
//! - [`Backend`]: persistence seam; [`LocalBackend`] stores JSON documents
//! - [`Tracker`]: session context that validates, persists and applies
//!   every user intent and reconciliation pass
//! - [`streak`]: streak, calendar and summary figures derived from goals
//! - [`TrackerEvent`] / [`EventDispatcher`]: change notifications to sinks

pub mod backend;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod error;
pub mod events;
pub mod export;
pub mod goal;
pub mod journal;
pub mod reconciler;
pub mod store;
pub mod streak;
pub mod tracker;

pub use backend::{Backend, LocalBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RemoteConfig, TrackerConfig};
pub use countdown::TimeLeft;
pub use error::GoalError;
pub use events::{ChannelSink, EventDispatcher, LogSink, NotificationSink, TrackerEvent};
pub use export::ExportBundle;
pub use goal::{Goal, GoalStatus};
pub use journal::{JournalEntry, JournalPayload, JournalStore, MediaType};
pub use store::GoalStore;
pub use streak::{DayStatus, Summary};
pub use tracker::Tracker;
