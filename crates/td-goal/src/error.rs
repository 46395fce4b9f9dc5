// error.rs - Error types for the goal tracking core.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during goal and journal operations.
///
/// Validation variants are returned before anything is written. Provider
/// variants (`IoError`, `SerializationError`, `Backend`) mean the write was
/// attempted and abandoned; the in-memory stores are left untouched.
#[derive(Debug, Error)]
pub enum GoalError {
    /// A required text field was empty or whitespace-only.
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    /// Progress outside the 0..=100 range.
    #[error("progress {0} is out of range (expected 0-100)")]
    ProgressOutOfRange(i64),

    /// Completion was attempted without a media reference.
    #[error("a photo or video is required to complete a goal")]
    MissingMedia,

    /// The requested goal was not found.
    #[error("goal not found: {0}")]
    NotFound(Uuid),

    /// The goal is not in a state that allows the requested change.
    #[error("invalid transition from {from} to {to} for goal {goal_id}")]
    InvalidTransition {
        goal_id: Uuid,
        from: String,
        to: String,
    },

    /// The persisted goal was no longer in the status the write expected
    /// (e.g. it was failed by a reconciler before the completion landed).
    #[error("goal {goal_id} is no longer {expected}")]
    Conflict { goal_id: Uuid, expected: String },

    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize goal data.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The config file exists but could not be parsed.
    #[error("invalid config at {path}: {message}")]
    Config { path: String, message: String },

    /// The persistence provider rejected or failed the operation.
    #[error("backend error: {0}")]
    Backend(String),

    /// A notification dispatch failed (non-fatal).
    #[error("notification error: {0}")]
    NotificationError(String),
}

impl GoalError {
    /// True for errors raised before any write was attempted.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GoalError::EmptyField { .. } | GoalError::ProgressOutOfRange(_) | GoalError::MissingMedia
        )
    }
}
