// error.rs - Error types for the hosted backend client.

use std::path::PathBuf;

use td_goal::GoalError;
use thiserror::Error;

/// Errors from talking to the hosted database, auth or storage service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport failure: DNS, TLS, timeout, connection reset.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// No usable session; sign in first.
    #[error("not signed in")]
    NotSignedIn,

    /// A row could not be turned into a domain record.
    #[error("malformed {table} row: {reason}")]
    MalformedRow { table: &'static str, reason: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RemoteError {
    /// True when the service rejected the caller's credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RemoteError::Status { status: 401 | 403, .. })
    }
}

impl From<RemoteError> for GoalError {
    fn from(e: RemoteError) -> Self {
        GoalError::Backend(e.to_string())
    }
}
