//! # td-remote
//!
//! Hosted backend for TrackDaily: goal and journal tables, email/password
//! auth, user profiles, and media uploads over the service's REST API.
//!
//! Everything here is wired up explicitly by the caller: build a
//! [`RestClient`] from [`td_goal::RemoteConfig`], sign in with
//! [`AuthClient`], then hand a [`RestBackend`] to [`td_goal::Tracker::open`].
//! Provider rows are validated on the way in; malformed rows are skipped
//! with a warning rather than trusted.

pub mod auth;
pub mod backend;
pub mod client;
pub mod error;
pub mod profile;
pub mod rows;
pub mod session;
pub mod storage;

pub use auth::{AuthClient, SignUp};
pub use backend::RestBackend;
pub use client::RestClient;
pub use error::RemoteError;
pub use profile::{Profile, ProfileClient, ProfileUpdate};
pub use session::{RemoteUser, Session};
pub use storage::MediaStorage;
