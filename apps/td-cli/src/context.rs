// context.rs - Per-invocation wiring: config, backend choice, session.
//
// A `[remote]` table in config.toml selects the hosted backend and requires a
// saved session (`td auth signin`). Without it everything lives in JSON files
// under the data directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use chrono::Utc;
use td_goal::{
    Backend, EventDispatcher, LocalBackend, LogSink, MediaType, NotificationSink, RemoteConfig,
    SystemClock, Tracker, TrackerConfig,
};
use td_remote::{AuthClient, MediaStorage, RemoteError, RestBackend, RestClient, Session};

pub struct Context {
    pub config: TrackerConfig,
}

impl Context {
    /// A broken config file is reported and replaced by defaults.
    pub fn load(data_dir: &Path) -> Self {
        let config = TrackerConfig::load_or_default(data_dir);
        tracing::debug!(data_dir = %data_dir.display(), remote = config.remote.is_some(), "config loaded");
        Self { config }
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// The configured remote and a client for it.
    pub fn remote(&self) -> anyhow::Result<(&RemoteConfig, RestClient)> {
        let remote = self.config.remote.as_ref().with_context(|| {
            format!(
                "no [remote] section in {}",
                self.data_dir().join(td_goal::config::CONFIG_FILE).display()
            )
        })?;
        Ok((remote, RestClient::new(remote)?))
    }

    /// Load the saved session, refreshing it if it is about to expire.
    pub fn session(&self, client: &RestClient) -> anyhow::Result<Session> {
        let path = self.config.session_file();
        let session = Session::load(&path)?
            .ok_or(RemoteError::NotSignedIn)
            .context("run `td auth signin` first")?;
        if !session.is_expired(Utc::now()) {
            return Ok(session);
        }

        tracing::info!("session expired, refreshing");
        let refreshed = AuthClient::new(client)
            .refresh(&session)
            .context("session refresh failed; run `td auth signin` again")?;
        refreshed.save(&path)?;
        Ok(refreshed)
    }

    fn backend(&self) -> anyhow::Result<Box<dyn Backend>> {
        if self.config.remote.is_none() {
            return Ok(Box::new(LocalBackend::new(self.data_dir())?));
        }
        let (_, client) = self.remote()?;
        let session = self.session(&client)?;
        tracing::debug!(user_id = %session.user.id, "using hosted backend");
        Ok(Box::new(RestBackend::new(client, session)))
    }

    /// Open a tracker on the configured backend. Events always go to the
    /// JSONL log; `sinks` are added on top.
    pub fn open_tracker(&self, sinks: Vec<Box<dyn NotificationSink>>) -> anyhow::Result<Tracker> {
        let mut events = EventDispatcher::new();
        events.add_sink(Box::new(LogSink::new(self.config.events_log())));
        for sink in sinks {
            events.add_sink(sink);
        }
        let tracker = Tracker::open(self.backend()?, Arc::new(SystemClock), events)?;
        Ok(tracker)
    }

    /// Turn the `--media` argument into the URL stored on the journal entry.
    ///
    /// URLs are kept as given. Local files are uploaded when a remote is
    /// configured, otherwise referenced by `file://` path.
    pub fn resolve_media(&self, media: &str, media_type: MediaType) -> anyhow::Result<String> {
        let media = media.trim();
        if media.is_empty() || is_url(media) {
            return Ok(media.to_string());
        }

        let path = PathBuf::from(media)
            .canonicalize()
            .with_context(|| format!("media file not found: {}", media))?;
        match &self.config.remote {
            Some(_) => {
                let (remote, client) = self.remote()?;
                let session = self.session(&client)?;
                let url = MediaStorage::new(&client, remote.media_bucket.clone())
                    .upload(&session, &path, media_type)?;
                Ok(url)
            }
            None => Ok(format!("file://{}", path.display())),
        }
    }
}

fn is_url(s: &str) -> bool {
    ["http://", "https://", "file://"]
        .iter()
        .any(|scheme| s.starts_with(scheme))
}
