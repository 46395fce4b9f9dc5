// profile.rs - The signed-in user's public profile and avatar.
//
// One `profiles` row per account, keyed by the auth user id. Avatars live in
// their own bucket at `<user_id>/avatar.<ext>` and are overwritten in place.

use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::blocking::RequestBuilder;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use td_goal::MediaType;

use crate::client::RestClient;
use crate::error::RemoteError;
use crate::session::Session;
use crate::storage::content_type;

pub const PROFILES_TABLE: &str = "profiles";
pub const AVATAR_BUCKET: &str = "avatars";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields to change; `None` leaves a column as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.bio.is_none() && self.avatar_url.is_none()
    }
}

#[derive(Serialize)]
struct UpdateBody<'a> {
    #[serde(flatten)]
    fields: &'a ProfileUpdate,
    updated_at: String,
}

pub struct ProfileClient<'a> {
    client: &'a RestClient,
}

impl<'a> ProfileClient<'a> {
    pub fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    fn row(&self, method: Method, session: &Session) -> RequestBuilder {
        self.client
            .request(
                method,
                &format!("/rest/v1/{}", PROFILES_TABLE),
                Some(&session.access_token),
            )
            .query(&[("id", format!("eq.{}", session.user.id))])
    }

    /// The profile row, or `None` if the account has none yet.
    pub fn get(&self, session: &Session) -> Result<Option<Profile>, RemoteError> {
        let request = self.row(Method::GET, session).query(&[("select", "*")]);
        let rows: Vec<Profile> = self.client.send_json(request)?;
        Ok(rows.into_iter().next())
    }

    pub fn update(&self, session: &Session, changes: &ProfileUpdate) -> Result<Profile, RemoteError> {
        let request = self.update_request(session, changes, Utc::now());
        let rows: Vec<Profile> = self.client.send_json(request)?;
        let profile = rows.into_iter().next().ok_or_else(|| RemoteError::MalformedRow {
            table: PROFILES_TABLE,
            reason: format!("no profile for user {}", session.user.id),
        })?;
        tracing::info!(user_id = %profile.id, "profile updated");
        Ok(profile)
    }

    fn update_request(
        &self,
        session: &Session,
        changes: &ProfileUpdate,
        now: DateTime<Utc>,
    ) -> RequestBuilder {
        let body = UpdateBody {
            fields: changes,
            updated_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        self.row(Method::PATCH, session)
            .header("Prefer", "return=representation")
            .json(&body)
    }

    /// Upload an image as the user's avatar and return its public URL.
    ///
    /// Does not touch the profile row; pass the URL to [`Self::update`].
    pub fn upload_avatar(&self, session: &Session, file: &Path) -> Result<String, RemoteError> {
        let bytes = fs::read(file).map_err(|source| RemoteError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        let ext = file
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "jpg".to_string());
        let object = avatar_object(session.user.id, &ext);
        self.client
            .send(self.avatar_request(session, &object, &ext).body(bytes))?;

        let url = self.client.endpoint(&format!(
            "/storage/v1/object/public/{}/{}",
            AVATAR_BUCKET, object
        ));
        tracing::info!("avatar uploaded to {}", url);
        Ok(url)
    }

    fn avatar_request(&self, session: &Session, object: &str, ext: &str) -> RequestBuilder {
        self.client
            .request(
                Method::POST,
                &format!("/storage/v1/object/{}/{}", AVATAR_BUCKET, object),
                Some(&session.access_token),
            )
            .header("content-type", content_type(ext, MediaType::Photo))
            .header("x-upsert", "true")
    }
}

fn avatar_object(user_id: Uuid, ext: &str) -> String {
    format!("{}/avatar.{}", user_id, ext)
}
