// storage.rs - Media upload to the hosted blob store.

use std::fs;
use std::path::Path;

use reqwest::Method;
use uuid::Uuid;

use td_goal::MediaType;

use crate::client::RestClient;
use crate::error::RemoteError;
use crate::session::Session;

pub struct MediaStorage<'a> {
    client: &'a RestClient,
    bucket: String,
}

impl<'a> MediaStorage<'a> {
    pub fn new(client: &'a RestClient, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Upload a local file under `<user_id>/<random>.<ext>` and return its
    /// public URL.
    pub fn upload(
        &self,
        session: &Session,
        file: &Path,
        media_type: MediaType,
    ) -> Result<String, RemoteError> {
        let bytes = fs::read(file).map_err(|source| RemoteError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        let ext = file
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| default_extension(media_type).to_string());
        let object = format!("{}/{}.{}", session.user.id, Uuid::new_v4(), ext);

        let request = self
            .client
            .request(
                Method::POST,
                &format!("/storage/v1/object/{}/{}", self.bucket, object),
                Some(&session.access_token),
            )
            .header("content-type", content_type(&ext, media_type))
            .header("x-upsert", "true")
            .body(bytes);
        self.client.send(request)?;

        let url = self.public_url(&object);
        tracing::info!("uploaded {} to {}", file.display(), url);
        Ok(url)
    }

    pub fn public_url(&self, object: &str) -> String {
        self.client
            .endpoint(&format!("/storage/v1/object/public/{}/{}", self.bucket, object))
    }
}

fn default_extension(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Photo => "jpg",
        MediaType::Video => "mp4",
    }
}

pub(crate) fn content_type(ext: &str, media_type: MediaType) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        _ => match media_type {
            MediaType::Photo => "image/*",
            MediaType::Video => "video/*",
        },
    }
}
