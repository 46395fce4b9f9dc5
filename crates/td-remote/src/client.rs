// client.rs - Shared HTTP plumbing for the hosted service.
//
// One blocking client per session, built from `RemoteConfig`. Every request
// carries the project API key; requests made on behalf of a user also carry
// that user's bearer token. There are no retries: a failed call is returned
// to the caller as-is.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Method;
use serde::de::DeserializeOwned;

use td_goal::RemoteConfig;

use crate::error::RemoteError;

#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RestClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a service path such as `/rest/v1/goals`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a request; `token` is the user's access token, if any.
    pub fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let bearer = token.unwrap_or(&self.api_key);
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    /// Send and decode a JSON response body.
    pub fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let response = Self::check(request.send()?)?;
        Ok(response.json()?)
    }

    /// Send and ignore the response body.
    pub fn send(&self, request: RequestBuilder) -> Result<(), RemoteError> {
        Self::check(request.send()?)?;
        Ok(())
    }

    fn check(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let endpoint = response.url().path().to_string();
        let body = response.text().unwrap_or_default();
        tracing::debug!(%endpoint, status = status.as_u16(), "request rejected");
        Err(RemoteError::Status {
            endpoint,
            status: status.as_u16(),
            body,
        })
    }
}
