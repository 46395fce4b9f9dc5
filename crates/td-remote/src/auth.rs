// auth.rs - Email/password authentication against the hosted auth service.

use chrono::{Duration, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::client::RestClient;
use crate::error::RemoteError;
use crate::session::{RemoteUser, Session};

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: RemoteUser,
}

impl From<TokenResponse> for Session {
    fn from(t: TokenResponse) -> Self {
        Session {
            access_token: t.access_token,
            refresh_token: t.refresh_token,
            expires_at: Utc::now() + Duration::seconds(t.expires_in),
            user: t.user,
        }
    }
}

/// Sign-up response: a session when email confirmation is off, otherwise
/// just the pending user.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(RemoteUser),
}

/// Outcome of a sign-up.
#[derive(Debug)]
pub enum SignUp {
    SignedIn(Session),
    ConfirmationRequired(RemoteUser),
}

pub struct AuthClient<'a> {
    client: &'a RestClient,
}

impl<'a> AuthClient<'a> {
    pub fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    pub fn sign_up(&self, email: &str, password: &str, full_name: &str) -> Result<SignUp, RemoteError> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/signup", None)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name },
            }));
        let outcome = match self.client.send_json::<SignUpResponse>(request)? {
            SignUpResponse::Session(tokens) => SignUp::SignedIn(tokens.into()),
            SignUpResponse::User(user) => SignUp::ConfirmationRequired(user),
        };
        tracing::info!("signed up {}", email);
        Ok(outcome)
    }

    pub fn sign_in(&self, email: &str, password: &str) -> Result<Session, RemoteError> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/token", None)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let tokens: TokenResponse = self.client.send_json(request)?;
        tracing::info!("signed in {}", email);
        Ok(tokens.into())
    }

    /// Exchange the refresh token for a fresh session.
    pub fn refresh(&self, session: &Session) -> Result<Session, RemoteError> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/token", None)
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": session.refresh_token }));
        let tokens: TokenResponse = self.client.send_json(request)?;
        Ok(tokens.into())
    }

    pub fn sign_out(&self, session: &Session) -> Result<(), RemoteError> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/logout", Some(&session.access_token));
        self.client.send(request)
    }

    /// The user behind a session, or `None` if the session is no longer
    /// accepted.
    pub fn current_user(&self, session: &Session) -> Result<Option<RemoteUser>, RemoteError> {
        if session.is_expired(Utc::now()) {
            return Ok(None);
        }
        let request = self
            .client
            .request(Method::GET, "/auth/v1/user", Some(&session.access_token));
        match self.client.send_json::<RemoteUser>(request) {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.is_unauthorized() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
