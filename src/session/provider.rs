//! External auth provider client.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// The authenticated identity behind a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub email: Option<String>,
}

/// A successful session lookup: the user plus any refreshed cookies the
/// provider wants forwarded to the client.
#[derive(Debug, Clone)]
pub struct SessionLookup {
    pub user: SessionUser,
    /// Raw `Set-Cookie` header values to copy onto the response.
    pub refreshed_cookies: Vec<String>,
}

/// Error type for session lookups. The guard treats every variant as
/// "no session" rather than an error page.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("auth provider request failed: {0}")]
    Upstream(String),

    #[error("auth provider timed out")]
    Timeout,

    #[error("auth provider returned a malformed user: {0}")]
    Malformed(String),
}

/// Current-user lookup against the auth provider.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Resolve the session carried by `cookie_header`. `Ok(None)` means no
    /// live session; `Err` means the provider could not answer.
    async fn current_user(&self, cookie_header: &str)
        -> Result<Option<SessionLookup>, SessionError>;
}

/// HTTP client for the hosted auth provider's current-user endpoint.
pub struct HttpSessionProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    email: Option<String>,
}

impl HttpSessionProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::Upstream(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn current_user(
        &self,
        cookie_header: &str,
    ) -> Result<Option<SessionLookup>, SessionError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.api_key)
            .header(reqwest::header::COOKIE, cookie_header)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SessionError::Timeout
                } else {
                    SessionError::Upstream(e.to_string())
                }
            })?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(SessionError::Upstream(format!(
                "status {}",
                response.status()
            )));
        }

        let refreshed_cookies = response
            .headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();

        let user: UserResponse = response
            .json()
            .await
            .map_err(|e| SessionError::Malformed(e.to_string()))?;

        Ok(Some(SessionLookup {
            user: SessionUser {
                id: user.id,
                email: user.email,
            },
            refreshed_cookies,
        }))
    }
}

/// Provider used when no auth backend is configured: every request is
/// anonymous.
pub struct NullSessionProvider;

#[async_trait]
impl SessionProvider for NullSessionProvider {
    async fn current_user(
        &self,
        _cookie_header: &str,
    ) -> Result<Option<SessionLookup>, SessionError> {
        Ok(None)
    }
}
