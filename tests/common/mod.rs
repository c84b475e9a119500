//! Shared utilities for integration testing.
//!
//! Spawns the real router on an ephemeral port with the in-process store,
//! a recording mailer and a stubbed auth provider, then drives it with a
//! plain HTTP client.
#![allow(dead_code)]

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use wastecare_backend::config::schema::AppConfig;
use wastecare_backend::http::{AppState, HttpServer};
use wastecare_backend::notifications::{MailError, Mailer, OutboundEmail};
use wastecare_backend::session::{
    SessionError, SessionLookup, SessionProvider, SessionUser,
};
use wastecare_backend::storage::memory::MemoryStore;

/// Cookie that the stub auth provider accepts as a live session.
pub const VALID_SESSION_COOKIE: &str = "session=valid-token";

/// Set-Cookie value the stub provider "refreshes" on every lookup.
pub const REFRESHED_COOKIE: &str = "session=refreshed-token; Path=/; HttpOnly";

/// Mailer that records every send instead of delivering.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, to: &str) -> Vec<OutboundEmail> {
        self.sent()
            .into_iter()
            .filter(|e| e.to == to)
            .collect()
    }

    /// Wait until `predicate` holds over the recorded sends, or panic.
    /// Notifications are fire-and-forget, so tests poll briefly.
    pub async fn wait_for<F>(&self, predicate: F)
    where
        F: Fn(&[OutboundEmail]) -> bool,
    {
        for _ in 0..100 {
            if predicate(&self.sent()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected notification was never dispatched");
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<String, MailError> {
        self.sent.lock().unwrap().push(email);
        Ok("test-id".to_string())
    }
}

/// Auth provider stub: one well-known cookie maps to one user.
pub struct StubSessions;

#[async_trait]
impl SessionProvider for StubSessions {
    async fn current_user(
        &self,
        cookie_header: &str,
    ) -> Result<Option<SessionLookup>, SessionError> {
        if cookie_header.contains(VALID_SESSION_COOKIE) {
            Ok(Some(SessionLookup {
                user: SessionUser {
                    id: "user-1".to_string(),
                    email: Some("member@example.com".to_string()),
                },
                refreshed_cookies: vec![REFRESHED_COOKIE.to_string()],
            }))
        } else {
            Ok(None)
        }
    }
}

pub struct TestApp {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    /// Spawn with a config tuned for tests: known webhook secret, generous
    /// ceilings.
    pub async fn spawn() -> Self {
        Self::spawn_with(Self::test_config()).await
    }

    pub fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.webhook.secret = "test-secret".to_string();
        config.rate_limit.quote.ceiling = 100;
        config.rate_limit.newsletter.ceiling = 100;
        config.rate_limit.comment.ceiling = 100;
        config.rate_limit.inquiry.ceiling = 100;
        config.rate_limit.application.ceiling = 100;
        config.rate_limit.profile.ceiling = 100;
        config
    }

    pub async fn spawn_with(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());

        let state = AppState::build(
            config,
            store.clone(),
            mailer.clone(),
            Arc::new(StubSessions),
        )
        .expect("failed to build app state");

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            HttpServer::new(state).run(listener).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            addr,
            client,
            store,
            mailer,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_form(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("request failed")
    }
}
