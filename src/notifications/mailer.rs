//! Email delivery provider client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// One outbound message.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub reply_to: Option<String>,
}

/// Error type for delivery attempts.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("delivery request failed: {0}")]
    Request(String),

    #[error("delivery timed out")]
    Timeout,

    #[error("provider rejected the message: {0}")]
    Rejected(String),
}

/// Email delivery contract. Returns the provider's message id.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<String, MailError>;
}

/// HTTP JSON delivery provider (Resend-style API).
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

impl HttpMailer {
    pub fn new(
        api_url: &str,
        api_key: &str,
        from: &str,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MailError::Request(e.to_string()))?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<String, MailError> {
        let mut body = json!({
            "from": self.from,
            "to": [email.to],
            "subject": email.subject,
            "html": email.html,
        });
        if let Some(reply_to) = &email.reply_to {
            body["reply_to"] = json!(reply_to);
        }

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MailError::Timeout
                } else {
                    MailError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected(format!("{status}: {detail}")));
        }

        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| MailError::Request(e.to_string()))?;
        Ok(parsed.id)
    }
}

/// Mailer used when no provider is configured. Logs and succeeds.
pub struct NullMailer;

#[async_trait]
impl Mailer for NullMailer {
    async fn send(&self, email: OutboundEmail) -> Result<String, MailError> {
        tracing::info!(to = %email.to, subject = %email.subject, "Email delivery disabled, skipping");
        Ok("skipped".to_string())
    }
}
