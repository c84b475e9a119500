//! Hosted relational backend over its REST surface.
//!
//! Speaks the PostgREST-style row API: `POST /rest/v1/<table>` inserts,
//! filtered `PATCH` updates, filtered `GET` selects. Row inserts are atomic
//! on the backend. Every call carries the service API key and the shared
//! upstream timeout.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::forms::schema::{
    ApplicationForm, CommentForm, InquiryForm, NewsletterForm, ProfileForm, QuoteForm,
};
use crate::storage::{StorageError, SubmissionStore, SubscribeOutcome, SubscriberRow};

/// REST client for the hosted backend.
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SubscriberRecord {
    email: String,
    unsubscribe_token: String,
    active: bool,
}

impl From<SubscriberRecord> for SubscriberRow {
    fn from(record: SubscriberRecord) -> Self {
        Self {
            email: record.email,
            token: record.unsubscribe_token,
            active: record.active,
        }
    }
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn insert_row(
        &self,
        table: &str,
        row: &serde_json::Value,
    ) -> Result<(), StorageError> {
        let response = self
            .authed(self.client.post(self.table_url(table)))
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await
            .map_err(map_reqwest)?;

        check_status(table, response).await?;
        Ok(())
    }

    async fn select_subscriber(
        &self,
        filter: &str,
        value: &str,
    ) -> Result<Option<SubscriberRecord>, StorageError> {
        let response = self
            .authed(self.client.get(self.table_url("newsletter_subscribers")))
            .query(&[
                (filter, format!("eq.{value}")),
                ("select", "email,unsubscribe_token,active".to_string()),
            ])
            .send()
            .await
            .map_err(map_reqwest)?;

        let response = check_status("newsletter_subscribers", response).await?;
        let mut rows: Vec<SubscriberRecord> =
            response.json().await.map_err(map_reqwest)?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn patch_subscriber(
        &self,
        filter: &str,
        value: &str,
        body: &serde_json::Value,
    ) -> Result<(), StorageError> {
        let response = self
            .authed(self.client.patch(self.table_url("newsletter_subscribers")))
            .query(&[(filter, format!("eq.{value}"))])
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await
            .map_err(map_reqwest)?;

        check_status("newsletter_subscribers", response).await?;
        Ok(())
    }
}

fn map_reqwest(error: reqwest::Error) -> StorageError {
    if error.is_timeout() {
        StorageError::Timeout
    } else {
        StorageError::Request(error.to_string())
    }
}

async fn check_status(
    table: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StorageError::Rejected(format!(
        "{table}: {status}: {body}"
    )))
}

#[async_trait]
impl SubmissionStore for RestStore {
    async fn insert_quote(&self, quote: &QuoteForm) -> Result<(), StorageError> {
        self.insert_row(
            "quote_requests",
            &json!({
                "name": quote.name,
                "email": quote.email,
                "phone": quote.phone,
                "service_type": quote.service_type,
                "location": quote.location,
                "message": quote.message,
            }),
        )
        .await
    }

    async fn insert_inquiry(&self, inquiry: &InquiryForm) -> Result<(), StorageError> {
        self.insert_row(
            "service_inquiries",
            &json!({
                "service_slug": inquiry.service_slug,
                "name": inquiry.name,
                "email": inquiry.email,
                "phone": inquiry.phone,
                "message": inquiry.message,
                "location": inquiry.location,
            }),
        )
        .await
    }

    async fn insert_comment(&self, comment: &CommentForm) -> Result<(), StorageError> {
        self.insert_row(
            "comments",
            &json!({
                "post_slug": comment.post_slug,
                "name": comment.name,
                "email": comment.email,
                "content": comment.content,
            }),
        )
        .await
    }

    async fn upsert_subscriber(
        &self,
        signup: &NewsletterForm,
        token: &str,
    ) -> Result<SubscribeOutcome, StorageError> {
        match self.select_subscriber("email", &signup.email).await? {
            None => {
                self.insert_row(
                    "newsletter_subscribers",
                    &json!({
                        "email": signup.email,
                        "name": signup.name,
                        "frequency": signup.frequency.as_str(),
                        "unsubscribe_token": token,
                        "active": true,
                    }),
                )
                .await?;
                Ok(SubscribeOutcome::Created(SubscriberRow {
                    email: signup.email.clone(),
                    token: token.to_string(),
                    active: true,
                }))
            }
            Some(record) if record.active => Ok(SubscribeOutcome::AlreadyActive(record.into())),
            Some(record) => {
                self.patch_subscriber(
                    "email",
                    &signup.email,
                    &json!({
                        "active": true,
                        "frequency": signup.frequency.as_str(),
                    }),
                )
                .await?;
                let mut row: SubscriberRow = record.into();
                row.active = true;
                Ok(SubscribeOutcome::Reactivated(row))
            }
        }
    }

    async fn insert_application(
        &self,
        application: &ApplicationForm,
    ) -> Result<(), StorageError> {
        self.insert_row(
            "job_applications",
            &json!({
                "name": application.name,
                "email": application.email,
                "phone": application.phone,
                "position": application.position,
                "cover_note": application.cover_note,
                "resume_filename": application.resume.filename,
                "resume_content_type": application.resume.content_type,
                "resume_size_bytes": application.resume.size_bytes,
            }),
        )
        .await
    }

    async fn update_profile(
        &self,
        user_id: &str,
        profile: &ProfileForm,
    ) -> Result<(), StorageError> {
        let response = self
            .authed(self.client.patch(self.table_url("profiles")))
            .query(&[("id", format!("eq.{user_id}"))])
            .header("Prefer", "return=minimal")
            .json(&json!({
                "name": profile.name,
                "phone": profile.phone,
                "address": profile.address,
            }))
            .send()
            .await
            .map_err(map_reqwest)?;

        check_status("profiles", response).await?;
        Ok(())
    }

    async fn find_subscriber_by_token(
        &self,
        token: &str,
    ) -> Result<Option<SubscriberRow>, StorageError> {
        Ok(self
            .select_subscriber("unsubscribe_token", token)
            .await?
            .map(Into::into))
    }

    async fn deactivate_subscriber(&self, token: &str) -> Result<(), StorageError> {
        self.patch_subscriber("unsubscribe_token", token, &json!({ "active": false }))
            .await
    }
}
