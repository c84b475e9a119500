//! Persistence for accepted submissions.
//!
//! The store is a trait so the pipeline is backed by the in-process map in
//! development and tests and by the hosted relational backend in
//! production. Row inserts are atomic on the backend: a submission is
//! either durable or absent, never partial.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use thiserror::Error;

use crate::forms::schema::{
    ApplicationForm, CommentForm, InquiryForm, NewsletterForm, ProfileForm, QuoteForm,
};

/// Error type for store operations. Detail is logged server-side; callers
/// surface only a generic message.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("backend request failed: {0}")]
    Request(String),

    #[error("backend timed out")]
    Timeout,

    #[error("backend rejected the row: {0}")]
    Rejected(String),
}

/// A newsletter subscriber row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberRow {
    pub email: String,
    /// Opaque per-subscriber unsubscribe token.
    pub token: String,
    pub active: bool,
}

/// Outcome of a newsletter upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// First signup for this address.
    Created(SubscriberRow),
    /// Previously unsubscribed address, switched back on.
    Reactivated(SubscriberRow),
    /// Address was already subscribed and active.
    AlreadyActive(SubscriberRow),
}

/// Row insert/select/update against the submissions tables.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn insert_quote(&self, quote: &QuoteForm) -> Result<(), StorageError>;

    async fn insert_inquiry(&self, inquiry: &InquiryForm) -> Result<(), StorageError>;

    async fn insert_comment(&self, comment: &CommentForm) -> Result<(), StorageError>;

    /// Insert or reactivate a subscriber. `token` is used only when a new
    /// row is created; an existing row keeps its token.
    async fn upsert_subscriber(
        &self,
        signup: &NewsletterForm,
        token: &str,
    ) -> Result<SubscribeOutcome, StorageError>;

    async fn insert_application(&self, application: &ApplicationForm)
        -> Result<(), StorageError>;

    /// Update the caller's own profile row. Row-level ownership is enforced
    /// by the backend through the user id.
    async fn update_profile(&self, user_id: &str, profile: &ProfileForm)
        -> Result<(), StorageError>;

    async fn find_subscriber_by_token(
        &self,
        token: &str,
    ) -> Result<Option<SubscriberRow>, StorageError>;

    /// Flip a subscriber inactive. Idempotent.
    async fn deactivate_subscriber(&self, token: &str) -> Result<(), StorageError>;
}
