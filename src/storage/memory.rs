//! In-process store for development and tests.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Mutex;

use crate::forms::schema::{
    ApplicationForm, CommentForm, InquiryForm, NewsletterForm, ProfileForm, QuoteForm,
};
use crate::storage::{StorageError, SubmissionStore, SubscribeOutcome, SubscriberRow};

/// DashMap/Vec-backed store. Rows live for the process lifetime.
#[derive(Default)]
pub struct MemoryStore {
    quotes: Mutex<Vec<QuoteForm>>,
    inquiries: Mutex<Vec<InquiryForm>>,
    comments: Mutex<Vec<CommentForm>>,
    applications: Mutex<Vec<ApplicationForm>>,
    profiles: DashMap<String, ProfileForm>,
    subscribers: DashMap<String, SubscriberRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quote_count(&self) -> usize {
        self.quotes.lock().expect("store mutex poisoned").len()
    }

    pub fn inquiry_count(&self) -> usize {
        self.inquiries.lock().expect("store mutex poisoned").len()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.lock().expect("store mutex poisoned").len()
    }

    pub fn application_count(&self) -> usize {
        self.applications.lock().expect("store mutex poisoned").len()
    }

    pub fn subscriber(&self, email: &str) -> Option<SubscriberRow> {
        self.subscribers.get(email).map(|r| r.value().clone())
    }

    pub fn profile(&self, user_id: &str) -> Option<ProfileForm> {
        self.profiles.get(user_id).map(|r| r.value().clone())
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn insert_quote(&self, quote: &QuoteForm) -> Result<(), StorageError> {
        self.quotes
            .lock()
            .expect("store mutex poisoned")
            .push(quote.clone());
        Ok(())
    }

    async fn insert_inquiry(&self, inquiry: &InquiryForm) -> Result<(), StorageError> {
        self.inquiries
            .lock()
            .expect("store mutex poisoned")
            .push(inquiry.clone());
        Ok(())
    }

    async fn insert_comment(&self, comment: &CommentForm) -> Result<(), StorageError> {
        self.comments
            .lock()
            .expect("store mutex poisoned")
            .push(comment.clone());
        Ok(())
    }

    async fn upsert_subscriber(
        &self,
        signup: &NewsletterForm,
        token: &str,
    ) -> Result<SubscribeOutcome, StorageError> {
        let mut entry = self
            .subscribers
            .entry(signup.email.clone())
            .or_insert_with(|| SubscriberRow {
                email: signup.email.clone(),
                token: token.to_string(),
                active: false,
            });
        let row = entry.value_mut();

        if row.token == token {
            row.active = true;
            return Ok(SubscribeOutcome::Created(row.clone()));
        }
        if row.active {
            return Ok(SubscribeOutcome::AlreadyActive(row.clone()));
        }
        row.active = true;
        Ok(SubscribeOutcome::Reactivated(row.clone()))
    }

    async fn insert_application(
        &self,
        application: &ApplicationForm,
    ) -> Result<(), StorageError> {
        self.applications
            .lock()
            .expect("store mutex poisoned")
            .push(application.clone());
        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: &str,
        profile: &ProfileForm,
    ) -> Result<(), StorageError> {
        self.profiles.insert(user_id.to_string(), profile.clone());
        Ok(())
    }

    async fn find_subscriber_by_token(
        &self,
        token: &str,
    ) -> Result<Option<SubscriberRow>, StorageError> {
        Ok(self
            .subscribers
            .iter()
            .find(|r| r.value().token == token)
            .map(|r| r.value().clone()))
    }

    async fn deactivate_subscriber(&self, token: &str) -> Result<(), StorageError> {
        for mut row in self.subscribers.iter_mut() {
            if row.value().token == token {
                row.value_mut().active = false;
            }
        }
        Ok(())
    }
}
