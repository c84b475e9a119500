//! Per-form-kind submission orchestration.
//!
//! Every submission walks the same gates:
//! `Received → Validated → RateChecked → SpamChecked → Persisted → Notified`,
//! or drops out `Rejected` at a gate with a reason. Validation aggregates
//! all field errors; rate-limit and spam checks only run on payloads that
//! already validated. Persistence failure surfaces as a generic message,
//! notification failure never surfaces at all.

use arc_swap::ArcSwap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::schema::{ActionLimit, AppConfig};
use crate::forms::fields::email_domain;
use crate::forms::schema::{
    ApplicationForm, CommentForm, FieldErrors, FormSubmission, InquiryForm, NewsletterForm,
    ProfileForm, QuoteForm, RawForm,
};
use crate::forms::FormKind;
use crate::notifications::{dispatch, Mailer, OutboundEmail};
use crate::observability::metrics;
use crate::security::rate_limit::{retry_after_minutes, RateLimiter};
use crate::security::spam::SpamFilter;
use crate::session::SessionUser;
use crate::storage::{SubmissionStore, SubscribeOutcome};

/// Terminal state of one submission, mapped to the wire by the handlers.
#[derive(Debug)]
pub enum SubmissionOutcome {
    Accepted { message: String },
    Invalid { field_errors: FieldErrors },
    RateLimited { retry_after_secs: u64 },
    /// Spam verdict. The submitter sees only the generic failure message.
    Rejected,
    /// Persistence failure. Same generic message; detail stays in the log.
    Failed,
}

/// Message shown for both spam and persistence rejections, so neither case
/// leaks detail a spammer could use.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again later.";

/// The form-submission pipeline.
pub struct FormPipeline {
    config: Arc<ArcSwap<AppConfig>>,
    spam: Arc<ArcSwap<SpamFilter>>,
    limiter: RateLimiter,
    store: Arc<dyn SubmissionStore>,
    mailer: Arc<dyn Mailer>,
}

impl FormPipeline {
    pub fn new(
        config: Arc<ArcSwap<AppConfig>>,
        spam: Arc<ArcSwap<SpamFilter>>,
        limiter: RateLimiter,
        store: Arc<dyn SubmissionStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config,
            spam,
            limiter,
            store,
            mailer,
        }
    }

    /// Replace the compiled spam rules, e.g. after a config hot reload.
    pub fn swap_spam_filter(&self, filter: SpamFilter) {
        self.spam.store(Arc::new(filter));
    }

    /// Run one raw payload through every gate.
    ///
    /// `identity` is the requester fingerprint for rate limiting; `user` is
    /// required for profile updates and ignored elsewhere.
    pub async fn submit(
        &self,
        kind: FormKind,
        raw: RawForm,
        identity: &str,
        user: Option<&SessionUser>,
    ) -> SubmissionOutcome {
        let config = self.config.load_full();

        // Validated
        let (submission, honeypot) = match parse(kind, &raw, &config) {
            Ok(parsed) => parsed,
            Err(field_errors) => {
                tracing::debug!(form_kind = %kind, fields = field_errors.len(), "Submission failed validation");
                metrics::record_submission(kind.as_str(), "invalid");
                return SubmissionOutcome::Invalid { field_errors };
            }
        };

        // RateChecked
        if config.rate_limit.enabled {
            let limit = action_limit(&config, kind);
            let decision = self.limiter.check(kind, identity, &limit);
            if !decision.allowed {
                tracing::warn!(form_kind = %kind, client = %identity, "Rate limit exceeded");
                metrics::record_rate_limited(kind.as_str());
                return SubmissionOutcome::RateLimited {
                    retry_after_secs: decision.retry_after_secs,
                };
            }
        }

        // SpamChecked. Profile updates are authenticated and carry no free
        // text worth classifying.
        if kind != FormKind::Profile {
            let verdict = self.spam.load().classify(
                submission.spam_content(),
                &honeypot,
                submission.email().map(email_domain).unwrap_or(""),
            );
            if verdict.is_spam {
                tracing::warn!(
                    form_kind = %kind,
                    client = %identity,
                    reason = verdict.reason.as_str(),
                    "Submission classified as spam"
                );
                metrics::record_spam_rejected(kind.as_str(), verdict.reason.as_str());
                return SubmissionOutcome::Rejected;
            }
        }

        // Persisted, then Notified
        match self.persist_and_notify(&submission, user, &config).await {
            Ok(message) => {
                metrics::record_submission(kind.as_str(), "accepted");
                SubmissionOutcome::Accepted { message }
            }
            Err(outcome) => outcome,
        }
    }

    async fn persist_and_notify(
        &self,
        submission: &FormSubmission,
        user: Option<&SessionUser>,
        config: &AppConfig,
    ) -> Result<String, SubmissionOutcome> {
        let kind = submission.kind();
        let persisted = match submission {
            FormSubmission::Quote(quote) => self
                .store
                .insert_quote(quote)
                .await
                .map(|()| self.notify_quote(quote, config)),
            FormSubmission::Inquiry(inquiry) => self
                .store
                .insert_inquiry(inquiry)
                .await
                .map(|()| self.notify_inquiry(inquiry, config)),
            FormSubmission::Comment(comment) => {
                self.store.insert_comment(comment).await.map(|()| {
                    "Your comment has been submitted.".to_string()
                })
            }
            FormSubmission::Newsletter(signup) => {
                let token = Uuid::new_v4().to_string();
                match self.store.upsert_subscriber(signup, &token).await {
                    Ok(outcome) => Ok(self.notify_newsletter(signup, outcome, config)),
                    Err(e) => Err(e),
                }
            }
            FormSubmission::Application(application) => self
                .store
                .insert_application(application)
                .await
                .map(|()| self.notify_application(application, config)),
            FormSubmission::Profile(profile) => {
                let Some(user) = user else {
                    tracing::error!("Profile update reached the pipeline without a session");
                    metrics::record_submission(kind.as_str(), "failed");
                    return Err(SubmissionOutcome::Failed);
                };
                self.store
                    .update_profile(&user.id, profile)
                    .await
                    .map(|()| "Profile updated.".to_string())
            }
        };

        persisted.map_err(|e| {
            tracing::error!(form_kind = %kind, error = %e, "Failed to persist submission");
            metrics::record_submission(kind.as_str(), "failed");
            SubmissionOutcome::Failed
        })
    }

    fn notify_quote(&self, quote: &QuoteForm, config: &AppConfig) -> String {
        dispatch(
            self.mailer.clone(),
            OutboundEmail {
                to: config.email.admin_to.clone(),
                subject: format!("New quote request: {}", quote.service_type),
                html: format!(
                    "<h2>New quote request</h2>\
                     <p><strong>Name:</strong> {}</p>\
                     <p><strong>Email:</strong> {}</p>\
                     <p><strong>Phone:</strong> {}</p>\
                     <p><strong>Service:</strong> {}</p>\
                     <p><strong>Location:</strong> {}</p>\
                     <p>{}</p>",
                    escape_html(&quote.name),
                    escape_html(&quote.email),
                    escape_html(quote.phone.as_deref().unwrap_or("-")),
                    escape_html(&quote.service_type),
                    escape_html(&quote.location),
                    escape_html(&quote.message),
                ),
                reply_to: Some(quote.email.clone()),
            },
        );
        "Thank you! Your quote request has been received. We will get back to you shortly."
            .to_string()
    }

    fn notify_inquiry(&self, inquiry: &InquiryForm, config: &AppConfig) -> String {
        dispatch(
            self.mailer.clone(),
            OutboundEmail {
                to: config.email.admin_to.clone(),
                subject: format!("New service inquiry: {}", inquiry.service_slug),
                html: format!(
                    "<h2>New service inquiry</h2>\
                     <p><strong>Service:</strong> {}</p>\
                     <p><strong>Name:</strong> {}</p>\
                     <p><strong>Email:</strong> {}</p>\
                     <p><strong>Phone:</strong> {}</p>\
                     <p><strong>Location:</strong> {}</p>\
                     <p>{}</p>",
                    escape_html(&inquiry.service_slug),
                    escape_html(&inquiry.name),
                    escape_html(&inquiry.email),
                    escape_html(&inquiry.phone),
                    escape_html(&inquiry.location),
                    escape_html(&inquiry.message),
                ),
                reply_to: Some(inquiry.email.clone()),
            },
        );
        "Thank you for your inquiry. Our team will contact you soon.".to_string()
    }

    fn notify_newsletter(
        &self,
        signup: &NewsletterForm,
        outcome: SubscribeOutcome,
        config: &AppConfig,
    ) -> String {
        let row = match outcome {
            SubscribeOutcome::AlreadyActive(_) => {
                return "You're already subscribed.".to_string();
            }
            SubscribeOutcome::Created(row) | SubscribeOutcome::Reactivated(row) => row,
        };

        let unsubscribe_url = format!(
            "{}/newsletter/unsubscribe?token={}",
            config.email.site_url.trim_end_matches('/'),
            row.token
        );
        dispatch(
            self.mailer.clone(),
            OutboundEmail {
                to: signup.email.clone(),
                subject: "Welcome to the WasteCare newsletter".to_string(),
                html: format!(
                    "<p>Hi {},</p>\
                     <p>You are subscribed to our {} newsletter.</p>\
                     <p><a href=\"{}\">Unsubscribe</a></p>",
                    escape_html(signup.name.as_deref().unwrap_or("there")),
                    signup.frequency.as_str(),
                    unsubscribe_url,
                ),
                reply_to: None,
            },
        );
        "You're subscribed! Check your inbox for a confirmation.".to_string()
    }

    fn notify_application(&self, application: &ApplicationForm, config: &AppConfig) -> String {
        dispatch(
            self.mailer.clone(),
            OutboundEmail {
                to: config.email.admin_to.clone(),
                subject: format!("New job application: {}", application.position),
                html: format!(
                    "<h2>New application</h2>\
                     <p><strong>Name:</strong> {}</p>\
                     <p><strong>Email:</strong> {}</p>\
                     <p><strong>Phone:</strong> {}</p>\
                     <p><strong>Position:</strong> {}</p>\
                     <p><strong>Resume:</strong> {} ({} bytes)</p>\
                     <p>{}</p>",
                    escape_html(&application.name),
                    escape_html(&application.email),
                    escape_html(&application.phone),
                    escape_html(&application.position),
                    escape_html(&application.resume.filename),
                    application.resume.size_bytes,
                    escape_html(application.cover_note.as_deref().unwrap_or("")),
                ),
                reply_to: Some(application.email.clone()),
            },
        );
        "Your application has been received.".to_string()
    }
}

fn parse(
    kind: FormKind,
    raw: &RawForm,
    config: &AppConfig,
) -> Result<(FormSubmission, String), FieldErrors> {
    match kind {
        FormKind::Quote => {
            QuoteForm::parse(raw).map(|f| (FormSubmission::Quote(f), String::new()))
        }
        FormKind::Inquiry => {
            InquiryForm::parse(raw).map(|f| (FormSubmission::Inquiry(f), String::new()))
        }
        FormKind::Comment => {
            CommentForm::parse(raw).map(|(f, hp)| (FormSubmission::Comment(f), hp))
        }
        FormKind::Newsletter => NewsletterForm::parse(raw, &config.spam.disposable_domains)
            .map(|(f, hp)| (FormSubmission::Newsletter(f), hp)),
        FormKind::Application => ApplicationForm::parse(raw, &config.uploads)
            .map(|f| (FormSubmission::Application(f), String::new())),
        FormKind::Profile => {
            ProfileForm::parse(raw).map(|f| (FormSubmission::Profile(f), String::new()))
        }
    }
}

fn action_limit(config: &AppConfig, kind: FormKind) -> ActionLimit {
    match kind {
        FormKind::Newsletter => config.rate_limit.newsletter,
        FormKind::Quote => config.rate_limit.quote,
        FormKind::Inquiry => config.rate_limit.inquiry,
        FormKind::Comment => config.rate_limit.comment,
        FormKind::Application => config.rate_limit.application,
        FormKind::Profile => config.rate_limit.profile,
    }
}

/// Minimal HTML escaping for values interpolated into notification bodies.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// The user-facing rate-limit message, with the delay rounded up to whole
/// minutes.
pub fn rate_limited_message(retry_after_secs: u64) -> String {
    let minutes = retry_after_minutes(retry_after_secs);
    if minutes == 1 {
        "Too many requests. Please try again in 1 minute.".to_string()
    } else {
        format!("Too many requests. Please try again in {minutes} minutes.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_in_notification_values() {
        assert_eq!(
            escape_html("<script>\"a & b\"</script>"),
            "&lt;script&gt;&quot;a &amp; b&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn rate_limited_message_rounds_up() {
        assert_eq!(
            rate_limited_message(30),
            "Too many requests. Please try again in 1 minute."
        );
        assert_eq!(
            rate_limited_message(601),
            "Too many requests. Please try again in 11 minutes."
        );
    }
}
