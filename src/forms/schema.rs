//! Per-kind form payload schemas.
//!
//! Each form kind declares its exact field set and parses a raw JSON map
//! into a typed, normalized payload. Parsing aggregates ALL field errors
//! instead of failing fast so the client can render every invalid field at
//! once, and unknown fields are rejected explicitly rather than ignored.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::config::schema::UploadConfig;
use crate::forms::fields::{
    bounded_text, normalize_email, normalize_email_with_denylist, validate_name_optional,
    validate_phone, validate_phone_optional, FieldError,
};
use crate::forms::FormKind;

/// Field name to error messages, ordered for stable JSON output.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// A raw request payload: string-keyed JSON, exactly as submitted.
#[derive(Debug, Clone, Default)]
pub struct RawForm {
    map: Map<String, Value>,
}

enum RawField<'a> {
    Missing,
    Text(&'a str),
    NonText,
}

impl RawForm {
    pub fn new(map: Map<String, Value>) -> Self {
        Self { map }
    }

    /// Wrap a JSON value; anything but an object parses as an empty form
    /// (every required field will then report `Required`).
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self { map },
            _ => Self::default(),
        }
    }

    fn field(&self, key: &str) -> RawField<'_> {
        match self.map.get(key) {
            None | Some(Value::Null) => RawField::Missing,
            Some(Value::String(s)) => RawField::Text(s),
            Some(_) => RawField::NonText,
        }
    }

    fn object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.map.get(key).and_then(Value::as_object)
    }

    fn unknown_keys(&self, allowed: &[&str]) -> Vec<String> {
        self.map
            .keys()
            .filter(|k| !allowed.contains(&k.as_str()))
            .cloned()
            .collect()
    }
}

/// Collects field errors while individual validators run.
#[derive(Debug, Default)]
struct ErrorSink {
    errors: FieldErrors,
}

impl ErrorSink {
    fn push(&mut self, field: &str, error: FieldError) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(error.to_string());
    }

    fn push_message(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    /// Read a text field, recording a type error for non-string values.
    /// Missing fields read as empty; required-ness is the validator's call.
    fn text<'a>(&mut self, raw: &'a RawForm, key: &str) -> &'a str {
        match raw.field(key) {
            RawField::Missing => "",
            RawField::Text(s) => s,
            RawField::NonText => {
                self.push_message(key, "Must be text");
                ""
            }
        }
    }

    fn reject_unknown(&mut self, raw: &RawForm, allowed: &[&str]) {
        for key in raw.unknown_keys(allowed) {
            self.push_message(&key, "Unknown field");
        }
    }

    fn take<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

fn apply<T>(sink: &mut ErrorSink, field: &str, result: Result<T, FieldError>, fallback: T) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            sink.push(field, e);
            fallback
        }
    }
}

/// Newsletter delivery frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        match raw.trim().to_lowercase().as_str() {
            "daily" | "d" => Ok(Frequency::Daily),
            "weekly" | "w" => Ok(Frequency::Weekly),
            "monthly" | "m" => Ok(Frequency::Monthly),
            "" => Err(FieldError::Required),
            _ => Err(FieldError::InvalidChoice),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

/// Service quote request.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service_type: String,
    pub location: String,
    pub message: String,
}

impl QuoteForm {
    const FIELDS: &'static [&'static str] =
        &["name", "email", "phone", "serviceType", "location", "message"];

    pub fn parse(raw: &RawForm) -> Result<Self, FieldErrors> {
        let mut sink = ErrorSink::default();
        sink.reject_unknown(raw, Self::FIELDS);

        let name = sink.text(raw, "name").to_string();
        let name = apply(&mut sink, "name", bounded_text(&name, 2, 100), String::new());
        let email_raw = sink.text(raw, "email").to_string();
        let email = apply(&mut sink, "email", normalize_email(&email_raw), String::new());
        let phone_raw = sink.text(raw, "phone").to_string();
        let phone = apply(&mut sink, "phone", validate_phone_optional(&phone_raw), None);
        let service_raw = sink.text(raw, "serviceType").to_string();
        let service_type = apply(
            &mut sink,
            "serviceType",
            bounded_text(&service_raw, 2, 100),
            String::new(),
        );
        let location_raw = sink.text(raw, "location").to_string();
        let location = apply(
            &mut sink,
            "location",
            bounded_text(&location_raw, 2, 200),
            String::new(),
        );
        let message_raw = sink.text(raw, "message").to_string();
        let message = apply(
            &mut sink,
            "message",
            bounded_text(&message_raw, 20, 2000),
            String::new(),
        );

        sink.take(Self {
            name,
            email,
            phone,
            service_type,
            location,
            message,
        })
    }
}

/// Service-specific inquiry.
#[derive(Debug, Clone, Serialize)]
pub struct InquiryForm {
    pub service_slug: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub location: String,
}

impl InquiryForm {
    const FIELDS: &'static [&'static str] = &[
        "serviceSlug",
        "name",
        "email",
        "phone",
        "message",
        "location",
    ];

    pub fn parse(raw: &RawForm) -> Result<Self, FieldErrors> {
        let mut sink = ErrorSink::default();
        sink.reject_unknown(raw, Self::FIELDS);

        let slug_raw = sink.text(raw, "serviceSlug").to_string();
        let service_slug = apply(
            &mut sink,
            "serviceSlug",
            bounded_text(&slug_raw, 1, 100),
            String::new(),
        );
        let name_raw = sink.text(raw, "name").to_string();
        let name = apply(&mut sink, "name", bounded_text(&name_raw, 2, 100), String::new());
        let email_raw = sink.text(raw, "email").to_string();
        let email = apply(&mut sink, "email", normalize_email(&email_raw), String::new());
        let phone_raw = sink.text(raw, "phone").to_string();
        let phone = apply(&mut sink, "phone", validate_phone(&phone_raw), String::new());
        let message_raw = sink.text(raw, "message").to_string();
        let message = apply(
            &mut sink,
            "message",
            bounded_text(&message_raw, 20, 2000),
            String::new(),
        );
        let location_raw = sink.text(raw, "location").to_string();
        let location = apply(
            &mut sink,
            "location",
            bounded_text(&location_raw, 2, 200),
            String::new(),
        );

        sink.take(Self {
            service_slug,
            name,
            email,
            phone,
            message,
            location,
        })
    }
}

/// Blog post comment.
#[derive(Debug, Clone, Serialize)]
pub struct CommentForm {
    pub post_slug: String,
    pub name: String,
    pub email: String,
    pub content: String,
}

impl CommentForm {
    const FIELDS: &'static [&'static str] =
        &["postSlug", "name", "email", "content", "honeypot"];

    /// Returns the parsed comment plus the raw honeypot value for the spam
    /// classifier. A filled honeypot is NOT a field error; the rejection
    /// must stay generic.
    pub fn parse(raw: &RawForm) -> Result<(Self, String), FieldErrors> {
        let mut sink = ErrorSink::default();
        sink.reject_unknown(raw, Self::FIELDS);

        let honeypot = sink.text(raw, "honeypot").to_string();
        let slug_raw = sink.text(raw, "postSlug").to_string();
        let post_slug = apply(
            &mut sink,
            "postSlug",
            bounded_text(&slug_raw, 1, 100),
            String::new(),
        );
        let name_raw = sink.text(raw, "name").to_string();
        let name = apply(&mut sink, "name", bounded_text(&name_raw, 2, 100), String::new());
        let email_raw = sink.text(raw, "email").to_string();
        let email = apply(&mut sink, "email", normalize_email(&email_raw), String::new());
        let content_raw = sink.text(raw, "content").to_string();
        let content = apply(
            &mut sink,
            "content",
            bounded_text(&content_raw, 3, 1000),
            String::new(),
        );

        sink.take((
            Self {
                post_slug,
                name,
                email,
                content,
            },
            honeypot,
        ))
    }
}

/// Newsletter signup.
#[derive(Debug, Clone, Serialize)]
pub struct NewsletterForm {
    pub email: String,
    pub name: Option<String>,
    pub frequency: Frequency,
}

impl NewsletterForm {
    const FIELDS: &'static [&'static str] = &["email", "name", "frequency", "honeypot"];

    /// Returns the parsed signup plus the raw honeypot value.
    ///
    /// The disposable-domain check runs here as a field error: unlike the
    /// other kinds, a newsletter signup tells the submitter why the address
    /// was refused.
    pub fn parse(
        raw: &RawForm,
        disposable_domains: &[String],
    ) -> Result<(Self, String), FieldErrors> {
        let mut sink = ErrorSink::default();
        sink.reject_unknown(raw, Self::FIELDS);

        let honeypot = sink.text(raw, "honeypot").to_string();
        let email_raw = sink.text(raw, "email").to_string();
        let email = apply(
            &mut sink,
            "email",
            normalize_email_with_denylist(&email_raw, disposable_domains),
            String::new(),
        );
        let name_raw = sink.text(raw, "name").to_string();
        let name = apply(&mut sink, "name", validate_name_optional(&name_raw), None);
        let freq_raw = sink.text(raw, "frequency").to_string();
        let frequency = apply(
            &mut sink,
            "frequency",
            Frequency::parse(&freq_raw),
            Frequency::Weekly,
        );

        sink.take((
            Self {
                email,
                name,
                frequency,
            },
            honeypot,
        ))
    }
}

/// Resume upload metadata, checked before the submission is accepted.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeMeta {
    pub filename: String,
    pub content_type: String,
    pub size_bytes: u64,
}

/// Job application.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub cover_note: Option<String>,
    pub resume: ResumeMeta,
}

impl ApplicationForm {
    const FIELDS: &'static [&'static str] =
        &["name", "email", "phone", "position", "coverNote", "resume"];

    pub fn parse(raw: &RawForm, uploads: &UploadConfig) -> Result<Self, FieldErrors> {
        let mut sink = ErrorSink::default();
        sink.reject_unknown(raw, Self::FIELDS);

        let name_raw = sink.text(raw, "name").to_string();
        let name = apply(&mut sink, "name", bounded_text(&name_raw, 2, 100), String::new());
        let email_raw = sink.text(raw, "email").to_string();
        let email = apply(&mut sink, "email", normalize_email(&email_raw), String::new());
        let phone_raw = sink.text(raw, "phone").to_string();
        let phone = apply(&mut sink, "phone", validate_phone(&phone_raw), String::new());
        let position_raw = sink.text(raw, "position").to_string();
        let position = apply(
            &mut sink,
            "position",
            bounded_text(&position_raw, 1, 100),
            String::new(),
        );
        let note_raw = sink.text(raw, "coverNote").to_string();
        let cover_note = if note_raw.trim().is_empty() {
            None
        } else {
            Some(apply(
                &mut sink,
                "coverNote",
                bounded_text(&note_raw, 1, 4000),
                String::new(),
            ))
        };

        let resume = Self::parse_resume(raw, uploads, &mut sink);

        sink.take(Self {
            name,
            email,
            phone,
            position,
            cover_note,
            resume,
        })
    }

    fn parse_resume(raw: &RawForm, uploads: &UploadConfig, sink: &mut ErrorSink) -> ResumeMeta {
        let empty = ResumeMeta {
            filename: String::new(),
            content_type: String::new(),
            size_bytes: 0,
        };
        let Some(object) = raw.object("resume") else {
            sink.push("resume", FieldError::Required);
            return empty;
        };

        let filename = object
            .get("filename")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
            .to_string();
        if filename.is_empty() {
            sink.push("resume", FieldError::Required);
        }

        let content_type = object
            .get("contentType")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
            .to_lowercase();
        if !uploads
            .allowed_resume_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&content_type))
        {
            sink.push_message("resume", "Unsupported file type");
        }

        let size_bytes = object.get("sizeBytes").and_then(Value::as_u64).unwrap_or(0);
        if size_bytes == 0 {
            sink.push_message("resume", "File is empty");
        } else if size_bytes > uploads.max_resume_bytes {
            sink.push_message("resume", "File is too large");
        }

        ResumeMeta {
            filename,
            content_type,
            size_bytes,
        }
    }
}

/// Profile update for an authenticated user.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileForm {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl ProfileForm {
    const FIELDS: &'static [&'static str] = &["name", "phone", "address"];

    pub fn parse(raw: &RawForm) -> Result<Self, FieldErrors> {
        let mut sink = ErrorSink::default();
        sink.reject_unknown(raw, Self::FIELDS);

        let name_raw = sink.text(raw, "name").to_string();
        let name = apply(&mut sink, "name", bounded_text(&name_raw, 2, 100), String::new());
        let phone_raw = sink.text(raw, "phone").to_string();
        let phone = apply(&mut sink, "phone", validate_phone_optional(&phone_raw), None);
        let address_raw = sink.text(raw, "address").to_string();
        let address = if address_raw.trim().is_empty() {
            None
        } else {
            Some(apply(
                &mut sink,
                "address",
                bounded_text(&address_raw, 1, 200),
                String::new(),
            ))
        };

        sink.take(Self {
            name,
            phone,
            address,
        })
    }
}

/// A validated submission, tagged by kind. Immutable once constructed;
/// the pipeline persists it as-is or not at all.
#[derive(Debug, Clone)]
pub enum FormSubmission {
    Quote(QuoteForm),
    Inquiry(InquiryForm),
    Comment(CommentForm),
    Newsletter(NewsletterForm),
    Application(ApplicationForm),
    Profile(ProfileForm),
}

impl FormSubmission {
    pub fn kind(&self) -> FormKind {
        match self {
            FormSubmission::Quote(_) => FormKind::Quote,
            FormSubmission::Inquiry(_) => FormKind::Inquiry,
            FormSubmission::Comment(_) => FormKind::Comment,
            FormSubmission::Newsletter(_) => FormKind::Newsletter,
            FormSubmission::Application(_) => FormKind::Application,
            FormSubmission::Profile(_) => FormKind::Profile,
        }
    }

    /// Submitter email, when the kind carries one.
    pub fn email(&self) -> Option<&str> {
        match self {
            FormSubmission::Quote(f) => Some(&f.email),
            FormSubmission::Inquiry(f) => Some(&f.email),
            FormSubmission::Comment(f) => Some(&f.email),
            FormSubmission::Newsletter(f) => Some(&f.email),
            FormSubmission::Application(f) => Some(&f.email),
            FormSubmission::Profile(_) => None,
        }
    }

    /// The free text the phrase filter inspects.
    pub fn spam_content(&self) -> &str {
        match self {
            FormSubmission::Quote(f) => &f.message,
            FormSubmission::Inquiry(f) => &f.message,
            FormSubmission::Comment(f) => &f.content,
            FormSubmission::Newsletter(_) => "",
            FormSubmission::Application(f) => f.cover_note.as_deref().unwrap_or(""),
            FormSubmission::Profile(_) => "",
        }
    }
}
