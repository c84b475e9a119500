//! Configuration validation.
//!
//! Semantic checks on top of what serde already guarantees. Returns all
//! errors, not just the first, so an operator can fix a config file in one
//! pass. Validation is a pure function and runs before a config is accepted
//! into the system, both at startup and on hot reload.

use regex::{Regex, RegexSetBuilder};
use std::fmt;

use crate::config::schema::{ActionLimit, AppConfig};

/// A single semantic problem found in a config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `rate_limit.quote.ceiling`.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate a loaded configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(err("listener.bind_address", "not a valid socket address"));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(err("listener.max_body_bytes", "must be greater than zero"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(err("timeouts.request_secs", "must be greater than zero"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(err("timeouts.upstream_secs", "must be greater than zero"));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(err(
            "observability.metrics_address",
            "not a valid socket address",
        ));
    }

    let limits = [
        ("rate_limit.newsletter", &config.rate_limit.newsletter),
        ("rate_limit.quote", &config.rate_limit.quote),
        ("rate_limit.inquiry", &config.rate_limit.inquiry),
        ("rate_limit.comment", &config.rate_limit.comment),
        ("rate_limit.application", &config.rate_limit.application),
        ("rate_limit.profile", &config.rate_limit.profile),
    ];
    for (field, limit) in limits {
        check_limit(field, limit, &mut errors);
    }

    // Spam phrases must compile as one case-insensitive set.
    if let Err(e) = RegexSetBuilder::new(&config.spam.phrases)
        .case_insensitive(true)
        .build()
    {
        errors.push(err("spam.phrases", format!("invalid pattern: {e}")));
    }
    for domain in &config.spam.disposable_domains {
        if domain.trim().is_empty() || domain.contains('@') {
            errors.push(err(
                "spam.disposable_domains",
                format!("'{domain}' is not a bare domain"),
            ));
        }
    }

    for pattern in &config.session.protected_patterns {
        if let Err(e) = Regex::new(pattern) {
            errors.push(err(
                "session.protected_patterns",
                format!("invalid pattern '{pattern}': {e}"),
            ));
        }
    }
    for (field, path) in [
        ("session.login_path", &config.session.login_path),
        ("session.landing_path", &config.session.landing_path),
    ] {
        if !path.starts_with('/') {
            errors.push(err(field, "must be an absolute path"));
        }
    }
    if !config.session.provider_url.is_empty()
        && url::Url::parse(&config.session.provider_url).is_err()
    {
        errors.push(err("session.provider_url", "not a valid URL"));
    }

    for (field, value) in [
        ("database.url", &config.database.url),
        ("email.api_url", &config.email.api_url),
        ("content.api_url", &config.content.api_url),
    ] {
        if !value.is_empty() && url::Url::parse(value).is_err() {
            errors.push(err(field, "not a valid URL"));
        }
    }

    if config.uploads.max_resume_bytes == 0 {
        errors.push(err("uploads.max_resume_bytes", "must be greater than zero"));
    }
    if config.uploads.allowed_resume_types.is_empty() {
        errors.push(err(
            "uploads.allowed_resume_types",
            "at least one content type is required",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_limit(field: &str, limit: &ActionLimit, errors: &mut Vec<ValidationError>) {
    if limit.ceiling == 0 {
        errors.push(err(field, "ceiling must be greater than zero"));
    }
    if limit.window_secs == 0 {
        errors.push(err(field, "window_secs must be greater than zero"));
    }
}
