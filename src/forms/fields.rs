//! Reusable field validators.
//!
//! Pure functions: a raw string in, a normalized value or a structured
//! error out. No field validator has side effects; the dispatcher decides
//! what a failure means for the submission as a whole.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Per-field validation failure, shown to the submitter next to the field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("This field is required")]
    Required,

    #[error("Enter a valid email address")]
    InvalidEmail,

    #[error("Disposable email addresses are not accepted")]
    DisposableDomain,

    #[error("Enter a valid phone number")]
    InvalidPhone,

    #[error("Only letters, spaces and hyphens are allowed")]
    InvalidName,

    #[error("Must be at least {0} characters")]
    TooShort(usize),

    #[error("Must be at most {0} characters")]
    TooLong(usize),

    #[error("Not a recognized option")]
    InvalidChoice,

    #[error("Submission rejected")]
    SpamDetected,
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}$").expect("email pattern")
});

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z \-]*$").expect("name pattern"));

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+256\d{9}|256\d{9}|0\d{9}|\d{10,15})$").expect("phone pattern")
});

/// Trim, lower-case and check an email address.
pub fn normalize_email(raw: &str) -> Result<String, FieldError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(FieldError::Required);
    }
    if email.len() > 254 || !EMAIL_RE.is_match(&email) {
        return Err(FieldError::InvalidEmail);
    }
    Ok(email)
}

/// The domain part of a normalized email address.
pub fn email_domain(email: &str) -> &str {
    email.rsplit_once('@').map(|(_, d)| d).unwrap_or("")
}

/// Normalize an email and reject deny-listed domains.
///
/// The deny-list match is a case-insensitive exact match on the substring
/// after `@`; entries are expected lowercased already.
pub fn normalize_email_with_denylist(
    raw: &str,
    disposable_domains: &[String],
) -> Result<String, FieldError> {
    let email = normalize_email(raw)?;
    let domain = email_domain(&email);
    if disposable_domains.iter().any(|d| d.eq_ignore_ascii_case(domain)) {
        return Err(FieldError::DisposableDomain);
    }
    Ok(email)
}

/// Strip whitespace, dashes and parentheses from a phone number.
///
/// Idempotent: cleaning a cleaned number is a no-op.
pub fn clean_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect()
}

/// Validate a required phone number, returning the cleaned form.
///
/// Accepts `+256` + 9 digits, `256` + 9 digits, a leading `0` + 9 digits,
/// or a generic 10-15 digit sequence.
pub fn validate_phone(raw: &str) -> Result<String, FieldError> {
    let cleaned = clean_phone(raw);
    if cleaned.is_empty() {
        return Err(FieldError::Required);
    }
    if !PHONE_RE.is_match(&cleaned) {
        return Err(FieldError::InvalidPhone);
    }
    Ok(cleaned)
}

/// Validate an optional phone number; empty input is valid and yields None.
pub fn validate_phone_optional(raw: &str) -> Result<Option<String>, FieldError> {
    let cleaned = clean_phone(raw);
    if cleaned.is_empty() {
        return Ok(None);
    }
    if !PHONE_RE.is_match(&cleaned) {
        return Err(FieldError::InvalidPhone);
    }
    Ok(Some(cleaned))
}

/// A honeypot field must be empty. Any non-empty value rejects the whole
/// submission, not just this field.
pub fn validate_honeypot(raw: &str) -> Result<(), FieldError> {
    if raw.trim().is_empty() {
        Ok(())
    } else {
        Err(FieldError::SpamDetected)
    }
}

/// Validate an optional display name: letters, spaces and hyphens only,
/// at least two characters when present.
pub fn validate_name_optional(raw: &str) -> Result<Option<String>, FieldError> {
    let name = raw.trim();
    if name.is_empty() {
        return Ok(None);
    }
    if name.chars().count() < 2 {
        return Err(FieldError::TooShort(2));
    }
    if !NAME_RE.is_match(name) {
        return Err(FieldError::InvalidName);
    }
    Ok(Some(name.to_string()))
}

/// Validate a required free-text field within character bounds.
pub fn bounded_text(raw: &str, min: usize, max: usize) -> Result<String, FieldError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(FieldError::Required);
    }
    let chars = text.chars().count();
    if chars < min {
        return Err(FieldError::TooShort(min));
    }
    if chars > max {
        return Err(FieldError::TooLong(max));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_lowercased_and_trimmed() {
        assert_eq!(
            normalize_email("  User@Gmail.COM ").unwrap(),
            "user@gmail.com"
        );
    }

    #[test]
    fn email_rejects_malformed() {
        for raw in ["plainaddress", "a@b", "@nouser.com", "user@.com"] {
            assert_eq!(normalize_email(raw), Err(FieldError::InvalidEmail), "{raw}");
        }
        assert_eq!(normalize_email(""), Err(FieldError::Required));
    }

    #[test]
    fn email_rejects_overlong() {
        let raw = format!("{}@example.com", "a".repeat(250));
        assert_eq!(normalize_email(&raw), Err(FieldError::InvalidEmail));
    }

    #[test]
    fn denylist_match_is_case_insensitive() {
        let deny = vec!["mailinator.com".to_string()];
        assert_eq!(
            normalize_email_with_denylist("user@MAILINATOR.COM", &deny),
            Err(FieldError::DisposableDomain)
        );
        assert!(normalize_email_with_denylist("user@gmail.com", &deny).is_ok());
    }

    #[test]
    fn phone_cleaning_is_idempotent() {
        let once = clean_phone("+256 772 423 092");
        assert_eq!(once, "+256772423092");
        assert_eq!(clean_phone(&once), once);
    }

    #[test]
    fn phone_accepts_known_shapes() {
        for raw in [
            "+256772423092",
            "256772423092",
            "0772423092",
            "(077) 242-3092 9",
            "12345678901234",
        ] {
            assert!(validate_phone(raw).is_ok(), "{raw}");
        }
    }

    #[test]
    fn phone_rejects_bad_shapes() {
        assert_eq!(validate_phone("12345"), Err(FieldError::InvalidPhone));
        assert_eq!(validate_phone("+2567724"), Err(FieldError::InvalidPhone));
        assert_eq!(validate_phone(""), Err(FieldError::Required));
        assert_eq!(validate_phone("call me"), Err(FieldError::InvalidPhone));
    }

    #[test]
    fn optional_phone_accepts_empty() {
        assert_eq!(validate_phone_optional("").unwrap(), None);
        assert_eq!(validate_phone_optional("  ").unwrap(), None);
        assert_eq!(
            validate_phone_optional("0772423092").unwrap(),
            Some("0772423092".to_string())
        );
    }

    #[test]
    fn honeypot_rejects_any_content() {
        assert!(validate_honeypot("").is_ok());
        assert!(validate_honeypot("   ").is_ok());
        assert_eq!(validate_honeypot("x"), Err(FieldError::SpamDetected));
        assert_eq!(
            validate_honeypot("http://spam.example"),
            Err(FieldError::SpamDetected)
        );
    }

    #[test]
    fn name_rules() {
        assert_eq!(validate_name_optional("").unwrap(), None);
        assert_eq!(
            validate_name_optional("Mary-Jane Smith").unwrap(),
            Some("Mary-Jane Smith".to_string())
        );
        assert_eq!(validate_name_optional("X"), Err(FieldError::TooShort(2)));
        assert_eq!(
            validate_name_optional("Rob3rt"),
            Err(FieldError::InvalidName)
        );
    }

    #[test]
    fn bounded_text_limits() {
        assert_eq!(bounded_text(" hi ", 1, 10).unwrap(), "hi");
        assert_eq!(bounded_text("", 1, 10), Err(FieldError::Required));
        assert_eq!(bounded_text("hi", 5, 10), Err(FieldError::TooShort(5)));
        assert_eq!(bounded_text("hello world", 1, 5), Err(FieldError::TooLong(5)));
    }
}
