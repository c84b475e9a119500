//! Form submission handling.
//!
//! `fields` holds the reusable pure validators, `schema` the per-kind
//! payload definitions, and `dispatcher` the gate pipeline that takes a raw
//! payload all the way to a persisted, notified record.

pub mod dispatcher;
pub mod fields;
pub mod schema;

use std::fmt;

/// One of the fixed submission categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    Newsletter,
    Quote,
    Inquiry,
    Comment,
    Application,
    Profile,
}

impl FormKind {
    /// Stable lowercase identifier, used for rate-limit keys, metrics
    /// labels and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::Newsletter => "newsletter",
            FormKind::Quote => "quote",
            FormKind::Inquiry => "inquiry",
            FormKind::Comment => "comment",
            FormKind::Application => "application",
            FormKind::Profile => "profile",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
