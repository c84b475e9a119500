//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the backend.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for the site backend.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Timeout configuration for inbound and outbound calls.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Per-form-kind rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Spam phrase and disposable-domain lists.
    pub spam: SpamConfig,

    /// Session guard settings (route classes, auth provider).
    pub session: SessionConfig,

    /// Relational backend (auth + tables).
    pub database: DatabaseConfig,

    /// Outbound email provider.
    pub email: EmailConfig,

    /// Headless CMS content fetching.
    pub content: ContentConfig,

    /// Cache-invalidation webhook.
    pub webhook: WebhookConfig,

    /// Job application upload constraints.
    pub uploads: UploadConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for an inbound request in seconds.
    pub request_secs: u64,

    /// Timeout for any single outbound call (auth, database, email, CMS)
    /// in seconds. Past this bound the call is treated as failed.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A fixed-window ceiling for one form kind.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ActionLimit {
    /// Maximum accepted submissions per window.
    pub ceiling: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl ActionLimit {
    const fn new(ceiling: u32, window_secs: u64) -> Self {
        Self {
            ceiling,
            window_secs,
        }
    }
}

/// Rate limiting configuration, keyed by form kind.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Evict fully-expired counters once the store tracks this many keys.
    pub max_tracked_keys: usize,

    pub newsletter: ActionLimit,
    pub quote: ActionLimit,
    pub inquiry: ActionLimit,
    pub comment: ActionLimit,
    pub application: ActionLimit,
    pub profile: ActionLimit,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_tracked_keys: 10_000,
            newsletter: ActionLimit::new(5, 600),
            quote: ActionLimit::new(3, 600),
            inquiry: ActionLimit::new(3, 600),
            comment: ActionLimit::new(5, 600),
            application: ActionLimit::new(2, 3600),
            profile: ActionLimit::new(10, 600),
        }
    }
}

/// Spam filtering data. Both lists are data, not code, and hot-reload with
/// the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpamConfig {
    /// Case-insensitive regex patterns matched against submission content.
    pub phrases: Vec<String>,

    /// Email domains known to issue throwaway addresses.
    pub disposable_domains: Vec<String>,
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            phrases: vec![
                r"\bviagra\b".to_string(),
                r"\bcialis\b".to_string(),
                r"\bcasino\b".to_string(),
                r"\bforex\b".to_string(),
                r"\bcrypto\s+invest".to_string(),
                r"get\s+rich\s+quick".to_string(),
                r"work\s+from\s+home\b".to_string(),
                r"\bloan\s+offer\b".to_string(),
                r"\bseo\s+services?\b".to_string(),
                r"click\s+here\s+now".to_string(),
            ],
            disposable_domains: vec![
                "mailinator.com".to_string(),
                "guerrillamail.com".to_string(),
                "10minutemail.com".to_string(),
                "tempmail.com".to_string(),
                "throwawaymail.com".to_string(),
                "yopmail.com".to_string(),
                "sharklasers.com".to_string(),
                "trashmail.com".to_string(),
            ],
        }
    }
}

/// Session guard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path prefixes that require a valid session.
    pub protected_prefixes: Vec<String>,

    /// Regex patterns for parameterized protected paths.
    pub protected_patterns: Vec<String>,

    /// Paths that only make sense without a session (login, register).
    pub auth_paths: Vec<String>,

    /// Where unauthenticated visitors to protected paths are sent.
    pub login_path: String,

    /// Where authenticated visitors to auth-only paths are sent.
    pub landing_path: String,

    /// Base URL of the external auth provider. Empty disables session
    /// lookup entirely (every request is treated as anonymous).
    pub provider_url: String,

    /// API key forwarded to the auth provider.
    pub provider_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            protected_prefixes: vec![
                "/dashboard".to_string(),
                "/account".to_string(),
                "/api/account".to_string(),
            ],
            protected_patterns: vec![r"^/requests/[^/]+/edit$".to_string()],
            auth_paths: vec!["/login".to_string(), "/register".to_string()],
            login_path: "/login".to_string(),
            landing_path: "/dashboard".to_string(),
            provider_url: String::new(),
            provider_key: String::new(),
        }
    }
}

/// Relational backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Base URL of the hosted backend's REST surface. Empty falls back to
    /// the in-process store (useful for development and tests).
    pub url: String,

    /// Service API key sent with every request.
    pub api_key: String,
}

/// Outbound email configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Delivery provider endpoint. Empty disables outbound email; the
    /// pipeline logs the skipped notification instead.
    pub api_url: String,

    /// Provider API key.
    pub api_key: String,

    /// From address for all outbound mail.
    pub from: String,

    /// Where admin alerts are delivered.
    pub admin_to: String,

    /// Public base URL of the site, used for unsubscribe links.
    pub site_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            from: "noreply@wastecare.example".to_string(),
            admin_to: "info@wastecare.example".to_string(),
            site_url: "https://wastecare.example".to_string(),
        }
    }
}

/// Headless CMS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Content API base URL. Empty means every lookup misses and pages
    /// render their fallback.
    pub api_url: String,

    /// Read token, if the dataset is private.
    pub api_token: String,

    /// Serve cached documents until invalidated by the webhook.
    pub cache_enabled: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_token: String::new(),
            cache_enabled: true,
        }
    }
}

/// Cache-invalidation webhook configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Shared secret carried as a query parameter by the CMS.
    pub secret: String,

    /// Document type to cache-tag mapping.
    pub tag_map: HashMap<String, Vec<String>>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        let mut tag_map = HashMap::new();
        tag_map.insert("post".to_string(), vec!["posts".to_string()]);
        tag_map.insert(
            "service".to_string(),
            vec!["services".to_string(), "pages".to_string()],
        );
        tag_map.insert("page".to_string(), vec!["pages".to_string()]);
        tag_map.insert("job".to_string(), vec!["jobs".to_string()]);
        tag_map.insert("testimonial".to_string(), vec!["pages".to_string()]);
        Self {
            secret: String::new(),
            tag_map,
        }
    }
}

/// Job application upload constraints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum resume size in bytes.
    pub max_resume_bytes: u64,

    /// Accepted resume content types.
    pub allowed_resume_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_resume_bytes: 5 * 1024 * 1024,
            allowed_resume_types: vec![
                "application/pdf".to_string(),
                "application/msword".to_string(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                    .to_string(),
                "image/png".to_string(),
                "image/jpeg".to_string(),
            ],
        }
    }
}
