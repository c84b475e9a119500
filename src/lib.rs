//! Backend service for the WasteCare marketing site.
//!
//! Owns everything the hosted site cannot leave to presentation code: the
//! form-submission pipeline (validate, rate-limit, spam-check, persist,
//! notify), the session-aware route guard, the cache-invalidation webhook
//! and the newsletter unsubscribe endpoint.

pub mod config;
pub mod content;
pub mod forms;
pub mod http;
pub mod notifications;
pub mod observability;
pub mod routes;
pub mod security;
pub mod session;
pub mod storage;

pub use config::schema::AppConfig;
pub use forms::dispatcher::FormPipeline;
pub use http::HttpServer;
