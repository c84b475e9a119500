//! Route handlers.

pub mod forms;
pub mod pages;
pub mod unsubscribe;
pub mod webhook;

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}
