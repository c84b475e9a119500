//! Metrics collection and exposition.
//!
//! # Metrics
//! - `forms_submissions_total` (counter): submissions by kind and outcome
//! - `forms_rate_limited_total` (counter): rejections by kind
//! - `forms_spam_rejected_total` (counter): spam verdicts by reason
//! - `guard_redirects_total` (counter): session guard redirects by cause
//! - `notifications_total` (counter): delivery attempts by outcome
//! - `content_cache_total` (counter): content cache hits/misses

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics exporter"),
    }
}

/// Count a submission reaching a terminal pipeline state.
pub fn record_submission(kind: &'static str, outcome: &'static str) {
    counter!("forms_submissions_total", "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_rate_limited(kind: &'static str) {
    counter!("forms_rate_limited_total", "kind" => kind).increment(1);
}

pub fn record_spam_rejected(kind: &'static str, reason: &'static str) {
    counter!("forms_spam_rejected_total", "kind" => kind, "reason" => reason).increment(1);
}

pub fn record_guard_redirect(cause: &'static str) {
    counter!("guard_redirects_total", "cause" => cause).increment(1);
}

pub fn record_notification(outcome: &'static str) {
    counter!("notifications_total", "outcome" => outcome).increment(1);
}

pub fn record_content_cache(result: &'static str) {
    counter!("content_cache_total", "result" => result).increment(1);
}
