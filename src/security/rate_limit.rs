//! Fixed-window rate limiting keyed by (form kind, identity fingerprint).
//!
//! The counter store is an injected trait so tests run against the
//! in-process map and a deployment can swap in a shared external store.
//! Failure policy is CLOSED: when the store errors, the request is
//! rejected. Abuse prevention outranks availability for marketing forms.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::schema::ActionLimit;
use crate::forms::FormKind;

/// Error type for rate-limit store operations.
#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate-limit store unavailable: {0}")]
    Store(String),
}

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    /// Seconds until the window resets. Zero when allowed.
    pub retry_after_secs: u64,
}

/// The counter state after an increment.
#[derive(Debug, Clone, Copy)]
pub struct WindowHit {
    /// Requests observed in the current window, this one included.
    pub count: u32,
    /// Seconds elapsed since the current window started.
    pub elapsed_secs: u64,
}

/// Atomic increment-or-create per key. Implementations must serialize
/// concurrent increments for the same key and must not leak expired keys
/// without bound.
pub trait RateStore: Send + Sync {
    fn hit(&self, key: &str, window: Duration) -> Result<WindowHit, RateLimitError>;
}

struct WindowSlot {
    count: u32,
    window_start: Instant,
    window: Duration,
}

/// Process-local counter store.
///
/// Expired windows are lazily reset on first access after expiry; a sweep
/// drops fully-expired keys once the map grows past `max_tracked` so the
/// store cannot grow without bound.
pub struct MemoryRateStore {
    slots: DashMap<String, WindowSlot>,
    max_tracked: usize,
}

impl MemoryRateStore {
    pub fn new(max_tracked: usize) -> Self {
        Self {
            slots: DashMap::new(),
            max_tracked,
        }
    }

    fn evict_expired(&self) {
        let before = self.slots.len();
        self.slots
            .retain(|_, slot| slot.window_start.elapsed() < slot.window);
        tracing::debug!(
            evicted = before - self.slots.len(),
            tracked = self.slots.len(),
            "Rate store eviction sweep"
        );
    }

    #[cfg(test)]
    pub fn tracked_keys(&self) -> usize {
        self.slots.len()
    }
}

impl RateStore for MemoryRateStore {
    fn hit(&self, key: &str, window: Duration) -> Result<WindowHit, RateLimitError> {
        if self.slots.len() > self.max_tracked {
            self.evict_expired();
        }

        // The DashMap entry guard serializes concurrent hits on one key.
        let mut slot = self.slots.entry(key.to_string()).or_insert(WindowSlot {
            count: 0,
            window_start: Instant::now(),
            window,
        });
        if slot.window_start.elapsed() >= slot.window {
            slot.count = 0;
            slot.window_start = Instant::now();
        }
        slot.window = window;
        slot.count = slot.count.saturating_add(1);

        Ok(WindowHit {
            count: slot.count,
            elapsed_secs: slot.window_start.elapsed().as_secs(),
        })
    }
}

/// Per-action request throttle.
pub struct RateLimiter {
    store: Arc<dyn RateStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateStore>) -> Self {
        Self { store }
    }

    /// Count this request against `(kind, identity)` and decide.
    ///
    /// The limit comes from the caller's current config snapshot so ceiling
    /// changes apply on hot reload without rebuilding the limiter.
    pub fn check(&self, kind: FormKind, identity: &str, limit: &ActionLimit) -> Decision {
        let key = format!("{}:{}", kind.as_str(), identity);
        let window = Duration::from_secs(limit.window_secs);

        match self.store.hit(&key, window) {
            Ok(hit) if hit.count <= limit.ceiling => Decision {
                allowed: true,
                retry_after_secs: 0,
            },
            Ok(hit) => Decision {
                allowed: false,
                retry_after_secs: limit.window_secs.saturating_sub(hit.elapsed_secs).max(1),
            },
            Err(e) => {
                // Fail CLOSED: a broken store must not open the gate.
                tracing::error!(kind = %kind, error = %e, "Rate-limit store failed, rejecting");
                Decision {
                    allowed: false,
                    retry_after_secs: limit.window_secs,
                }
            }
        }
    }
}

/// Round a retry delay up to whole minutes for display.
pub fn retry_after_minutes(retry_after_secs: u64) -> u64 {
    retry_after_secs.div_ceil(60).max(1)
}
