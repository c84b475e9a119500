//! Abuse prevention: per-identity rate limiting and spam classification.

pub mod rate_limit;
pub mod spam;

pub use rate_limit::{MemoryRateStore, RateLimitError, RateLimiter, RateStore};
pub use spam::{SpamFilter, SpamReason, SpamVerdict};
