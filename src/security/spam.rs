//! Spam classification.
//!
//! A pure classifier: rules are evaluated in order and the first match
//! wins. Callers combine the verdict with rate-limit results before
//! persisting anything.

use regex::{RegexSet, RegexSetBuilder};
use std::collections::HashSet;

use crate::config::schema::SpamConfig;

/// Why a submission was (or was not) classified as spam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpamReason {
    Honeypot,
    PatternMatch,
    DisposableDomain,
    RateLimited,
    None,
}

impl SpamReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpamReason::Honeypot => "honeypot",
            SpamReason::PatternMatch => "pattern_match",
            SpamReason::DisposableDomain => "disposable_domain",
            SpamReason::RateLimited => "rate_limited",
            SpamReason::None => "none",
        }
    }
}

/// Classification result. Derived per submission, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpamVerdict {
    pub is_spam: bool,
    pub reason: SpamReason,
}

impl SpamVerdict {
    fn spam(reason: SpamReason) -> Self {
        Self {
            is_spam: true,
            reason,
        }
    }

    fn clean() -> Self {
        Self {
            is_spam: false,
            reason: SpamReason::None,
        }
    }
}

/// Compiled spam rules. Rebuilt (and re-validated) on config hot reload.
pub struct SpamFilter {
    phrases: RegexSet,
    disposable_domains: HashSet<String>,
}

impl SpamFilter {
    /// Compile the configured phrase patterns and domain list.
    pub fn compile(config: &SpamConfig) -> Result<Self, regex::Error> {
        let phrases = RegexSetBuilder::new(&config.phrases)
            .case_insensitive(true)
            .build()?;
        let disposable_domains = config
            .disposable_domains
            .iter()
            .map(|d| d.trim().to_lowercase())
            .collect();
        Ok(Self {
            phrases,
            disposable_domains,
        })
    }

    /// Classify a submission. First match wins:
    /// honeypot, then content patterns, then disposable domain.
    pub fn classify(&self, content: &str, honeypot: &str, email_domain: &str) -> SpamVerdict {
        if !honeypot.trim().is_empty() {
            return SpamVerdict::spam(SpamReason::Honeypot);
        }
        if self.phrases.is_match(content) {
            return SpamVerdict::spam(SpamReason::PatternMatch);
        }
        if self.is_disposable(email_domain) {
            return SpamVerdict::spam(SpamReason::DisposableDomain);
        }
        SpamVerdict::clean()
    }

    /// Case-insensitive exact match against the deny-list.
    pub fn is_disposable(&self, domain: &str) -> bool {
        !domain.is_empty() && self.disposable_domains.contains(&domain.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> SpamFilter {
        SpamFilter::compile(&SpamConfig::default()).unwrap()
    }

    #[test]
    fn clean_content_passes() {
        let verdict = filter().classify("Please collect our bins on Friday", "", "gmail.com");
        assert!(!verdict.is_spam);
        assert_eq!(verdict.reason, SpamReason::None);
    }

    #[test]
    fn honeypot_wins_over_everything() {
        // Both honeypot and disposable domain present; first rule wins.
        let verdict = filter().classify("buy viagra now", "filled", "mailinator.com");
        assert_eq!(verdict.reason, SpamReason::Honeypot);
    }

    #[test]
    fn pattern_match_is_case_insensitive() {
        let verdict = filter().classify("GET RICH QUICK working from your couch", "", "gmail.com");
        assert!(verdict.is_spam);
        assert_eq!(verdict.reason, SpamReason::PatternMatch);
    }

    #[test]
    fn pattern_wins_over_disposable() {
        let verdict = filter().classify("best casino bonuses", "", "mailinator.com");
        assert_eq!(verdict.reason, SpamReason::PatternMatch);
    }

    #[test]
    fn disposable_domain_is_matched_exactly() {
        let f = filter();
        assert_eq!(
            f.classify("hello", "", "MAILINATOR.COM").reason,
            SpamReason::DisposableDomain
        );
        // Subdomains are not exact matches.
        assert!(!f.classify("hello", "", "sub.mailinator.com").is_spam);
        assert!(!f.classify("hello", "", "").is_spam);
    }

    #[test]
    fn reload_swaps_rules() {
        let mut config = SpamConfig::default();
        config.phrases = vec![r"\bbanana\b".to_string()];
        let f = SpamFilter::compile(&config).unwrap();
        assert!(f.classify("banana offer", "", "gmail.com").is_spam);
        assert!(!f.classify("buy viagra now", "", "gmail.com").is_spam);
    }
}
