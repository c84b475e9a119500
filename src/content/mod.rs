//! CMS content fetching and tag-indexed caching.
//!
//! The content store is read-only from here: fetch-by-slug returns a
//! document or nothing, and absence means "render the fallback", never an
//! error. Fetched documents cache in-process keyed by slug with a tag set;
//! the revalidation webhook drops entries by tag.

use dashmap::DashMap;
use serde_json::Value;
use std::time::Duration;

use crate::config::schema::ContentConfig;
use crate::observability::metrics;

/// HTTP client for the headless CMS.
pub struct ContentClient {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl ContentClient {
    pub fn new(base_url: &str, api_token: &str, timeout: Duration) -> Option<Self> {
        if base_url.is_empty() {
            return None;
        }
        let client = reqwest::Client::builder().timeout(timeout).build().ok()?;
        Some(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
        })
    }

    /// Fetch one document by type and slug. Upstream failures are logged
    /// and read as a miss so pages degrade to their fallback.
    pub async fn fetch_by_slug(&self, doc_type: &str, slug: &str) -> Option<Value> {
        let url = format!("{}/documents/{}/{}", self.base_url, doc_type, slug);
        let mut request = self.client.get(&url);
        if !self.api_token.is_empty() {
            request = request.bearer_auth(&self.api_token);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(doc_type, slug, error = %e, "Content fetch failed");
                return None;
            }
        };
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return None;
        }
        if !response.status().is_success() {
            tracing::warn!(doc_type, slug, status = %response.status(), "Content fetch failed");
            return None;
        }
        match response.json::<Value>().await {
            Ok(Value::Null) => None,
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(doc_type, slug, error = %e, "Content response malformed");
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
struct CachedDoc {
    body: Value,
    tags: Vec<String>,
}

/// Read-through content service with tag invalidation.
pub struct ContentService {
    client: Option<ContentClient>,
    cache: DashMap<String, CachedDoc>,
    cache_enabled: bool,
}

impl ContentService {
    pub fn new(config: &ContentConfig, timeout: Duration) -> Self {
        Self {
            client: ContentClient::new(&config.api_url, &config.api_token, timeout),
            cache: DashMap::new(),
            cache_enabled: config.cache_enabled,
        }
    }

    /// Fetch a document through the cache. `tags` label the cached entry
    /// for webhook invalidation.
    pub async fn fetch(&self, doc_type: &str, slug: &str, tags: &[&str]) -> Option<Value> {
        let key = format!("{doc_type}:{slug}");
        if self.cache_enabled {
            if let Some(cached) = self.cache.get(&key) {
                metrics::record_content_cache("hit");
                return Some(cached.body.clone());
            }
        }

        metrics::record_content_cache("miss");
        let doc = self.client.as_ref()?.fetch_by_slug(doc_type, slug).await?;
        if self.cache_enabled {
            self.cache.insert(
                key,
                CachedDoc {
                    body: doc.clone(),
                    tags: tags.iter().map(|t| t.to_string()).collect(),
                },
            );
        }
        Some(doc)
    }

    /// Drop every cached entry carrying any of `tags`. Returns the number
    /// of entries removed.
    pub fn invalidate(&self, tags: &[String]) -> usize {
        let before = self.cache.len();
        self.cache
            .retain(|_, doc| !doc.tags.iter().any(|t| tags.contains(t)));
        before - self.cache.len()
    }

    #[cfg(test)]
    fn seed(&self, key: &str, body: Value, tags: &[&str]) {
        self.cache.insert(
            key.to_string(),
            CachedDoc {
                body,
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service() -> ContentService {
        ContentService::new(&ContentConfig::default(), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn missing_backend_is_a_miss_not_an_error() {
        assert!(service().fetch("page", "home", &["pages"]).await.is_none());
    }

    #[test]
    fn invalidation_is_tag_scoped() {
        let service = service();
        service.seed("page:home", json!({"title": "Home"}), &["pages"]);
        service.seed("post:intro", json!({"title": "Intro"}), &["posts"]);
        service.seed("service:skip", json!({"title": "Skips"}), &["services", "pages"]);

        let dropped = service.invalidate(&["pages".to_string()]);
        assert_eq!(dropped, 2);
        assert!(service.cache.contains_key("post:intro"));
        assert!(!service.cache.contains_key("page:home"));
    }

    #[tokio::test]
    async fn cached_entry_is_served_without_a_client() {
        let service = service();
        service.seed("page:home", json!({"title": "Home"}), &["pages"]);
        let doc = service.fetch("page", "home", &["pages"]).await.unwrap();
        assert_eq!(doc["title"], "Home");
    }
}
