//! Per-crawl robots.txt cache
//!
//! Each host's policy is fetched once, on the first URL of that host seen by a
//! crawl, and kept for the lifetime of the crawl. A new crawl builds a new cache.

use crate::robots::{ParsedRobots, RobotsSource};
use crate::url::{host_key, origin_of};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use url::Url;

type PolicySlot = Arc<OnceCell<Arc<ParsedRobots>>>;

/// Host-keyed cache of robots policies
pub struct RobotsCache {
    source: Arc<dyn RobotsSource>,
    /// Product token matched against User-agent groups
    agent: String,
    entries: Mutex<HashMap<String, PolicySlot>>,
}

impl RobotsCache {
    /// Creates an empty cache fetching through `source`
    pub fn new(source: Arc<dyn RobotsSource>, agent: impl Into<String>) -> Self {
        Self {
            source,
            agent: agent.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the policy for the URL's host, fetching it on first use
    ///
    /// Concurrent lookups for one host share a single fetch. The map lock is
    /// released before fetching, so a slow host never blocks other hosts.
    pub async fn policy_for(&self, url: &Url) -> Arc<ParsedRobots> {
        let (Some(key), Some(origin)) = (host_key(url), origin_of(url)) else {
            return Arc::new(ParsedRobots::allow_all());
        };
        let slot = {
            let mut entries = self.entries.lock().await;
            Arc::clone(entries.entry(key.clone()).or_default())
        };

        let policy = slot
            .get_or_init(|| async {
                let policy = Arc::new(self.source.fetch_policy(&origin).await);
                tracing::debug!(
                    host = %key,
                    allow_all = policy.is_allow_all(),
                    "Cached robots policy"
                );
                policy
            })
            .await;
        Arc::clone(policy)
    }

    /// Checks whether the crawler may fetch `url`
    pub async fn is_allowed(&self, url: &Url) -> bool {
        self.policy_for(url)
            .await
            .is_allowed(url.as_str(), &self.agent)
    }

    /// Checks a bare host and path against the cached policy
    pub async fn is_path_allowed(&self, scheme: &str, host: &str, path: &str) -> bool {
        match Url::parse(&format!("{}://{}{}", scheme, host, path)) {
            Ok(url) => self.is_allowed(&url).await,
            Err(_) => true,
        }
    }

    /// Returns the Crawl-delay declared for this crawler on the URL's host
    pub async fn crawl_delay(&self, url: &Url) -> Option<Duration> {
        self.policy_for(url).await.crawl_delay(&self.agent)
    }

    /// Number of hosts whose policy has been fetched
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|slot| slot.initialized()).count()
    }

    /// Returns true if no policy has been fetched yet
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticSource {
        body: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RobotsSource for StaticSource {
        async fn fetch_policy(&self, _origin: &str) -> ParsedRobots {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ParsedRobots::from_content(self.body)
        }
    }

    fn cache_with(body: &'static str) -> (RobotsCache, Arc<StaticSource>) {
        let source = Arc::new(StaticSource {
            body,
            calls: AtomicUsize::new(0),
        });
        (RobotsCache::new(source.clone(), "LeadBot"), source)
    }

    #[tokio::test]
    async fn test_policy_fetched_once_per_host() {
        let (cache, source) = cache_with("User-agent: *\nDisallow: /private/");

        let a = Url::parse("https://ex.com/").unwrap();
        let b = Url::parse("https://ex.com/private/x").unwrap();
        assert!(cache.is_allowed(&a).await);
        assert!(!cache.is_allowed(&b).await);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let other = Url::parse("https://other.com/").unwrap();
        assert!(cache.is_allowed(&other).await);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_path_check() {
        let (cache, _) = cache_with("User-agent: *\nDisallow: /private/");
        assert!(!cache.is_path_allowed("https", "ex.com", "/private/x").await);
        assert!(cache.is_path_allowed("https", "ex.com", "/public").await);
    }

    #[tokio::test]
    async fn test_crawl_delay_lookup() {
        let (cache, _) = cache_with("User-agent: *\nCrawl-delay: 2");
        let url = Url::parse("https://ex.com/").unwrap();
        assert_eq!(cache.crawl_delay(&url).await, Some(Duration::from_secs(2)));
    }

    /// Holds back the policy of `slow.com` until released
    struct GatedSource {
        gate: tokio::sync::Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RobotsSource for GatedSource {
        async fn fetch_policy(&self, origin: &str) -> ParsedRobots {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if origin.contains("slow.com") {
                self.gate.notified().await;
            }
            ParsedRobots::allow_all()
        }
    }

    #[tokio::test]
    async fn test_slow_host_does_not_block_other_hosts() {
        let source = Arc::new(GatedSource {
            gate: tokio::sync::Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(RobotsCache::new(source.clone(), "LeadBot"));
        let slow = Url::parse("https://slow.com/").unwrap();

        let first = tokio::spawn({
            let cache = Arc::clone(&cache);
            let slow = slow.clone();
            async move { cache.is_allowed(&slow).await }
        });
        let second = tokio::spawn({
            let cache = Arc::clone(&cache);
            let slow = slow.clone();
            async move { cache.is_allowed(&slow).await }
        });
        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let fast = Url::parse("https://fast.com/").unwrap();
        let lookup = tokio::time::timeout(Duration::from_secs(5), cache.is_allowed(&fast)).await;
        assert_eq!(lookup, Ok(true));
        assert_eq!(cache.len().await, 1);

        source.gate.notify_one();
        assert!(first.await.unwrap());
        assert!(second.await.unwrap());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 2);
    }
}
