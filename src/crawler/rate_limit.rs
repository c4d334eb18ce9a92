//! Per-host request ledger
//!
//! Every request to a host first reserves a slot in the ledger. Reservations are
//! made under one mutex, and the wait for the slot happens after the lock is
//! released, so workers targeting different hosts never block each other.

use crate::crawler::clock::Clock;
use crate::state::HostState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Shared per-host rate limiter
pub struct HostRateLimiter {
    clock: Arc<dyn Clock>,
    min_interval: Duration,
    hosts: Mutex<HashMap<String, HostState>>,
}

impl HostRateLimiter {
    /// Creates a limiter enforcing `min_interval` between requests to one host
    pub fn new(min_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            min_interval,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Effective interval for a host given its robots Crawl-delay
    pub fn interval_for(&self, crawl_delay: Option<Duration>) -> Duration {
        match crawl_delay {
            Some(delay) if delay > self.min_interval => delay,
            _ => self.min_interval,
        }
    }

    /// Waits until a request to `host` is permitted and returns the slot instant
    ///
    /// # Arguments
    ///
    /// * `host` - Host key (`host[:port]`)
    /// * `crawl_delay` - Crawl-delay from the host's robots policy, if any
    pub async fn acquire(&self, host: &str, crawl_delay: Option<Duration>) -> Instant {
        let interval = self.interval_for(crawl_delay);
        let now = self.clock.now();
        let slot = {
            let mut hosts = self.ledger();
            hosts
                .entry(host.to_string())
                .or_default()
                .reserve(interval, now)
        };

        if slot > now {
            tracing::trace!(host = %host, wait_ms = (slot - now).as_millis() as u64, "Waiting for host slot");
        }
        self.clock.sleep_until(slot).await;
        slot
    }

    /// Records a 429 response so it shows up in host statistics
    pub fn record_throttled(&self, host: &str) {
        self.ledger()
            .entry(host.to_string())
            .or_default()
            .record_throttled();
    }

    /// Number of requests reserved for `host` so far
    pub fn request_count(&self, host: &str) -> u32 {
        self.ledger()
            .get(host)
            .map(|state| state.request_count)
            .unwrap_or(0)
    }

    /// Number of 429 responses seen from `host`
    pub fn throttled_count(&self, host: &str) -> u32 {
        self.ledger()
            .get(host)
            .map(|state| state.throttled_responses)
            .unwrap_or(0)
    }

    fn ledger(&self) -> MutexGuard<'_, HashMap<String, HostState>> {
        match self.hosts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
