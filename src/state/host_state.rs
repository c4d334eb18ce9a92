use std::time::{Duration, Instant};

/// Tracks the politeness state of one host during crawling
///
/// One entry per host lives in the shared rate-limit ledger. All access goes
/// through the ledger's mutex, so the methods here assume exclusive access.
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Number of requests issued to this host
    pub request_count: u32,

    /// Instant at which the most recent request was (or will be) issued
    pub last_request_time: Option<Instant>,

    /// Number of HTTP 429 responses seen from this host
    pub throttled_responses: u32,
}

impl HostState {
    /// Creates a new HostState with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next request slot and returns the instant it may be issued
    ///
    /// The slot is claimed immediately, so concurrent callers queue up behind
    /// each other one interval apart instead of all waking at the same time.
    pub fn reserve(&mut self, interval: Duration, now: Instant) -> Instant {
        let at = match self.last_request_time {
            Some(last) => std::cmp::max(now, last + interval),
            None => now,
        };
        self.last_request_time = Some(at);
        self.request_count += 1;
        at
    }

    /// Records an HTTP 429 response from this host
    pub fn record_throttled(&mut self) {
        self.throttled_responses += 1;
    }
}
