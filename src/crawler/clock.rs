//! Time source for rate limiting and retry backoff
//!
//! Production code uses `SystemClock`. Tests use `ManualClock`, which never
//! actually sleeps: waiting advances its virtual time and is recorded, so
//! politeness intervals can be asserted exactly.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Monotonic clock with cooperative sleeping
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;

    /// Waits until `deadline`; returns immediately if it has passed
    async fn sleep_until(&self, deadline: Instant);

    /// Waits for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by tokio timers
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, deadline: Instant) {
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug)]
struct ManualState {
    now: Instant,
    waits: Vec<Instant>,
    sleeps: Vec<Duration>,
}

/// Virtual clock for tests
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<ManualState>,
}

impl ManualClock {
    /// Creates a clock starting at the current instant
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ManualState {
                now: Instant::now(),
                waits: Vec::new(),
                sleeps: Vec::new(),
            }),
        }
    }

    /// Moves virtual time forward
    pub fn advance(&self, by: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.now += by;
        }
    }

    /// Deadlines passed to `sleep_until`, in call order
    pub fn waits(&self) -> Vec<Instant> {
        self.state
            .lock()
            .map(|state| state.waits.clone())
            .unwrap_or_default()
    }

    /// Durations passed to `sleep`, in call order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state
            .lock()
            .map(|state| state.sleeps.clone())
            .unwrap_or_default()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        match self.state.lock() {
            Ok(state) => state.now,
            Err(poisoned) => poisoned.into_inner().now,
        }
    }

    async fn sleep_until(&self, deadline: Instant) {
        if let Ok(mut state) = self.state.lock() {
            state.waits.push(deadline);
            if deadline > state.now {
                state.now = deadline;
            }
        }
        tokio::task::yield_now().await;
    }

    async fn sleep(&self, duration: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.sleeps.push(duration);
            state.now += duration;
        }
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_clock_sleep_until_advances() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.sleep_until(start + Duration::from_secs(3)).await;
        assert_eq!(clock.now() - start, Duration::from_secs(3));

        // Past deadlines do not move time backwards
        clock.sleep_until(start).await;
        assert_eq!(clock.now() - start, Duration::from_secs(3));
        assert_eq!(clock.waits().len(), 2);
    }

    #[tokio::test]
    async fn test_manual_clock_sleep_records() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.sleep(Duration::from_millis(500)).await;
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - start, Duration::from_millis(750));
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(500)]);
    }

    #[tokio::test]
    async fn test_system_clock_past_deadline_returns() {
        let clock = SystemClock;
        let past = clock.now();
        clock.sleep_until(past).await;
        assert!(clock.now() >= past);
    }
}
