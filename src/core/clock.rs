//! Clock
//!
//! Injectable time source for expiry decisions.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Clock interface (for dependency injection).
pub trait Clock: Send + Sync {
    /// Current time in epoch milliseconds.
    fn now_ms(&self) -> u64;
}

/// Wall clock implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    /// Create new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Manually driven clock for testing.
#[derive(Debug, Default)]
pub struct MockClock {
    now_ms: AtomicU64,
}

impl MockClock {
    /// Create mock clock frozen at `now_ms`.
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
        }
    }

    /// Move the clock to an absolute time.
    pub fn set(&self, now_ms: u64) -> &Self {
        self.now_ms.store(now_ms, Ordering::SeqCst);
        self
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) -> &Self {
        self.now_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
        self
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Create system clock.
pub fn create_system_clock() -> SystemClock {
    SystemClock::new()
}

/// Create mock clock for testing.
pub fn create_mock_clock(now_ms: u64) -> MockClock {
    MockClock::new(now_ms)
}
