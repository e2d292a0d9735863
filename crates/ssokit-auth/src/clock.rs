//! Time source for claim validation.
//!
//! `exp` and `iat` are checked against an injected [`Clock`] so verification
//! can be exercised at any instant without sleeping.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Source of the current time
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current Unix timestamp in seconds
    fn now(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Manually driven clock
///
/// Clones share the same instant, so a test can keep a handle and move time
/// forward after handing the clock to a verifier.
///
/// ```rust
/// use ssokit_auth::clock::{Clock, FixedClock};
///
/// let clock = FixedClock::new(1_000);
/// let handle = clock.clone();
/// handle.advance(60);
/// assert_eq!(clock.now(), 1_060);
/// ```
#[derive(Debug, Clone)]
pub struct FixedClock {
    timestamp: Arc<AtomicI64>,
}

impl FixedClock {
    /// Create a clock frozen at `timestamp`
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp: Arc::new(AtomicI64::new(timestamp)),
        }
    }

    /// Jump to an absolute timestamp
    pub fn set(&self, timestamp: i64) {
        self.timestamp.store(timestamp, Ordering::SeqCst);
    }

    /// Move forward by `seconds`
    pub fn advance(&self, seconds: i64) {
        self.timestamp.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.timestamp.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800);
    }

    #[test]
    fn test_fixed_clock_set() {
        let clock = FixedClock::new(10);
        clock.set(500);
        assert_eq!(clock.now(), 500);
    }
}
