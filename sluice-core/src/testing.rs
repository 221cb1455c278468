//! Test utilities for deterministic execution.

use crate::time::Clock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A manually-advanced clock for deterministic tests.
///
/// Time does not pass on its own; tests move it forward with
/// [`advance`](Self::advance) or pin it with [`set`](Self::set).
#[derive(Debug, Default)]
pub struct MockClock {
    millis: AtomicU64,
}

impl MockClock {
    /// Create a mock clock starting at the given epoch milliseconds.
    #[must_use]
    pub fn new(start_millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(start_millis),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        self.millis
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    /// Pin the clock to an absolute time.
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_clock_only_moves_when_told() {
        let clock = MockClock::new(1_000);
        assert_eq!(clock.now_millis(), 1_000);
        assert_eq!(clock.now_millis(), 1_000);

        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.now_millis(), 6_000);

        clock.set(42);
        assert_eq!(clock.now_millis(), 42);
    }
}
