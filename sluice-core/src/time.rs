//! Time source abstraction and duration bucketing.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Pluggable wall-clock source.
///
/// Production code uses [`SystemClock`]; tests inject
/// [`MockClock`](crate::testing::MockClock) for deterministic time.
pub trait Clock: Send + Sync {
    /// Current system time as milliseconds since the UNIX epoch.
    fn now_millis(&self) -> u64;
}

/// The real system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Start of the duration bucket containing `now_millis`.
///
/// `bucket_start = now - (now mod duration_millis)`, so every instant within
/// one bucket maps to the same deterministic value. A zero duration degrades
/// to `now` itself (every read its own bucket).
#[must_use]
pub fn bucket_start(now_millis: u64, duration: Duration) -> u64 {
    let duration_millis = duration.as_millis() as u64;
    if duration_millis == 0 {
        now_millis
    } else {
        now_millis - (now_millis % duration_millis)
    }
}
