//! Freshness tokens.

use crate::time::{bucket_start, Clock};
use std::time::Duration;

/// An opaque, comparable freshness token.
///
/// Canonically a millisecond timestamp, or a recursively nested ordered
/// sequence of timestamps whose effective value is the maximum leaf. A cache
/// entry is fresh iff the validity supplied at lookup is exactly equal to the
/// validity stored at insertion; there is no staleness tolerance beyond
/// equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Validity {
    /// Milliseconds since the UNIX epoch.
    Timestamp(u64),
    /// An ordered sequence of nested validities, one per dependency.
    Sequence(Vec<Validity>),
}

impl Validity {
    /// The oldest possible validity.
    pub const ZERO: Validity = Validity::Timestamp(0);

    /// Whether a stored validity satisfies a requested one.
    #[must_use]
    pub fn is_fresh(stored: &Validity, requested: &Validity) -> bool {
        stored == requested
    }

    /// Effective value: the maximum leaf timestamp.
    ///
    /// An empty sequence has no leaves and aggregates to 0 (oldest).
    #[must_use]
    pub fn max_timestamp(&self) -> u64 {
        match self {
            Validity::Timestamp(millis) => *millis,
            Validity::Sequence(parts) => {
                parts.iter().map(Validity::max_timestamp).max().unwrap_or(0)
            }
        }
    }

    /// Normalize a duration-style specification ("repeat every H hours") to
    /// a deterministic time bucket.
    ///
    /// All reads within the same bucket observe one validity value and
    /// therefore share one cache entry; the first read in the next bucket
    /// misses.
    #[must_use]
    pub fn bucketed(clock: &dyn Clock, duration: Duration) -> Validity {
        Validity::Timestamp(bucket_start(clock.now_millis(), duration))
    }
}
