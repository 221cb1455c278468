//! Bounded in-memory cache shared across invocations.

use super::key::CacheKey;
use super::validity::Validity;
use crate::error::{Result, SluiceError};
use lru::LruCache;
use parking_lot::Mutex;
use std::any::Any;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::trace;

/// Default maximum number of cache entries.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// A cached value: heterogeneous, shared, immutable.
pub type CacheValue = Arc<dyn Any + Send + Sync>;

struct CacheEntry {
    validity: Validity,
    value: CacheValue,
}

/// Process-wide memoization store.
///
/// One instance is shared by all concurrent top-level invocations. Lookup and
/// insert are internally synchronized; there is no mutual exclusion for
/// "compute on miss", so concurrent misses on the same key may each
/// recompute, last store wins. Entries are evicted least-recently-used once
/// the capacity is reached.
pub struct MemoryCache {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
}

impl MemoryCache {
    /// Create a cache bounded to `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Create a cache with the default capacity.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }

    /// Store a value under a key/validity pair.
    ///
    /// An existing entry under the same key is replaced along with its
    /// validity, regardless of which of the two validities is newer.
    pub fn add(&self, key: CacheKey, validity: Validity, value: CacheValue) {
        trace!(key = %key, "cache store");
        let mut entries = self.entries.lock();
        entries.put(key, CacheEntry { validity, value });
    }

    /// Look up a value that is still fresh under the requested validity.
    ///
    /// A hit promotes the entry to most-recently-used. A present entry with
    /// a different validity is a miss.
    pub fn find_valid(&self, key: &CacheKey, validity: &Validity) -> Option<CacheValue> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if Validity::is_fresh(&entry.validity, validity) => {
                trace!(key = %key, "cache hit");
                Some(Arc::clone(&entry.value))
            }
            Some(_) => {
                trace!(key = %key, "cache miss (stale validity)");
                None
            }
            None => {
                trace!(key = %key, "cache miss");
                None
            }
        }
    }

    /// Typed variant of [`find_valid`](Self::find_valid).
    ///
    /// Errors if a fresh entry exists but holds a value of another type,
    /// which indicates two collaborators disagree on what a key stores.
    pub fn find_valid_as<T: Send + Sync + 'static>(
        &self,
        key: &CacheKey,
        validity: &Validity,
    ) -> Result<Option<Arc<T>>> {
        match self.find_valid(key, validity) {
            None => Ok(None),
            Some(value) => value
                .downcast::<T>()
                .map(Some)
                .map_err(|_| SluiceError::CachedValueType {
                    key: key.to_string(),
                }),
        }
    }

    /// Remove an entry, returning whether one was present.
    pub fn remove(&self, key: &CacheKey) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
