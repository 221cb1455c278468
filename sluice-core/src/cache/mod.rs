//! Cache keys, validities, and the shared in-memory store.
//!
//! A computation is cacheable when it can produce both a structural
//! [`CacheKey`] and a [`Validity`] freshness token. Absence of either always
//! means "not cacheable now", never "treat as valid".

mod key;
mod store;
mod validity;

pub use key::{content_digest, CacheKey, KeyValidity};
pub use store::{CacheValue, MemoryCache, DEFAULT_CACHE_CAPACITY};
pub use validity::Validity;
