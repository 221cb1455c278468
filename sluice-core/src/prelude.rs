//! Prelude for convenient imports.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! # Example
//!
//! ```ignore
//! use sluice_core::prelude::*;
//! ```

// Core types
pub use crate::types::{ContextId, ProcessorId};

// Error handling
pub use crate::error::{Result, SluiceError};

// Events
pub use crate::event::{
    Attribute, CollectingReceiver, Event, EventLog, NullReceiver, QName, Receiver,
};

// Cache
pub use crate::cache::{
    content_digest, CacheKey, CacheValue, KeyValidity, MemoryCache, Validity,
    DEFAULT_CACHE_CAPACITY,
};

// Context
pub use crate::context::{attributes, AttrValue, ExecutionContext, ScopedStateKey};

// Time
pub use crate::time::{bucket_start, Clock, SystemClock};
