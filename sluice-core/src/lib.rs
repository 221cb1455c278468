//! Sluice Core Library
//!
//! This crate provides the foundational types for the Sluice demand-driven
//! processor-graph engine.
//!
//! # Overview
//!
//! Sluice evaluates a directed graph of processors by pulling their outputs
//! on demand. Outputs are delivered as ordered push-style event streams, and
//! repeated evaluation is avoided through a process-wide cache keyed on a
//! structural (key, validity) pair.
//!
//! # Key Components
//!
//! - **Event**: structural event model, the [`Receiver`](event::Receiver)
//!   sink trait, and the [`EventLog`](event::EventLog) record-once /
//!   replay-many buffer
//! - **Cache**: value-based cache keys with taint-propagating compound keys,
//!   equality-compared validities, and a bounded in-memory store
//! - **Context**: the ambient per-invocation [`ExecutionContext`]
//!   with its call-path stack and path-scoped transient state
//! - **Time**: a pluggable clock and deterministic duration bucketing
//!
//! # Example
//!
//! ```ignore
//! use sluice_core::prelude::*;
//!
//! let cache = Arc::new(MemoryCache::with_default_capacity());
//! let context = ExecutionContext::new(cache);
//!
//! let log = EventLog::record(|receiver| {
//!     receiver.event(&Event::StartDocument)?;
//!     receiver.event(&Event::characters("hello"))?;
//!     receiver.event(&Event::EndDocument)
//! })?;
//!
//! let mut sink = CollectingReceiver::new();
//! log.replay(&mut sink)?;
//!
//! context.destroy(true);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod context;
pub mod error;
pub mod event;
pub mod prelude;
pub mod testing;
pub mod time;
pub mod types;

// Re-export key types at crate root for convenience
pub use cache::{CacheKey, KeyValidity, MemoryCache, Validity};
pub use context::{ExecutionContext, ScopedStateKey};
pub use error::{Result, SluiceError};
pub use event::{Event, EventLog, Receiver};
pub use types::{ContextId, ProcessorId};
