//! Reading upstream outputs: event pulls and the memoizing read-through.
//!
//! Collaborators call these helpers instead of re-implementing caching or
//! buffering. A read-through probes the shared cache under the input's
//! key/validity; on a miss it invokes the recompute closure exactly once and
//! stores the result if a key/validity can be obtained afterwards
//! (recomputation may be required before content-derived keys, such as
//! digests of read data, are knowable).

use crate::graph::{InputPort, ProcessorBase};
use sluice_core::cache::{CacheKey, CacheValue, KeyValidity, Validity};
use sluice_core::context::ExecutionContext;
use sluice_core::error::Result;
use sluice_core::event::{EventLog, Receiver};
use std::sync::Arc;
use tracing::debug;

/// How a read-through obtained its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Returned from the cache; collaborators that must skip side effects on
    /// a hit check for this.
    Hit,
    /// Recomputed and stored under a key/validity.
    Stored,
    /// Recomputed; no key/validity could be obtained, nothing stored.
    Uncached,
}

/// Deliver an upstream input's event stream to a receiver.
pub fn read_input(
    context: &Arc<ExecutionContext>,
    input: &InputPort,
    receiver: &mut dyn Receiver,
) -> Result<()> {
    input.output()?.read(context, receiver)
}

/// Cache key for the content arriving on an input.
///
/// Wraps the upstream output's key with the consuming processor and port, so
/// the same output cached through different consumers yields distinct
/// entries. `None` when the input is unbound or the upstream output cannot
/// prove a key.
pub fn input_key(context: &Arc<ExecutionContext>, input: &InputPort) -> Option<CacheKey> {
    let key = input.output().ok()?.key(context)?;
    Some(CacheKey::compound_of(
        input.processor_type(),
        input.name(),
        vec![key],
    ))
}

/// Validity for the content arriving on an input, if provable.
pub fn input_validity(context: &Arc<ExecutionContext>, input: &InputPort) -> Option<Validity> {
    input.output().ok()?.validity(context)
}

/// Key and validity for an input, `None` unless both are present.
///
/// Key first: when the upstream cannot prove a key there is no point asking
/// for a validity.
pub fn input_key_validity(
    context: &Arc<ExecutionContext>,
    input: &InputPort,
) -> Option<KeyValidity> {
    let key = input_key(context, input)?;
    let validity = input_validity(context, input)?;
    Some(KeyValidity::new(key, validity))
}

/// Whether a fresh entry for this input is already in the cache.
///
/// Lets `key`/`validity` implementations avoid forcing a full read just to
/// answer a cache probe.
pub fn is_input_cached(context: &Arc<ExecutionContext>, input: &InputPort) -> bool {
    match input_key_validity(context, input) {
        Some(kv) => context.cache().find_valid(&kv.key, &kv.validity).is_some(),
        None => false,
    }
}

/// Memoizing read-through over an input.
///
/// 1. Obtain the input's key/validity; when both are present, probe the
///    cache and return a hit immediately.
/// 2. On a miss (or when the key/validity could not yet be determined),
///    invoke `recompute` exactly once.
/// 3. Re-attempt key/validity acquisition and store the result when it is
///    now available.
///
/// No cross-thread compute lock is taken: concurrent callers missing on the
/// same key may each recompute, and whichever store happens last wins. The
/// duplicated work is wasted, never incorrect.
pub fn read_through<T, F>(
    context: &Arc<ExecutionContext>,
    input: &InputPort,
    recompute: F,
) -> Result<(Arc<T>, CacheStatus)>
where
    T: Send + Sync + 'static,
    F: FnOnce(&Arc<ExecutionContext>, &InputPort) -> Result<T>,
{
    let mut key_validity = input_key_validity(context, input);

    if let Some(kv) = &key_validity {
        if let Some(value) = context.cache().find_valid_as::<T>(&kv.key, &kv.validity)? {
            debug!(key = %kv.key, "read-through: found in cache");
            return Ok((value, CacheStatus::Hit));
        }
    }

    debug!(
        processor = input.processor_type(),
        input = input.name(),
        "read-through: recomputing"
    );
    let value = Arc::new(recompute(context, input)?);

    // Recomputation may have made a content-derived key knowable.
    if key_validity.is_none() {
        key_validity = input_key_validity(context, input);
    }

    match key_validity {
        Some(kv) => {
            debug!(key = %kv.key, "read-through: stored in cache");
            let stored: CacheValue = value.clone();
            context.cache().add(kv.key, kv.validity, stored);
            Ok((value, CacheStatus::Stored))
        }
        None => Ok((value, CacheStatus::Uncached)),
    }
}

/// Read an input as a replayable [`EventLog`], through the cache.
///
/// On a miss the upstream stream is recorded exactly once; a failed
/// recording stores nothing. The returned log replays the stream any number
/// of times without touching the producer again.
pub fn read_input_log(
    context: &Arc<ExecutionContext>,
    input: &InputPort,
) -> Result<(Arc<EventLog>, CacheStatus)> {
    read_through(context, input, |context, input| {
        EventLog::record(|receiver| read_input(context, input, receiver))
    })
}

/// Compound cache key for a transformer output depending on all connected
/// inputs.
///
/// Taints to `None` the moment any input cannot prove a key. `local` adds a
/// processor-local contribution (configuration not arriving on a port);
/// pass `Some(None)` to declare local data that is currently unprovable,
/// which taints the whole key.
pub fn transformer_output_key(
    context: &Arc<ExecutionContext>,
    base: &ProcessorBase,
    port: &str,
    local: Option<Option<CacheKey>>,
) -> Option<CacheKey> {
    let mut parts = Vec::new();
    for input in base.connected_inputs() {
        parts.push(input_key(context, &input)?);
    }
    if let Some(local) = local {
        parts.push(local?);
    }
    Some(CacheKey::compound_of(base.type_name(), port, parts))
}

/// Validity sequence for a transformer output depending on all connected
/// inputs, with the same taint rule as
/// [`transformer_output_key`].
pub fn transformer_output_validity(
    context: &Arc<ExecutionContext>,
    base: &ProcessorBase,
    local: Option<Option<Validity>>,
) -> Option<Validity> {
    let mut parts = Vec::new();
    for input in base.connected_inputs() {
        parts.push(input_validity(context, &input)?);
    }
    if let Some(local) = local {
        parts.push(local?);
    }
    Some(Validity::Sequence(parts))
}
