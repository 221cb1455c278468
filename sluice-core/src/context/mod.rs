//! Ambient execution context and call-path-scoped state.
//!
//! One [`ExecutionContext`] spans one top-level invocation. It is ambient on
//! the executing thread so deeply nested collaborator code can reach shared
//! execution-wide attributes (and the process-wide cache) without explicit
//! parameter threading. Creating a context saves and overrides the previous
//! ambient context; destroying it restores that previous context.
//!
//! Transient per-invocation state is keyed by the full ordered call-path
//! stack of enclosing processors, not merely by the innermost processor
//! instance, so that re-entering a shared processor configuration from two
//! points in one execution tree never aliases state.

use crate::cache::MemoryCache;
use crate::error::{Result, SluiceError};
use crate::time::{Clock, SystemClock};
use crate::types::{ContextId, ProcessorId};
use parking_lot::Mutex;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Well-known attribute names.
pub mod attributes {
    /// Slot for the external-environment handle (request/response/session
    /// abstraction), set once per top-level invocation by the driver.
    pub const EXTERNAL_ENVIRONMENT: &str = "sluice.external-environment";
}

/// A shared, heterogeneous attribute or state value.
pub type AttrValue = Arc<dyn Any + Send + Sync>;

/// A callback fired exactly once when the context is destroyed.
///
/// The flag reports whether the invocation succeeded.
pub type DestroyListener = Box<dyn FnOnce(bool) + Send>;

thread_local! {
    static AMBIENT: RefCell<Vec<Arc<ExecutionContext>>> = const { RefCell::new(Vec::new()) };
}

/// Identity of a call-path-scoped state slot.
///
/// Derived from the full ordered stack of enclosing processor instances
/// (outer to inner) at the moment state is established. Two calls with
/// different stacks never alias state even if the innermost processor
/// instance is identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedStateKey {
    path: Vec<ProcessorId>,
}

impl ScopedStateKey {
    fn new(path: Vec<ProcessorId>) -> Self {
        Self { path }
    }
}

impl fmt::Display for ScopedStateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.path.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

/// Attribute bag and call-path stack for one top-level invocation.
pub struct ExecutionContext {
    id: ContextId,
    cache: Arc<MemoryCache>,
    clock: Arc<dyn Clock>,
    attributes: Mutex<HashMap<String, AttrValue>>,
    listeners: Mutex<Vec<DestroyListener>>,
    frames: Mutex<Vec<ProcessorId>>,
    state: Mutex<HashMap<ScopedStateKey, AttrValue>>,
    destroyed: AtomicBool,
}

impl ExecutionContext {
    /// Create a context and make it ambient on the calling thread, saving
    /// the previously ambient context for restore at destroy time.
    pub fn new(cache: Arc<MemoryCache>) -> Arc<Self> {
        Self::with_clock(cache, Arc::new(SystemClock))
    }

    /// Like [`new`](Self::new) but with an explicit clock.
    pub fn with_clock(cache: Arc<MemoryCache>, clock: Arc<dyn Clock>) -> Arc<Self> {
        let context = Arc::new(Self {
            id: ContextId::new(),
            cache,
            clock,
            attributes: Mutex::new(HashMap::new()),
            listeners: Mutex::new(Vec::new()),
            frames: Mutex::new(Vec::new()),
            state: Mutex::new(HashMap::new()),
            destroyed: AtomicBool::new(false),
        });
        debug!(context = %context.id, "execution context created");
        AMBIENT.with(|ambient| ambient.borrow_mut().push(Arc::clone(&context)));
        context
    }

    /// The context ambient on the calling thread.
    pub fn current() -> Result<Arc<Self>> {
        AMBIENT.with(|ambient| ambient.borrow().last().cloned())
            .ok_or(SluiceError::NoAmbientContext)
    }

    /// Identifier of this invocation.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// The process-wide cache shared by all invocations.
    pub fn cache(&self) -> &Arc<MemoryCache> {
        &self.cache
    }

    /// The wall-clock source for this invocation.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Set an execution-wide attribute.
    pub fn set_attribute(&self, name: impl Into<String>, value: AttrValue) {
        self.attributes.lock().insert(name.into(), value);
    }

    /// Get an execution-wide attribute.
    pub fn attribute(&self, name: &str) -> Option<AttrValue> {
        self.attributes.lock().get(name).cloned()
    }

    /// Typed attribute access.
    ///
    /// Errors if the attribute exists but holds a value of another type.
    pub fn attribute_as<T: Send + Sync + 'static>(&self, name: &str) -> Result<Option<Arc<T>>> {
        match self.attribute(name) {
            None => Ok(None),
            Some(value) => value
                .downcast::<T>()
                .map(Some)
                .map_err(|_| SluiceError::AttributeType {
                    name: name.to_string(),
                }),
        }
    }

    /// Set the external-environment handle for this invocation.
    pub fn set_external_environment(&self, environment: AttrValue) {
        self.set_attribute(attributes::EXTERNAL_ENVIRONMENT, environment);
    }

    /// Typed access to the external-environment handle.
    pub fn external_environment_as<T: Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>> {
        self.attribute_as(attributes::EXTERNAL_ENVIRONMENT)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Register a listener fired exactly once at destroy time.
    pub fn on_destroy(&self, listener: impl FnOnce(bool) + Send + 'static) {
        self.listeners.lock().push(Box::new(listener));
    }

    /// Destroy the context.
    ///
    /// Idempotent: only the first call has any effect. Every registered
    /// destroy listener runs exactly once with the success flag, then the
    /// previously ambient context is restored on this thread.
    pub fn destroy(&self, success: bool) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(context = %self.id, success, "execution context destroyed");
        let listeners = std::mem::take(&mut *self.listeners.lock());
        for listener in listeners {
            listener(success);
        }
        AMBIENT.with(|ambient| {
            let mut stack = ambient.borrow_mut();
            if let Some(position) = stack
                .iter()
                .rposition(|context| std::ptr::eq(Arc::as_ptr(context), self))
            {
                stack.remove(position);
            }
        });
    }

    /// Whether the context has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Call-path stack and scoped state
    // =========================================================================

    /// Push a processor onto the call-path stack.
    ///
    /// Container processors do this around reads of their children.
    pub fn push_frame(&self, processor: ProcessorId) {
        self.frames.lock().push(processor);
    }

    /// Pop a processor off the call-path stack.
    ///
    /// Errors if `processor` is not on top of the stack.
    pub fn pop_frame(&self, processor: ProcessorId) -> Result<()> {
        let mut frames = self.frames.lock();
        match frames.last() {
            Some(top) if *top == processor => {
                frames.pop();
                Ok(())
            }
            _ => Err(SluiceError::FrameMismatch {
                expected: processor.to_string(),
            }),
        }
    }

    /// The scoped-state key for `current` under the present call-path stack.
    pub fn scoped_key(&self, current: ProcessorId) -> ScopedStateKey {
        let mut path = self.frames.lock().clone();
        path.push(current);
        ScopedStateKey::new(path)
    }

    /// Establish state for a scoped key.
    ///
    /// Stateful processors call this from their per-invocation reset, before
    /// any read that will consult the state.
    pub fn set_state(&self, key: ScopedStateKey, value: AttrValue) {
        self.state.lock().insert(key, value);
    }

    /// Retrieve previously established state.
    ///
    /// Fails loudly when no state was established on this exact call path;
    /// this enforces the strict reset-before-use protocol.
    pub fn state(&self, key: &ScopedStateKey) -> Result<AttrValue> {
        self.state
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| SluiceError::NoState {
                path: key.to_string(),
            })
    }

    /// Typed variant of [`state`](Self::state).
    pub fn state_as<T: Send + Sync + 'static>(&self, key: &ScopedStateKey) -> Result<Arc<T>> {
        self.state(key)?
            .downcast::<T>()
            .map_err(|_| SluiceError::StateType {
                path: key.to_string(),
            })
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id)
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}
