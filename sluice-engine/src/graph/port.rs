//! Ports: outputs, inputs, and declared port metadata.

use parking_lot::RwLock;
use sluice_core::cache::{CacheKey, Validity};
use sluice_core::context::ExecutionContext;
use sluice_core::error::{Result, SluiceError};
use sluice_core::event::Receiver;
use std::sync::Arc;

/// Declared metadata for an input or output port.
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name.
    pub name: String,
    /// Optional schema reference; when set and a [`ValidationHook`] is
    /// installed, bindings to this port are transparently wrapped with a
    /// validating decorator.
    pub schema: Option<String>,
}

impl PortInfo {
    /// Declare a port.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
        }
    }

    /// Attach a schema reference.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// A readable output port.
///
/// One entry point delivers the whole event stream to a receiver; `key` and
/// `validity` are independently callable, typically before `read`, to
/// support cache probing without forcing computation. Returning `None` from
/// either means "not cacheable now" and is always safe.
pub trait Output: Send + Sync {
    /// Type name of the processor owning this output.
    fn processor_type(&self) -> &str;

    /// Name of this output port.
    fn port_name(&self) -> &str;

    /// Deliver the output's event stream to `receiver`.
    ///
    /// Blocks until the stream completes or an error propagates; events
    /// arrive in exact producer order.
    fn read(&self, context: &Arc<ExecutionContext>, receiver: &mut dyn Receiver) -> Result<()>;

    /// Structural cache key for the current output content, if provable.
    fn key(&self, context: &Arc<ExecutionContext>) -> Option<CacheKey> {
        let _ = context;
        None
    }

    /// Freshness token for the current output content, if provable.
    fn validity(&self, context: &Arc<ExecutionContext>) -> Option<Validity> {
        let _ = context;
        None
    }
}

impl std::fmt::Debug for dyn Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output")
            .field("processor_type", &self.processor_type())
            .field("port_name", &self.port_name())
            .finish()
    }
}

/// An input port: a named binding point on a consuming processor.
///
/// Must be bound to exactly one upstream output before it is read.
pub struct InputPort {
    processor_type: String,
    name: String,
    schema: Option<String>,
    output: RwLock<Option<Arc<dyn Output>>>,
}

impl InputPort {
    /// Create an unbound input.
    pub fn new(processor_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            processor_type: processor_type.into(),
            name: name.into(),
            schema: None,
            output: RwLock::new(None),
        }
    }

    /// Attach a schema reference.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Type name of the consuming processor.
    pub fn processor_type(&self) -> &str {
        &self.processor_type
    }

    /// Input port name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema reference declared for this input, if any.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Bind this input to an upstream output, replacing any prior binding.
    pub fn bind(&self, output: Arc<dyn Output>) {
        *self.output.write() = Some(output);
    }

    /// Whether the input has been bound.
    pub fn is_bound(&self) -> bool {
        self.output.read().is_some()
    }

    /// The bound upstream output.
    ///
    /// Errors if the input was never bound; reading an unbound input is a
    /// wiring mistake, reported with the port named.
    pub fn output(&self) -> Result<Arc<dyn Output>> {
        self.output
            .read()
            .clone()
            .ok_or_else(|| SluiceError::UnboundInput {
                processor: self.processor_type.clone(),
                name: self.name.clone(),
            })
    }
}

impl std::fmt::Debug for InputPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputPort")
            .field("processor_type", &self.processor_type)
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Decorator factory for schema-bearing inputs.
///
/// When installed, [`connect_validated`](crate::graph::connect_validated)
/// passes bindings to schema-declaring inputs through `wrap`. The returned
/// output must be invisible to the reader/writer contract: it delivers the
/// same stream (possibly validating it on the way through) and delegates
/// `key` and `validity` to the wrapped output. Validation semantics
/// themselves are a collaborator concern.
pub trait ValidationHook: Send + Sync {
    /// Wrap an output bound to an input declaring `schema`.
    fn wrap(&self, schema: &str, inner: Arc<dyn Output>) -> Arc<dyn Output>;
}
