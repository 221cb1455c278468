//! The processor node and its port tables.

use super::port::{InputPort, Output, PortInfo};
use parking_lot::Mutex;
use sluice_core::context::{AttrValue, ExecutionContext};
use sluice_core::error::{Result, SluiceError};
use sluice_core::types::ProcessorId;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A computation node with named input and output ports.
///
/// Concrete processors embed a [`ProcessorBase`] holding the port tables and
/// expose it through [`base`](Self::base); `reset` and `start` are
/// overridden where meaningful. Processors are constructed once per pipeline
/// configuration and may be reused across many invocations; all
/// per-invocation state lives in the [`ExecutionContext`].
pub trait Processor: Send + Sync {
    /// Port tables and identity of this processor.
    fn base(&self) -> &ProcessorBase;

    /// Per-invocation reset hook.
    ///
    /// Called once before any output of this processor is read within a
    /// top-level invocation. Stateful processors establish their scoped
    /// state here; the default does nothing.
    fn reset(&self, context: &Arc<ExecutionContext>) -> Result<()> {
        let _ = context;
        Ok(())
    }

    /// Entry point for processors without outputs (serializers, senders).
    ///
    /// The default fails: most processors are read through their outputs.
    fn start(&self, context: &Arc<ExecutionContext>) -> Result<()> {
        let _ = context;
        Err(SluiceError::StartUnsupported {
            processor: self.base().type_name().to_string(),
        })
    }
}

impl std::fmt::Debug for dyn Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("type_name", &self.base().type_name())
            .finish()
    }
}

/// Identity, declared ports, and connected ports of one processor instance.
///
/// Port tables are keyed by name in sorted order so that key/validity
/// aggregation over connected inputs is deterministic across instances;
/// structural cache-key equality depends on it.
pub struct ProcessorBase {
    id: ProcessorId,
    type_name: String,
    inputs_info: Vec<PortInfo>,
    outputs_info: Vec<PortInfo>,
    inputs: Mutex<BTreeMap<String, Vec<Arc<InputPort>>>>,
    outputs: Mutex<BTreeMap<String, Arc<dyn Output>>>,
}

impl ProcessorBase {
    /// Create a base with the declared port metadata.
    pub fn new(
        type_name: impl Into<String>,
        inputs_info: Vec<PortInfo>,
        outputs_info: Vec<PortInfo>,
    ) -> Self {
        Self {
            id: ProcessorId::next(),
            type_name: type_name.into(),
            inputs_info,
            outputs_info,
            inputs: Mutex::new(BTreeMap::new()),
            outputs: Mutex::new(BTreeMap::new()),
        }
    }

    /// Unique identity of this processor instance.
    pub fn id(&self) -> ProcessorId {
        self.id
    }

    /// Type name of this processor (the "processor class").
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Declared input port metadata.
    pub fn inputs_info(&self) -> &[PortInfo] {
        &self.inputs_info
    }

    /// Declared output port metadata.
    pub fn outputs_info(&self) -> &[PortInfo] {
        &self.outputs_info
    }

    /// Declared metadata for a named input, if any.
    pub fn input_info(&self, name: &str) -> Option<&PortInfo> {
        self.inputs_info.iter().find(|info| info.name == name)
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    /// Construct and register an input port.
    ///
    /// Carries over any schema declared for the name, so wiring can insert
    /// the validating wrapper.
    pub fn create_input(&self, name: &str) -> Arc<InputPort> {
        let mut input = InputPort::new(self.type_name.clone(), name);
        if let Some(schema) = self.input_info(name).and_then(|info| info.schema.clone()) {
            input = input.with_schema(schema);
        }
        let input = Arc::new(input);
        self.add_input(Arc::clone(&input));
        input
    }

    /// Register an already-constructed input port.
    pub fn add_input(&self, input: Arc<InputPort>) {
        self.inputs
            .lock()
            .entry(input.name().to_string())
            .or_default()
            .push(input);
    }

    /// The single input connected under `name`.
    ///
    /// Fails with a descriptive wiring error unless exactly one binding
    /// exists for that name.
    pub fn input_by_name(&self, name: &str) -> Result<Arc<InputPort>> {
        let inputs = self.inputs.lock();
        match inputs.get(name).map(Vec::as_slice) {
            None | Some([]) => Err(SluiceError::MissingInput {
                processor: self.type_name.clone(),
                name: name.to_string(),
            }),
            Some([input]) => Ok(Arc::clone(input)),
            Some(many) => Err(SluiceError::AmbiguousInput {
                processor: self.type_name.clone(),
                name: name.to_string(),
                count: many.len(),
            }),
        }
    }

    /// All inputs connected under `name`, in connection order.
    ///
    /// Possibly empty; this is the entry point for legitimate fan-in.
    pub fn inputs_by_name(&self, name: &str) -> Vec<Arc<InputPort>> {
        self.inputs.lock().get(name).cloned().unwrap_or_default()
    }

    /// All connected inputs, ordered by port name then connection order.
    pub fn connected_inputs(&self) -> Vec<Arc<InputPort>> {
        self.inputs.lock().values().flatten().cloned().collect()
    }

    // =========================================================================
    // Outputs
    // =========================================================================

    /// Register an output under its port name.
    ///
    /// At most one output may exist per name.
    pub fn add_output(&self, output: Arc<dyn Output>) -> Result<()> {
        let mut outputs = self.outputs.lock();
        let name = output.port_name().to_string();
        if outputs.contains_key(&name) {
            return Err(SluiceError::DuplicateOutput {
                processor: self.type_name.clone(),
                name,
            });
        }
        outputs.insert(name, output);
        Ok(())
    }

    /// The output registered under `name`.
    pub fn output_by_name(&self, name: &str) -> Result<Arc<dyn Output>> {
        self.outputs
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| SluiceError::MissingOutput {
                processor: self.type_name.clone(),
                name: name.to_string(),
            })
    }

    // =========================================================================
    // Scoped state
    // =========================================================================

    /// Establish per-invocation state for this processor under the current
    /// call path.
    pub fn set_state(&self, context: &ExecutionContext, state: AttrValue) {
        context.set_state(context.scoped_key(self.id), state);
    }

    /// Retrieve the state established by [`set_state`](Self::set_state) on
    /// the same call path.
    pub fn state_as<T: Send + Sync + 'static>(&self, context: &ExecutionContext) -> Result<Arc<T>> {
        context.state_as(&context.scoped_key(self.id))
    }

    /// Run `body` with this processor pushed onto the call-path stack.
    ///
    /// Container processors wrap reads of their children in this so the
    /// children's scoped state is keyed under the container's path.
    pub fn execute_children<R>(
        &self,
        context: &ExecutionContext,
        body: impl FnOnce() -> Result<R>,
    ) -> Result<R> {
        context.push_frame(self.id);
        let result = body();
        let popped = context.pop_frame(self.id);
        match result {
            Ok(value) => popped.map(|_| value),
            Err(error) => Err(error),
        }
    }
}

impl std::fmt::Debug for ProcessorBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorBase")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
