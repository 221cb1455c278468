//! The pull engine: top-level drivers over a processor graph.
//!
//! The engine owns the process-wide cache and clock. Each run creates an
//! [`ExecutionContext`], makes it ambient, resets the involved processors,
//! pulls the requested output into the caller's receiver, and destroys the
//! context with the success flag, whatever the outcome.

use crate::graph::Processor;
use crate::read::read_input;
use crate::registry::BuiltGraph;
use sluice_core::cache::MemoryCache;
use sluice_core::context::{AttrValue, ExecutionContext};
use sluice_core::error::Result;
use sluice_core::event::Receiver;
use sluice_core::time::{Clock, SystemClock};
use std::sync::Arc;
use tracing::{debug, debug_span};

/// Engine construction settings.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Maximum number of entries in the shared cache.
    pub cache_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cache_capacity: sluice_core::cache::DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Owns the shared cache and drives top-level invocations.
pub struct Engine {
    cache: Arc<MemoryCache>,
    clock: Arc<dyn Clock>,
}

impl Engine {
    /// Create an engine with the given settings and the system clock.
    #[must_use]
    pub fn new(settings: EngineSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Like [`new`](Self::new) but with an explicit clock.
    #[must_use]
    pub fn with_clock(settings: EngineSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: Arc::new(MemoryCache::new(settings.cache_capacity)),
            clock,
        }
    }

    /// The cache shared by every invocation of this engine.
    pub fn cache(&self) -> &Arc<MemoryCache> {
        &self.cache
    }

    fn scope<R>(&self, body: impl FnOnce(&Arc<ExecutionContext>) -> Result<R>) -> Result<R> {
        let context = ExecutionContext::with_clock(Arc::clone(&self.cache), Arc::clone(&self.clock));
        let span = debug_span!("invocation", context = %context.id());
        let _guard = span.enter();
        let result = body(&context);
        context.destroy(result.is_ok());
        result
    }

    /// Reset a processor and pull one of its outputs into `receiver`.
    pub fn run(
        &self,
        processor: &dyn Processor,
        output: &str,
        receiver: &mut dyn Receiver,
    ) -> Result<()> {
        self.scope(|context| {
            processor.reset(context)?;
            pull(context, processor, output, receiver)
        })
    }

    /// Like [`run`](Self::run) but with an external-environment handle made
    /// available to collaborator code through the ambient context.
    pub fn run_with_environment(
        &self,
        processor: &dyn Processor,
        output: &str,
        environment: AttrValue,
        receiver: &mut dyn Receiver,
    ) -> Result<()> {
        self.scope(|context| {
            context.set_external_environment(environment);
            processor.reset(context)?;
            pull(context, processor, output, receiver)
        })
    }

    /// Reset every processor in a built graph, then pull an output of the
    /// named root processor into `receiver`.
    pub fn run_graph(
        &self,
        graph: &BuiltGraph,
        root: &str,
        output: &str,
        receiver: &mut dyn Receiver,
    ) -> Result<()> {
        self.scope(|context| {
            graph.reset_all(context)?;
            let processor = graph.get(root)?;
            pull(context, processor.as_ref(), output, receiver)
        })
    }

    /// Reset a processor and start it.
    ///
    /// For side-effecting roots (serializers and the like) that drive
    /// themselves rather than expose an output.
    pub fn start(&self, processor: &dyn Processor) -> Result<()> {
        self.scope(|context| {
            processor.reset(context)?;
            processor.start(context)
        })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

fn pull(
    context: &Arc<ExecutionContext>,
    processor: &dyn Processor,
    output: &str,
    receiver: &mut dyn Receiver,
) -> Result<()> {
    debug!(
        processor = %processor.base().id(),
        output,
        "pulling output"
    );
    // A detached consumer input, not registered on the processor, so the
    // root read participates in caching like an inner connection would
    // without polluting the processor's own port table.
    let input = crate::graph::InputPort::new("sluice::driver", output);
    input.bind(processor.base().output_by_name(output)?);
    read_input(context, &input, receiver)
}
