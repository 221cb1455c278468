//! Processor factories and declarative graph assembly.
//!
//! The registry is an explicit object owned and passed by the hosting
//! application, not a process-wide singleton. A [`GraphDefinition`] names
//! processor instances with their types and configurations plus the edges
//! wiring them, and [`build_graph`] turns it into live, connected
//! processors.

use crate::graph::{connect_validated, Processor, ValidationHook, DATA_PORT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sluice_core::context::ExecutionContext;
use sluice_core::error::{Result, SluiceError};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A factory producing a processor instance from its configuration.
pub type ProcessorFactory = Box<dyn Fn(&Value) -> Result<Arc<dyn Processor>> + Send + Sync>;

/// Lookup table from processor type names to factories.
#[derive(Default)]
pub struct ProcessorRegistry {
    factories: BTreeMap<String, ProcessorFactory>,
}

impl ProcessorRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for a type name, replacing any existing one.
    pub fn register<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn(&Value) -> Result<Arc<dyn Processor>> + Send + Sync + 'static,
    {
        self.factories.insert(type_name.into(), Box::new(factory));
    }

    /// Whether a factory is registered for a type name.
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Create a processor instance of the given type.
    pub fn create(&self, type_name: &str, config: &Value) -> Result<Arc<dyn Processor>> {
        let factory =
            self.factories
                .get(type_name)
                .ok_or_else(|| SluiceError::UnknownProcessorType {
                    type_name: type_name.to_string(),
                })?;
        factory(config)
    }
}

/// One processor instance in a graph definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorDefinition {
    /// Processor type name (e.g., "std::url-generator").
    #[serde(rename = "type")]
    pub processor_type: String,

    /// Processor-specific configuration.
    #[serde(default)]
    pub config: Value,

    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

impl ProcessorDefinition {
    /// Define a processor of a type with no configuration.
    pub fn new(processor_type: impl Into<String>) -> Self {
        Self {
            processor_type: processor_type.into(),
            config: Value::Null,
            description: None,
        }
    }

    /// Attach a configuration payload.
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }
}

/// An edge wiring one processor's output to another's input.
///
/// Endpoints are written `"processor"` or `"processor.port"`; a bare name
/// means the conventional `data` port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeDefinition {
    /// Source endpoint.
    pub from: String,
    /// Target endpoint.
    pub to: String,
}

impl EdgeDefinition {
    /// Create an edge definition.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// A declarative graph: named processors and the edges between them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDefinition {
    /// Processor instances by name.
    #[serde(default)]
    pub processors: BTreeMap<String, ProcessorDefinition>,

    /// Wiring between the instances.
    #[serde(default)]
    pub edges: Vec<EdgeDefinition>,
}

/// Live processors assembled from a [`GraphDefinition`].
pub struct BuiltGraph {
    processors: BTreeMap<String, Arc<dyn Processor>>,
}

impl std::fmt::Debug for BuiltGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltGraph")
            .field("processors", &self.processors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BuiltGraph {
    /// A processor by its instance name.
    pub fn get(&self, name: &str) -> Result<&Arc<dyn Processor>> {
        self.processors
            .get(name)
            .ok_or_else(|| SluiceError::UnknownGraphProcessor {
                endpoint: name.to_string(),
                processor: name.to_string(),
            })
    }

    /// All processors, by instance name.
    pub fn processors(&self) -> impl Iterator<Item = (&str, &Arc<dyn Processor>)> {
        self.processors
            .iter()
            .map(|(name, processor)| (name.as_str(), processor))
    }

    /// Reset every processor for a fresh invocation.
    pub fn reset_all(&self, context: &Arc<ExecutionContext>) -> Result<()> {
        for processor in self.processors.values() {
            processor.reset(context)?;
        }
        Ok(())
    }
}

fn parse_endpoint(raw: &str) -> Result<(&str, &str)> {
    let (processor, port) = match raw.split_once('.') {
        Some((processor, port)) => (processor, port),
        None => (raw, DATA_PORT),
    };
    if processor.is_empty() || port.is_empty() {
        return Err(SluiceError::InvalidEndpoint {
            endpoint: raw.to_string(),
        });
    }
    Ok((processor, port))
}

/// Instantiate and wire a graph definition.
///
/// Wiring errors (unknown types, unknown instances, malformed endpoints)
/// fail fast here, naming the culprit; cycles are not detected.
pub fn build_graph(
    registry: &ProcessorRegistry,
    definition: &GraphDefinition,
    hook: Option<&dyn ValidationHook>,
) -> Result<BuiltGraph> {
    let mut processors: BTreeMap<String, Arc<dyn Processor>> = BTreeMap::new();
    for (name, processor_definition) in &definition.processors {
        let processor = registry.create(
            &processor_definition.processor_type,
            &processor_definition.config,
        )?;
        debug!(
            name,
            processor_type = %processor_definition.processor_type,
            "created processor"
        );
        processors.insert(name.clone(), processor);
    }

    let lookup = |endpoint: &str, name: &str| -> Result<Arc<dyn Processor>> {
        processors
            .get(name)
            .cloned()
            .ok_or_else(|| SluiceError::UnknownGraphProcessor {
                endpoint: endpoint.to_string(),
                processor: name.to_string(),
            })
    };

    for edge in &definition.edges {
        let (from_name, from_port) = parse_endpoint(&edge.from)?;
        let (to_name, to_port) = parse_endpoint(&edge.to)?;
        let from = lookup(&edge.from, from_name)?;
        let to = lookup(&edge.to, to_name)?;
        connect_validated(from.as_ref(), from_port, to.as_ref(), to_port, hook)?;
        debug!(from = %edge.from, to = %edge.to, "connected edge");
    }

    Ok(BuiltGraph { processors })
}
