//! Sluice Engine - Demand-driven graph execution.
//!
//! This crate provides the processor-graph surface on top of
//! [`sluice_core`]:
//! - The [`Processor`](graph::Processor) / [`Output`](graph::Output) port
//!   model with explicit wiring
//! - The memoizing read-through reader tying outputs to the shared cache
//! - An explicit processor-factory registry and serde graph definitions
//! - The [`Engine`](engine::Engine) driving one pull-based top-level
//!   invocation per call
//!
//! Reading a processor's named output recursively triggers reads of the
//! outputs it depends on, in whatever order the collaborator's recompute
//! logic requests them. The engine performs no cycle detection and no
//! scheduling beyond what the recursive pull induces; wiring a cycle is a
//! caller error that manifests as unbounded recursion.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod graph;
pub mod read;
pub mod registry;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::engine::{Engine, EngineSettings};
    pub use crate::graph::{
        connect, connect_validated, InputPort, Output, PortInfo, Processor, ProcessorBase,
        ValidationHook, CONFIG_PORT, DATA_PORT,
    };
    pub use crate::read::{
        input_key, input_key_validity, input_validity, is_input_cached, read_input,
        read_input_log, read_through, transformer_output_key, transformer_output_validity,
        CacheStatus,
    };
    pub use crate::registry::{
        build_graph, BuiltGraph, EdgeDefinition, GraphDefinition, ProcessorDefinition,
        ProcessorRegistry,
    };
    pub use sluice_core::prelude::*;
}
