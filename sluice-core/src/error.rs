//! Error types for Sluice.
//!
//! This module provides strongly-typed errors with actionable context. All
//! errors name the port, processor, or call path involved so that wiring and
//! state-protocol mistakes fail with a message pointing at the culprit.

use thiserror::Error;

/// The main error type for Sluice operations.
#[derive(Error, Debug)]
pub enum SluiceError {
    // =========================================================================
    // Wiring Errors (E001-E099)
    // =========================================================================
    /// No input with the given name is connected to the processor.
    #[error("E001: Cannot find input '{name}' on processor '{processor}'")]
    MissingInput {
        /// The processor the input was looked up on.
        processor: String,
        /// The input name that was not found.
        name: String,
    },

    /// More than one input with the given name is connected where exactly one
    /// was required.
    #[error("E002: Found {count} inputs '{name}' on processor '{processor}', expected exactly one")]
    AmbiguousInput {
        /// The processor the input was looked up on.
        processor: String,
        /// The ambiguous input name.
        name: String,
        /// Number of connected inputs with that name.
        count: usize,
    },

    /// No output with the given name exists on the processor.
    #[error("E003: Cannot find output '{name}' on processor '{processor}'")]
    MissingOutput {
        /// The processor the output was looked up on.
        processor: String,
        /// The output name that was not found.
        name: String,
    },

    /// An output with the given name is already registered.
    #[error("E004: Output '{name}' already registered on processor '{processor}'")]
    DuplicateOutput {
        /// The processor the output was registered on.
        processor: String,
        /// The duplicate output name.
        name: String,
    },

    /// An input is read before being bound to an upstream output.
    #[error("E005: Input '{name}' on processor '{processor}' is not bound to any output")]
    UnboundInput {
        /// The processor owning the input.
        processor: String,
        /// The unbound input name.
        name: String,
    },

    // =========================================================================
    // Context and State Errors (E101-E199)
    // =========================================================================
    /// No execution context is ambient on the calling thread.
    #[error("E101: No execution context is active on this thread")]
    NoAmbientContext,

    /// The call-path frame stack was popped out of order.
    #[error("E102: Call-path frame mismatch: expected '{expected}' on top of the stack")]
    FrameMismatch {
        /// The processor that attempted the pop.
        expected: String,
    },

    /// `state` was called before `set_state` on the same scoped call path.
    #[error("E103: No state established for call path '{path}'")]
    NoState {
        /// The scoped call path the lookup used.
        path: String,
    },

    /// The state stored for a call path has a different type than requested.
    #[error("E104: State for call path '{path}' is not of the requested type")]
    StateType {
        /// The scoped call path the lookup used.
        path: String,
    },

    /// An attribute stored in the context has a different type than requested.
    #[error("E105: Context attribute '{name}' is not of the requested type")]
    AttributeType {
        /// The attribute name.
        name: String,
    },

    // =========================================================================
    // Cache Errors (E201-E299)
    // =========================================================================
    /// A cached value has a different type than the reader requested.
    #[error("E201: Cached value under key '{key}' is not of the requested type")]
    CachedValueType {
        /// Display form of the cache key.
        key: String,
    },

    // =========================================================================
    // Registry and Assembly Errors (E301-E399)
    // =========================================================================
    /// No factory is registered for a processor type.
    #[error("E301: No processor factory registered for type '{type_name}'")]
    UnknownProcessorType {
        /// The unregistered type name.
        type_name: String,
    },

    /// An edge refers to a processor name absent from the graph definition.
    #[error("E302: Edge endpoint '{endpoint}' refers to unknown processor '{processor}'")]
    UnknownGraphProcessor {
        /// The raw edge endpoint.
        endpoint: String,
        /// The processor name that was not defined.
        processor: String,
    },

    /// An edge endpoint could not be parsed.
    #[error("E303: Invalid edge endpoint '{endpoint}', expected 'processor' or 'processor.port'")]
    InvalidEndpoint {
        /// The malformed endpoint.
        endpoint: String,
    },

    /// A processor factory rejected its configuration.
    #[error("E304: Invalid configuration for processor type '{type_name}': {cause}")]
    InvalidConfig {
        /// The processor type being configured.
        type_name: String,
        /// Reason the configuration was rejected.
        cause: String,
    },

    // =========================================================================
    // Execution Errors (E401-E499)
    // =========================================================================
    /// `start` was called on a processor that does not support it.
    #[error("E401: Start not supported by processor '{processor}'")]
    StartUnsupported {
        /// The processor `start` was called on.
        processor: String,
    },

    /// An error raised by collaborator (leaf-processor) code, propagated
    /// unchanged.
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

/// A specialized `Result` type for Sluice operations.
pub type Result<T> = std::result::Result<T, SluiceError>;
