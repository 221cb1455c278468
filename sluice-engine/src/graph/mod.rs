//! Processor nodes, named ports, and explicit wiring.
//!
//! A processor is a named node declaring a fixed set of input and output
//! port names. Outputs are trait objects delivering an ordered event stream
//! on demand and independently exposing a cache key and validity; inputs are
//! binding points connected to exactly one upstream output before they are
//! read.

mod port;
mod processor;
mod wiring;

pub use port::{InputPort, Output, PortInfo, ValidationHook};
pub use processor::{Processor, ProcessorBase};
pub use wiring::{connect, connect_validated};

/// Conventional name of the principal data port.
pub const DATA_PORT: &str = "data";

/// Conventional name of the configuration port.
pub const CONFIG_PORT: &str = "config";
