//! Explicit wiring between processors.

use super::port::ValidationHook;
use super::processor::Processor;
use sluice_core::error::Result;
use tracing::debug;

/// Connect `from`'s output port to a new input port on `to`.
pub fn connect(from: &dyn Processor, from_port: &str, to: &dyn Processor, to_port: &str) -> Result<()> {
    connect_validated(from, from_port, to, to_port, None)
}

/// Connect two processors, inserting a validating wrapper when the target
/// input declares a schema and a hook is installed.
///
/// The wrapper decorates the bound output and stays invisible to both sides:
/// the reader sees the same stream and the same key/validity delegation.
pub fn connect_validated(
    from: &dyn Processor,
    from_port: &str,
    to: &dyn Processor,
    to_port: &str,
    hook: Option<&dyn ValidationHook>,
) -> Result<()> {
    let output = from.base().output_by_name(from_port)?;
    let input = to.base().create_input(to_port);
    let output = match (input.schema(), hook) {
        (Some(schema), Some(hook)) => {
            debug!(
                schema,
                input = to_port,
                processor = to.base().type_name(),
                "inserting validating wrapper"
            );
            hook.wrap(schema, output)
        }
        _ => output,
    };
    input.bind(output);
    Ok(())
}
