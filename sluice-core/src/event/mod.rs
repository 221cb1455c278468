//! Structural event model.
//!
//! A processor output does not return a materialized value: it pushes an
//! ordered sequence of structural events (element boundaries, attributes,
//! namespace mappings, text runs, processing instructions, ...) into a
//! [`Receiver`]. The [`EventLog`] buffer makes such a single-consumption
//! stream cacheable and multiply replayable.

mod log;

pub use log::EventLog;

use crate::error::Result;
use std::fmt;

/// A qualified name: namespace URI plus local name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI, empty for no namespace.
    pub uri: String,
    /// Local part of the name.
    pub local: String,
}

impl QName {
    /// Create a name with no namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            uri: String::new(),
            local: local.into(),
        }
    }

    /// Create a namespaced name.
    pub fn new(uri: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            local: local.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.uri.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.uri, self.local)
        }
    }
}

/// An attribute attached to an element start event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    /// Attribute name.
    pub name: QName,
    /// Attribute value.
    pub value: String,
}

impl Attribute {
    /// Create an attribute with a non-namespaced name.
    pub fn new(local: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: QName::local(local),
            value: value.into(),
        }
    }
}

/// One structural event in an output stream.
///
/// The set of variants mirrors what a recording pass must capture for a
/// faithful replay: boundaries with their nesting, namespace mappings, text
/// runs, and the less common lexical events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Event {
    /// Beginning of the stream.
    StartDocument,
    /// End of the stream.
    EndDocument,
    /// Element start boundary with its attributes.
    StartElement {
        /// Element name.
        name: QName,
        /// Attributes in document order.
        attributes: Vec<Attribute>,
    },
    /// Element end boundary.
    EndElement {
        /// Element name, matching the corresponding start.
        name: QName,
    },
    /// Start of a prefix/URI namespace mapping.
    StartPrefixMapping {
        /// Namespace prefix, empty for the default namespace.
        prefix: String,
        /// Namespace URI.
        uri: String,
    },
    /// End of a prefix mapping.
    EndPrefixMapping {
        /// Namespace prefix.
        prefix: String,
    },
    /// A run of character content.
    Characters(String),
    /// Whitespace the producer marked as ignorable.
    IgnorableWhitespace(String),
    /// A processing instruction.
    ProcessingInstruction {
        /// Instruction target.
        target: String,
        /// Instruction data.
        data: String,
    },
    /// A comment.
    Comment(String),
    /// An entity the producer skipped.
    SkippedEntity(String),
}

impl Event {
    /// Convenience constructor for an element start without attributes.
    pub fn start_element(local: impl Into<String>) -> Self {
        Event::StartElement {
            name: QName::local(local),
            attributes: Vec::new(),
        }
    }

    /// Convenience constructor for an element end.
    pub fn end_element(local: impl Into<String>) -> Self {
        Event::EndElement {
            name: QName::local(local),
        }
    }

    /// Convenience constructor for character content.
    pub fn characters(text: impl Into<String>) -> Self {
        Event::Characters(text.into())
    }
}

/// A push-style sink for structural events.
///
/// A `read` on an output delivers its whole stream through one receiver;
/// replaying an [`EventLog`] re-delivers the recorded stream the same way.
/// Receivers may fail; the error aborts the delivering read and propagates
/// to its caller.
pub trait Receiver {
    /// Accept the next event in the stream.
    fn event(&mut self, event: &Event) -> Result<()>;
}

/// A receiver that discards every event.
#[derive(Debug, Default)]
pub struct NullReceiver;

impl Receiver for NullReceiver {
    fn event(&mut self, _event: &Event) -> Result<()> {
        Ok(())
    }
}

/// A receiver that collects events into a vector, mostly for tests.
#[derive(Debug, Default)]
pub struct CollectingReceiver {
    /// The collected events, in delivery order.
    pub events: Vec<Event>,
}

impl CollectingReceiver {
    /// Create an empty collecting receiver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Receiver for CollectingReceiver {
    fn event(&mut self, event: &Event) -> Result<()> {
        self.events.push(event.clone());
        Ok(())
    }
}
