//! Record-once / replay-many buffer for event streams.

use super::{Event, Receiver};
use crate::error::Result;

/// An ordered, append-only record of structural events.
///
/// Produced by exactly one recording pass and immutable once finished. A log
/// supports unlimited independent replays, each re-emitting the exact
/// recorded sequence without re-invoking the original producer.
///
/// Balanced nesting is assumed from the producer and not re-validated on
/// replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<Event>,
}

/// Internal receiver backing the recording pass.
struct Recorder {
    events: Vec<Event>,
}

impl Receiver for Recorder {
    fn event(&mut self, event: &Event) -> Result<()> {
        self.events.push(event.clone());
        Ok(())
    }
}

impl EventLog {
    /// Record a producer's event stream.
    ///
    /// The producer is invoked exactly once against an internal receiver. If
    /// it fails, the partial recording is discarded and the error propagates;
    /// no partial log is ever observable.
    pub fn record<F>(producer: F) -> Result<Self>
    where
        F: FnOnce(&mut dyn Receiver) -> Result<()>,
    {
        let mut recorder = Recorder { events: Vec::new() };
        producer(&mut recorder)?;
        Ok(Self {
            events: recorder.events,
        })
    }

    /// Re-emit the recorded sequence to a receiver.
    ///
    /// Callable any number of times; the log is not mutated.
    pub fn replay(&self, receiver: &mut dyn Receiver) -> Result<()> {
        for event in &self.events {
            receiver.event(event)?;
        }
        Ok(())
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The recorded events, in order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }
}
