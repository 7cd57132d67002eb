//! Handler protocol for the tokenizer's event stream.

use super::writer::JsonWriter;
use crate::Result;
use crate::io::MemSink;

/// Callback consumer of the reader's structural and value events.
///
/// Every method has a no-op default, so a handler only overrides the
/// events it cares about. Methods return a `Result` so a handler that
/// re-serializes or stores events can propagate its own failures
/// through the tokenizer.
pub trait JsonHandler {
    /// An array started.
    ///
    /// # Errors
    ///
    /// Implementations may fail while reacting to the event.
    fn start_array(&mut self) -> Result<()> {
        Ok(())
    }

    /// An array ended.
    ///
    /// # Errors
    ///
    /// Implementations may fail while reacting to the event.
    fn end_array(&mut self) -> Result<()> {
        Ok(())
    }

    /// An object started.
    ///
    /// # Errors
    ///
    /// Implementations may fail while reacting to the event.
    fn start_object(&mut self) -> Result<()> {
        Ok(())
    }

    /// An object ended.
    ///
    /// # Errors
    ///
    /// Implementations may fail while reacting to the event.
    fn end_object(&mut self) -> Result<()> {
        Ok(())
    }

    /// A field name was tokenized.
    ///
    /// # Errors
    ///
    /// Implementations may fail while reacting to the event.
    fn name(&mut self, name: &str) -> Result<()> {
        let _ = name;
        Ok(())
    }

    /// A string value was tokenized.
    ///
    /// # Errors
    ///
    /// Implementations may fail while reacting to the event.
    fn string_value(&mut self, value: &str) -> Result<()> {
        let _ = value;
        Ok(())
    }

    /// A boolean value was tokenized.
    ///
    /// # Errors
    ///
    /// Implementations may fail while reacting to the event.
    fn bool_value(&mut self, value: bool) -> Result<()> {
        let _ = value;
        Ok(())
    }

    /// A numeric value was tokenized.
    ///
    /// # Errors
    ///
    /// Implementations may fail while reacting to the event.
    fn number_value(&mut self, value: f64) -> Result<()> {
        let _ = value;
        Ok(())
    }

    /// A null value was tokenized.
    ///
    /// # Errors
    ///
    /// Implementations may fail while reacting to the event.
    fn null_value(&mut self) -> Result<()> {
        Ok(())
    }

    /// Returns true to make the tokenizer stop issuing events and stop
    /// consuming input. Polled, not preemptive: a handler cancelling
    /// mid-token may still see the current token complete.
    fn should_cancel(&self) -> bool {
        false
    }
}

/// Handler that re-serializes the event stream into a fresh in-memory
/// writer.
///
/// Feeding a document through the reader into this handler must
/// reproduce the input byte for byte, which makes it the workhorse of
/// the round-trip tests.
pub struct EchoHandler {
    writer: JsonWriter<MemSink>,
}

impl EchoHandler {
    /// Creates an echo handler with an empty in-memory writer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            writer: JsonWriter::new(MemSink::new()),
        }
    }

    /// Returns the JSON accumulated so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory sink cannot be read back.
    pub fn into_json(self) -> Result<String> {
        self.writer.into_string()
    }
}

impl Default for EchoHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonHandler for EchoHandler {
    fn start_array(&mut self) -> Result<()> {
        self.writer.start_array()
    }

    fn end_array(&mut self) -> Result<()> {
        self.writer.end_array()
    }

    fn start_object(&mut self) -> Result<()> {
        self.writer.start_object()
    }

    fn end_object(&mut self) -> Result<()> {
        self.writer.end_object()
    }

    fn name(&mut self, name: &str) -> Result<()> {
        self.writer.field_name(name)
    }

    fn string_value(&mut self, value: &str) -> Result<()> {
        self.writer.string_value(value)
    }

    fn bool_value(&mut self, value: bool) -> Result<()> {
        self.writer.bool_value(value)
    }

    fn number_value(&mut self, value: f64) -> Result<()> {
        self.writer.number_value(value)
    }

    fn null_value(&mut self) -> Result<()> {
        self.writer.null_value()
    }
}
