//! Incremental JSON writer.
//!
//! The writer emits one well-formed JSON document as a sequence of
//! structural and typed value calls, deciding before every token
//! whether a comma or colon must precede it. State lives in an explicit
//! stack of context frames, one per open array or object; fragments go
//! straight to the sink, so the document never exists in memory as a
//! whole.

use super::value::{JsonValue, format_number};
use crate::io::OutputSink;
use crate::{Error, Result};
use chrono::{DateTime, Utc};

/// What kind of container a context frame tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextKind {
    Root,
    Array,
    Object,
}

/// Separator required before the next token at the current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterStatus {
    NoSeparator,
    NeedsComma,
    NeedsColon,
}

/// One frame of the writer's context stack.
#[derive(Debug)]
struct WriterContext {
    kind: ContextKind,
    /// Values already written at this level; decides comma insertion.
    item_index: usize,
    /// A field name was just written, so a colon comes next.
    pending_field: bool,
}

impl WriterContext {
    fn new(kind: ContextKind) -> Self {
        Self {
            kind,
            item_index: 0,
            pending_field: false,
        }
    }

    fn status(&self) -> WriterStatus {
        if self.pending_field {
            WriterStatus::NeedsColon
        } else if self.item_index > 0 {
            WriterStatus::NeedsComma
        } else {
            WriterStatus::NoSeparator
        }
    }

    /// Consumes one value slot at this level.
    fn note_value(&mut self) {
        self.item_index += 1;
        self.pending_field = false;
    }
}

/// Writer for JSON documents that may be very large.
///
/// Fragments are appended to an [`OutputSink`] as they are produced, so
/// the document never needs to fit in memory. The sink is opened lazily
/// on the first write.
#[derive(Debug)]
pub struct JsonWriter<S: OutputSink> {
    sink: S,
    stack: Vec<WriterContext>,
}

impl<S: OutputSink> JsonWriter<S> {
    /// Creates a writer bound to the given sink.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            stack: vec![WriterContext::new(ContextKind::Root)],
        }
    }

    /// Starts a new array (`[`).
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn start_array(&mut self) -> Result<()> {
        self.write_separator()?;
        self.current().note_value();
        self.stack.push(WriterContext::new(ContextKind::Array));
        self.write("[")
    }

    /// Ends the current array (`]`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWriterState`] if the current container is
    /// not an array, or if this would close past the document root.
    pub fn end_array(&mut self) -> Result<()> {
        self.pop(ContextKind::Array)?;
        self.write("]")
    }

    /// Starts a new object (`{`).
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn start_object(&mut self) -> Result<()> {
        self.write_separator()?;
        self.current().note_value();
        self.stack.push(WriterContext::new(ContextKind::Object));
        self.write("{")
    }

    /// Ends the current object (`}`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWriterState`] if the current container is
    /// not an object, or if this would close past the document root.
    pub fn end_object(&mut self) -> Result<()> {
        self.pop(ContextKind::Object)?;
        self.write("}")
    }

    /// Writes a field name. The next value written belongs to it.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn field_name(&mut self, name: &str) -> Result<()> {
        self.write_separator()?;
        self.current().pending_field = true;
        let escaped = escape_string(name);
        self.write(&format!("\"{escaped}\""))
    }

    /// Writes a string value. Embedded quotes and control characters
    /// are escaped.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn string_value(&mut self, value: &str) -> Result<()> {
        self.write_separator()?;
        self.current().note_value();
        let escaped = escape_string(value);
        self.write(&format!("\"{escaped}\""))
    }

    /// Writes a numeric value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedValueType`] for non-finite numbers;
    /// JSON has no representation for NaN or infinity.
    pub fn number_value(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::UnsupportedValueType(format!(
                "non-finite number {value}"
            )));
        }
        self.write_separator()?;
        self.current().note_value();
        self.write(&format_number(value))
    }

    /// Writes `true` or `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn bool_value(&mut self, value: bool) -> Result<()> {
        self.write_separator()?;
        self.current().note_value();
        self.write(if value { "true" } else { "false" })
    }

    /// Writes a date value as integer milliseconds since the Unix
    /// epoch. JSON has no native date type.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn date_value(&mut self, value: DateTime<Utc>) -> Result<()> {
        self.write_separator()?;
        self.current().note_value();
        self.write(&value.timestamp_millis().to_string())
    }

    /// Writes `null`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn null_value(&mut self) -> Result<()> {
        self.write_separator()?;
        self.current().note_value();
        self.write("null")
    }

    /// Writes a complete string field.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn string_field(&mut self, name: &str, value: &str) -> Result<()> {
        self.field_name(name)?;
        self.string_value(value)
    }

    /// Writes a complete numeric field.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is non-finite or the sink fails.
    pub fn number_field(&mut self, name: &str, value: f64) -> Result<()> {
        self.field_name(name)?;
        self.number_value(value)
    }

    /// Writes a complete boolean field.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn bool_field(&mut self, name: &str, value: bool) -> Result<()> {
        self.field_name(name)?;
        self.bool_value(value)
    }

    /// Writes a complete date field.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn date_field(&mut self, name: &str, value: DateTime<Utc>) -> Result<()> {
        self.field_name(name)?;
        self.date_value(value)
    }

    /// Writes a named array opener (`"name":[`).
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn array_field_start(&mut self, name: &str) -> Result<()> {
        self.field_name(name)?;
        self.start_array()
    }

    /// Writes a named object opener (`"name":{`).
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the sink fails.
    pub fn object_field_start(&mut self, name: &str) -> Result<()> {
        self.field_name(name)?;
        self.start_object()
    }

    /// Writes an entire ad hoc nested value in one call by matching on
    /// the tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedValueType`] if a leaf cannot be
    /// expressed in JSON (non-finite number).
    pub fn write_value(&mut self, value: &JsonValue) -> Result<()> {
        match value {
            JsonValue::String(s) => self.string_value(s),
            JsonValue::Number(n) => self.number_value(*n),
            JsonValue::Bool(b) => self.bool_value(*b),
            JsonValue::Date(d) => self.date_value(*d),
            JsonValue::Null => self.null_value(),
            JsonValue::Array(items) => {
                self.start_array()?;
                for item in items {
                    self.write_value(item)?;
                }
                self.end_array()
            }
            JsonValue::Object(map) => {
                self.start_object()?;
                for (key, field) in map.iter() {
                    self.field_name(key)?;
                    self.write_value(field)?;
                }
                self.end_object()
            }
        }
    }

    /// Writes a complete field holding an ad hoc nested value.
    ///
    /// # Errors
    ///
    /// Returns an error if a leaf is unsupported or the sink fails.
    pub fn value_field(&mut self, name: &str, value: &JsonValue) -> Result<()> {
        self.field_name(name)?;
        self.write_value(value)
    }

    /// Closes the underlying sink.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing the sink fails.
    pub fn close(&mut self) -> Result<()> {
        self.sink.close()
    }

    /// Closes the sink and reads the document back as a string.
    ///
    /// Intended for in-memory targets and tests; reading back a large
    /// file-backed document defeats the purpose of the streaming
    /// writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot be read back.
    pub fn into_string(mut self) -> Result<String> {
        self.sink.read_back()
    }

    fn current(&mut self) -> &mut WriterContext {
        // The root frame is never popped, so the stack is never empty.
        self.stack
            .last_mut()
            .unwrap_or_else(|| unreachable!("writer context stack is never empty"))
    }

    fn pop(&mut self, expected: ContextKind) -> Result<()> {
        let kind = self.stack.last().map(|c| c.kind);
        match kind {
            Some(k) if k == expected => {
                self.stack.pop();
                Ok(())
            }
            Some(ContextKind::Root) | None => Err(Error::InvalidWriterState(
                "attempted to close past the document root".to_string(),
            )),
            Some(other) => Err(Error::InvalidWriterState(format!(
                "attempted to close {expected:?} but current container is {other:?}"
            ))),
        }
    }

    fn write_separator(&mut self) -> Result<()> {
        let status = self.current().status();
        match status {
            WriterStatus::NeedsComma => self.write(","),
            WriterStatus::NeedsColon => self.write(":"),
            WriterStatus::NoSeparator => Ok(()),
        }
    }

    /// Appends text to the sink, opening it on first use.
    fn write(&mut self, text: &str) -> Result<()> {
        if !self.sink.is_open() {
            self.sink.open()?;
        }
        self.sink.append(text)
    }
}

/// Escapes a string for embedding between JSON quotes.
fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}
