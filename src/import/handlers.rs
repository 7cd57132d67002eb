//! Import-side handlers for the tokenizer's event stream.

use crate::json::{FieldMap, JsonHandler, JsonValue};
use crate::models::keys;
use crate::{Error, Result};

/// Collects the scalar fields of the top-level `metaData` object, then
/// cancels.
///
/// The metadata block is always the first block of a profile, so a
/// caller can recover name, creation date, version and format type by
/// reading only the leading bytes of a multi-megabyte file.
#[derive(Debug, Default)]
pub struct MetaDataHandler {
    fields: FieldMap,
    last_name: Option<String>,
    collecting: bool,
    done: bool,
}

impl MetaDataHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected metadata fields.
    #[must_use]
    pub fn into_fields(self) -> FieldMap {
        self.fields
    }

    fn collect(&mut self, value: JsonValue) {
        if self.collecting {
            if let Some(name) = self.last_name.take() {
                self.fields.put(name, value);
            }
        }
    }
}

impl JsonHandler for MetaDataHandler {
    fn start_object(&mut self) -> Result<()> {
        if !self.collecting && self.last_name.as_deref() == Some(keys::META_DATA) {
            self.collecting = true;
        }
        Ok(())
    }

    fn end_object(&mut self) -> Result<()> {
        if self.collecting {
            self.collecting = false;
            self.done = true;
        }
        Ok(())
    }

    fn name(&mut self, name: &str) -> Result<()> {
        self.last_name = Some(name.to_string());
        Ok(())
    }

    fn string_value(&mut self, value: &str) -> Result<()> {
        self.collect(JsonValue::String(value.to_string()));
        Ok(())
    }

    fn bool_value(&mut self, value: bool) -> Result<()> {
        self.collect(JsonValue::Bool(value));
        Ok(())
    }

    fn number_value(&mut self, value: f64) -> Result<()> {
        self.collect(JsonValue::Number(value));
        Ok(())
    }

    fn should_cancel(&self) -> bool {
        self.done
    }
}

/// An open container inside the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Array,
    Object,
}

/// A partially built value inside the current record.
#[derive(Debug)]
enum FrameValue {
    Object(FieldMap),
    Array(Vec<JsonValue>),
}

#[derive(Debug)]
struct Frame {
    /// Field name this value will be inserted under in its parent
    /// object, `None` inside arrays and for the record root.
    label: Option<String>,
    value: FrameValue,
}

/// Reconstructs one flattened record at a time from the event stream.
///
/// Any top-level block other than `metaData` and `userData` is a type
/// block; objects that open directly inside a type block's array are
/// records. While inside a record the handler builds nested values on a
/// frame stack, and on the record's closing brace it invokes the
/// callback with the finished mapping and the block's type name, then
/// discards the record. Memory is bounded by one record regardless of
/// document size.
pub struct RecordAccumulatorHandler<F>
where
    F: FnMut(FieldMap, &str) -> Result<()>,
{
    on_record: F,
    /// Open containers across the whole document.
    kinds: Vec<Kind>,
    /// Type name of the block currently being walked.
    current_type: Option<String>,
    last_name: Option<String>,
    /// Frame stack of the record under construction; empty outside
    /// records.
    builder: Vec<Frame>,
}

impl<F> RecordAccumulatorHandler<F>
where
    F: FnMut(FieldMap, &str) -> Result<()>,
{
    /// Creates the handler with a per-record callback.
    pub fn new(on_record: F) -> Self {
        Self {
            on_record,
            kinds: Vec::new(),
            current_type: None,
            last_name: None,
            builder: Vec::new(),
        }
    }

    fn in_record(&self) -> bool {
        !self.builder.is_empty()
    }

    /// A container is opening at block level (directly inside the root
    /// object) whose name is not one of the fixed blocks.
    fn opens_type_block(&self) -> bool {
        self.kinds.len() == 1
            && matches!(
                self.last_name.as_deref(),
                Some(name) if name != keys::META_DATA && name != keys::USER_DATA
            )
    }

    fn store_value(&mut self, value: JsonValue) -> Result<()> {
        let name = self.last_name.take();
        match self.builder.last_mut() {
            Some(Frame {
                value: FrameValue::Object(map),
                ..
            }) => {
                let name = name.ok_or_else(|| {
                    Error::MalformedDocument("object value without a field name".to_string())
                })?;
                map.put(name, value);
                Ok(())
            }
            Some(Frame {
                value: FrameValue::Array(items),
                ..
            }) => {
                items.push(value);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Pops the finished frame and either completes the record or
    /// inserts the value into its parent frame.
    fn finish_frame(&mut self) -> Result<()> {
        let Some(frame) = self.builder.pop() else {
            return Ok(());
        };
        let value = match frame.value {
            FrameValue::Object(map) => JsonValue::Object(map),
            FrameValue::Array(items) => JsonValue::Array(items),
        };
        if self.builder.is_empty() {
            let JsonValue::Object(map) = value else {
                return Err(Error::MalformedDocument(
                    "record is not an object".to_string(),
                ));
            };
            let type_name = self.current_type.clone().ok_or_else(|| {
                Error::MalformedDocument("record outside any type block".to_string())
            })?;
            (self.on_record)(map, &type_name)
        } else {
            self.last_name = frame.label;
            let labelled = value;
            // Re-route through store_value so arrays and objects insert
            // the same way scalars do.
            self.store_value(labelled)
        }
    }

    fn leave_container(&mut self) -> Result<()> {
        self.kinds.pop();
        if self.in_record() {
            self.finish_frame()?;
        }
        if self.kinds.len() <= 1 {
            self.current_type = None;
        }
        Ok(())
    }
}

impl<F> JsonHandler for RecordAccumulatorHandler<F>
where
    F: FnMut(FieldMap, &str) -> Result<()>,
{
    fn start_object(&mut self) -> Result<()> {
        if self.in_record() {
            self.builder.push(Frame {
                label: self.last_name.take(),
                value: FrameValue::Object(FieldMap::new()),
            });
        } else if self.current_type.is_some() && self.kinds.last() == Some(&Kind::Array) {
            // A record begins.
            self.builder.push(Frame {
                label: None,
                value: FrameValue::Object(FieldMap::new()),
            });
        } else if self.opens_type_block() {
            // The unit-and-data wrapper of a quantity block.
            self.current_type = self.last_name.take();
        }
        self.kinds.push(Kind::Object);
        Ok(())
    }

    fn end_object(&mut self) -> Result<()> {
        self.leave_container()
    }

    fn start_array(&mut self) -> Result<()> {
        if self.in_record() {
            self.builder.push(Frame {
                label: self.last_name.take(),
                value: FrameValue::Array(Vec::new()),
            });
        } else if self.opens_type_block() {
            self.current_type = self.last_name.take();
        }
        self.kinds.push(Kind::Array);
        Ok(())
    }

    fn end_array(&mut self) -> Result<()> {
        self.leave_container()
    }

    fn name(&mut self, name: &str) -> Result<()> {
        self.last_name = Some(name.to_string());
        Ok(())
    }

    fn string_value(&mut self, value: &str) -> Result<()> {
        self.store_value(JsonValue::String(value.to_string()))
    }

    fn bool_value(&mut self, value: bool) -> Result<()> {
        self.store_value(JsonValue::Bool(value))
    }

    fn number_value(&mut self, value: f64) -> Result<()> {
        self.store_value(JsonValue::Number(value))
    }

    fn null_value(&mut self) -> Result<()> {
        self.store_value(JsonValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::JsonReader;

    const DOC: &str = "{\"metaData\":{\"creationDate\":1700000000000,\
        \"profileName\":\"Maria\",\"version\":\"1.0.0\",\
        \"type\":\"JsonSingleDocExportTarget\"},\
        \"userData\":{\"biologicalSex\":2},\
        \"HKQuantityTypeIdentifierStepCount\":{\"unit\":\"count\",\
        \"data\":[{\"sdate\":1700000000000,\"value\":11,\"unit\":\"count\"}]},\
        \"HKCategoryTypeIdentifierSleepAnalysis\":[\
        {\"sdate\":1700000000000,\"value\":1}]}";

    #[test]
    fn test_metadata_handler_collects_and_cancels() {
        let big = format!("{}{}", DOC, "garbage the handler must never reach");
        let handler = JsonReader::read_str(&big, MetaDataHandler::new()).unwrap();
        assert!(handler.should_cancel());

        let fields = handler.into_fields();
        assert_eq!(
            fields.get("profileName").and_then(JsonValue::as_str),
            Some("Maria")
        );
        assert_eq!(
            fields.get("creationDate").and_then(JsonValue::as_i64),
            Some(1_700_000_000_000)
        );
        assert_eq!(
            fields.get("type").and_then(JsonValue::as_str),
            Some("JsonSingleDocExportTarget")
        );
        // Only the metadata block's own fields are collected.
        assert!(!fields.contains_key("biologicalSex"));
    }

    #[test]
    fn test_accumulator_yields_records_with_type_names() {
        let mut seen: Vec<(String, FieldMap)> = Vec::new();
        JsonReader::read_str(
            DOC,
            RecordAccumulatorHandler::new(|fields, type_name| {
                seen.push((type_name.to_string(), fields));
                Ok(())
            }),
        )
        .unwrap();

        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "HKQuantityTypeIdentifierStepCount");
        assert_eq!(seen[0].1.get("value").and_then(JsonValue::as_f64), Some(11.0));
        assert_eq!(seen[1].0, "HKCategoryTypeIdentifierSleepAnalysis");
        assert_eq!(seen[1].1.get("value").and_then(JsonValue::as_i64), Some(1));
    }

    #[test]
    fn test_accumulator_rebuilds_nested_structures() {
        let doc = "{\"HKCorrelationTypeIdentifierBloodPressure\":[\
            {\"sdate\":1,\"objects\":[\
            {\"sdate\":1,\"value\":120,\"unit\":\"mmHg\",\
            \"type\":\"HKQuantityTypeIdentifierBloodPressureSystolic\"}]}]}";

        let mut seen = Vec::new();
        JsonReader::read_str(
            doc,
            RecordAccumulatorHandler::new(|fields, type_name| {
                seen.push((type_name.to_string(), fields));
                Ok(())
            }),
        )
        .unwrap();

        assert_eq!(seen.len(), 1);
        let objects = seen[0].1.get("objects").and_then(JsonValue::as_array).unwrap();
        let sub = objects[0].as_object().unwrap();
        assert_eq!(
            sub.get("type").and_then(JsonValue::as_str),
            Some("HKQuantityTypeIdentifierBloodPressureSystolic")
        );
    }

    #[test]
    fn test_user_data_block_produces_no_records() {
        let doc = "{\"userData\":{\"bloodType\":3,\"biologicalSex\":2}}";
        let mut count = 0;
        JsonReader::read_str(
            doc,
            RecordAccumulatorHandler::new(|_, _| {
                count += 1;
                Ok(())
            }),
        )
        .unwrap();
        assert_eq!(count, 0);
    }
}
