//! Export targets: consumers of the document-shaping calls.

use crate::io::{FileSink, MemSink, OutputSink};
use crate::json::{FieldMap, JsonWriter};
use crate::models::{SampleKind, SampleType, keys};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Discriminator string written into the metadata block and verified on
/// import.
pub const DOC_TYPE: &str = "JsonSingleDocExportTarget";

/// Two-part file suffix of exported profiles.
pub const PROFILE_SUFFIX: &str = ".json.hsg";

/// A consumer of the document-shaping calls that drives one writer and
/// one sink.
///
/// Lifecycle: `start_export`, then `write_metadata`, then
/// `write_user_data`, then for each record type one
/// `start_write_type` / `write_record`* / `end_write_type` group, then
/// `end_export`. Several targets may be attached to one export run.
pub trait ExportTarget {
    /// Whether the target may start at all. A file-backed target is
    /// invalid when its destination exists and overwriting was not
    /// permitted; an in-memory target is always valid.
    fn is_valid(&self) -> bool;

    /// Opens the document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TargetNotValid`] if the target is invalid, or a
    /// sink error.
    fn start_export(&mut self) -> Result<()>;

    /// Writes the fixed-shape metadata block. Always the first block.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_metadata(
        &mut self,
        creation_date: DateTime<Utc>,
        profile_name: &str,
        version: &str,
    ) -> Result<()>;

    /// Writes the user characteristics block. Unset fields are simply
    /// absent from the mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_user_data(&mut self, user_data: &FieldMap) -> Result<()>;

    /// Opens the block for one record type. Unit-bearing quantity types
    /// get a `{"unit": ..., "data": [...]}` wrapper, every other kind a
    /// bare array.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn start_write_type(&mut self, sample_type: &SampleType) -> Result<()>;

    /// Streams one flattened record into the open type block.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_record(&mut self, record: &FieldMap) -> Result<()>;

    /// Closes the open type block.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn end_write_type(&mut self) -> Result<()>;

    /// Closes the document and the underlying sink.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or flushing fails.
    fn end_export(&mut self) -> Result<()>;
}

/// The single-document JSON target.
///
/// Shapes the whole profile as one top-level JSON object and delegates
/// every character of output to the incremental writer.
pub struct JsonSingleDocExportTarget<S: OutputSink> {
    writer: JsonWriter<S>,
    /// Destination path and overwrite permission, file-backed only.
    destination: Option<(PathBuf, bool)>,
    /// The open type block has the unit-and-data wrapper shape.
    unit_wrapped: bool,
}

impl JsonSingleDocExportTarget<MemSink> {
    /// Creates an in-memory target, always valid.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            writer: JsonWriter::new(MemSink::new()),
            destination: None,
            unit_wrapped: false,
        }
    }

    /// Returns the exported document.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot be read back.
    pub fn into_json(self) -> Result<String> {
        self.writer.into_string()
    }
}

impl JsonSingleDocExportTarget<FileSink> {
    /// Creates a file-backed target for the given destination.
    #[must_use]
    pub fn to_file(path: &Path, overwrite: bool) -> Self {
        Self {
            writer: JsonWriter::new(FileSink::new(path)),
            destination: Some((path.to_path_buf(), overwrite)),
            unit_wrapped: false,
        }
    }

    /// The conventional destination for a named profile inside a
    /// directory: `<dir>/<profile_name>.json.hsg`.
    #[must_use]
    pub fn profile_path(dir: &Path, profile_name: &str) -> PathBuf {
        dir.join(format!("{profile_name}{PROFILE_SUFFIX}"))
    }
}

impl<S: OutputSink> ExportTarget for JsonSingleDocExportTarget<S> {
    fn is_valid(&self) -> bool {
        match &self.destination {
            Some((path, overwrite)) => *overwrite || !path.exists(),
            None => true,
        }
    }

    fn start_export(&mut self) -> Result<()> {
        if !self.is_valid() {
            let detail = match &self.destination {
                Some((path, _)) => format!("destination already exists: {}", path.display()),
                None => "target is not valid".to_string(),
            };
            return Err(Error::TargetNotValid(detail));
        }
        self.writer.start_object()
    }

    fn write_metadata(
        &mut self,
        creation_date: DateTime<Utc>,
        profile_name: &str,
        version: &str,
    ) -> Result<()> {
        self.writer.object_field_start(keys::META_DATA)?;
        self.writer.date_field(keys::CREATION_DATE, creation_date)?;
        self.writer.string_field(keys::PROFILE_NAME, profile_name)?;
        self.writer.string_field(keys::VERSION, version)?;
        self.writer.string_field(keys::TYPE, DOC_TYPE)?;
        self.writer.end_object()
    }

    fn write_user_data(&mut self, user_data: &FieldMap) -> Result<()> {
        self.writer.object_field_start(keys::USER_DATA)?;
        for (name, value) in user_data.iter() {
            self.writer.value_field(name, value)?;
        }
        self.writer.end_object()
    }

    fn start_write_type(&mut self, sample_type: &SampleType) -> Result<()> {
        match (sample_type.kind, sample_type.unit) {
            (SampleKind::Quantity, Some(unit)) => {
                self.writer.object_field_start(sample_type.name)?;
                self.writer.string_field(keys::UNIT, unit)?;
                self.writer.array_field_start(keys::DATA)?;
                self.unit_wrapped = true;
            }
            _ => {
                self.writer.array_field_start(sample_type.name)?;
                self.unit_wrapped = false;
            }
        }
        Ok(())
    }

    fn write_record(&mut self, record: &FieldMap) -> Result<()> {
        self.writer.start_object()?;
        for (name, value) in record.iter() {
            self.writer.value_field(name, value)?;
        }
        self.writer.end_object()
    }

    fn end_write_type(&mut self) -> Result<()> {
        self.writer.end_array()?;
        if self.unit_wrapped {
            self.writer.end_object()?;
            self.unit_wrapped = false;
        }
        Ok(())
    }

    fn end_export(&mut self) -> Result<()> {
        self.writer.end_object()?;
        self.writer.close()
    }
}
