//! Output sink abstraction.
//!
//! A sink is a minimal sequential text destination. The JSON writer
//! appends small string fragments to it and never seeks, so a sink can
//! be an in-memory buffer or a file handle without the writer knowing.

use crate::{Error, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A sequential text destination.
///
/// # Lifecycle
///
/// 1. `open()` the sink (writers open lazily on first append)
/// 2. `append()` string fragments in order
/// 3. `close()` to flush
/// 4. `read_back()` to recover the full text, if supported
pub trait OutputSink {
    /// Opens the sink for writing.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying destination cannot be created.
    fn open(&mut self) -> Result<()>;

    /// Closes the sink, flushing buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn close(&mut self) -> Result<()>;

    /// Returns whether the sink is currently open.
    fn is_open(&self) -> bool;

    /// Appends a string fragment to the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink is not open or writing fails.
    fn append(&mut self, text: &str) -> Result<()>;

    /// Reads the full text written so far back as a string.
    ///
    /// Closes the sink first. Intended for tests and for in-memory
    /// re-consumption of small documents; reading a multi-megabyte file
    /// back defeats the purpose of the streaming writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be read back.
    fn read_back(&mut self) -> Result<String>;
}

/// An in-memory sink. The resulting document must fit in memory.
#[derive(Debug, Default)]
pub struct MemSink {
    buffer: String,
    open: bool,
}

impl MemSink {
    /// Creates a new empty in-memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputSink for MemSink {
    fn open(&mut self) -> Result<()> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn append(&mut self, text: &str) -> Result<()> {
        self.buffer.push_str(text);
        Ok(())
    }

    fn read_back(&mut self) -> Result<String> {
        self.close()?;
        Ok(self.buffer.clone())
    }
}

/// A file-backed sink. Opening truncates any existing file content.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    /// Creates a file sink for the given path. The file is not created
    /// until the sink is opened.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
        }
    }

    /// Returns the destination path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for FileSink {
    fn open(&mut self) -> Result<()> {
        if self.writer.is_none() {
            let file = File::create(&self.path)
                .map_err(|e| Error::operation("open_file_sink", e))?;
            self.writer = Some(BufWriter::new(file));
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .map_err(|e| Error::operation("close_file_sink", e))?;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn append(&mut self, text: &str) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::operation("append_file_sink", "sink is not open"))?;
        writer
            .write_all(text.as_bytes())
            .map_err(|e| Error::operation("append_file_sink", e))
    }

    fn read_back(&mut self) -> Result<String> {
        self.close()?;
        std::fs::read_to_string(&self.path).map_err(|e| Error::operation("read_file_sink", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_sink_append_and_read_back() {
        let mut sink = MemSink::new();
        sink.open().unwrap();
        assert!(sink.is_open());

        sink.append("{\"a\":").unwrap();
        sink.append("1}").unwrap();

        assert_eq!(sink.read_back().unwrap(), "{\"a\":1}");
        assert!(!sink.is_open());
    }

    #[test]
    fn test_file_sink_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json.hsg");

        let mut sink = FileSink::new(&path);
        assert!(!sink.is_open());
        sink.open().unwrap();
        sink.append("[1,2]").unwrap();
        assert_eq!(sink.read_back().unwrap(), "[1,2]");
        assert!(path.exists());
    }

    #[test]
    fn test_file_sink_append_before_open_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path().join("x"));
        assert!(sink.append("oops").is_err());
    }
}
