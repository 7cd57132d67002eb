//! # Healthpack
//!
//! Streaming export and import of health-record profile documents.
//!
//! Healthpack serializes a heterogeneous collection of typed health
//! records (quantity series, category events, correlations, workouts)
//! into a single JSON document, and back, without ever holding the
//! whole document in memory. The codec is a hand-rolled incremental
//! JSON writer and a character-driven tokenizer that emits events to a
//! pluggable handler, so a multi-megabyte profile can be produced or
//! inspected with bounded memory.
//!
//! ## Example
//!
//! ```rust,ignore
//! use healthpack::export::{
//!     ExportConfiguration, ExportService, ExportType, JsonSingleDocExportTarget,
//! };
//!
//! let config = ExportConfiguration::new("Maria", ExportType::All);
//! let mut target = JsonSingleDocExportTarget::in_memory();
//! let service = ExportService::new();
//! service.export(&store, &config, &mut [&mut target], |message| {
//!     println!("{message}");
//! })?;
//! let json = target.into_json()?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod export;
pub mod generator;
pub mod import;
pub mod io;
pub mod json;
pub mod models;
pub mod observability;
pub mod store;

// Re-exports for convenience
pub use config::HealthpackConfig;
pub use export::{ExportConfiguration, ExportService, ExportTarget, ExportType};
pub use import::{Profile, ProfileImporter, ProfileMetadata};
pub use json::{JsonHandler, JsonTokenizer, JsonValue, JsonWriter};
pub use models::{Record, SampleType, UserCharacteristics};
pub use store::{Anchor, HealthStore, InMemoryHealthStore, RecordFilter};

/// Error type for healthpack operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait
/// implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `UnsupportedValueType` | The writer is asked to serialize a leaf outside the JSON-shaped set |
/// | `InvalidWriterState` | Structural writer calls do not describe one well-formed document |
/// | `MalformedDocument` | The tokenizer meets a token it cannot classify (bad number, bad escape) |
/// | `DataWriteError` | The health store reported an error during a paginated fetch |
/// | `UnsupportedProfileType` | An imported document's metadata `type` is not the supported format |
/// | `TargetNotValid` | A file-backed export target refuses to start (destination exists) |
/// | `OperationFailed` | Filesystem or other I/O errors |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The writer was asked to serialize a value it cannot express.
    ///
    /// Raised when:
    /// - A number leaf is not finite (NaN or infinity)
    ///
    /// This is a programming error on the caller's side and is never
    /// retried.
    #[error("unsupported value type: {0}")]
    UnsupportedValueType(String),

    /// The sequence of structural writer calls was invalid.
    ///
    /// Raised when:
    /// - An array or object is closed past the document root
    /// - A close call does not match the open container
    #[error("invalid writer state: {0}")]
    InvalidWriterState(String),

    /// The tokenizer met input it cannot classify.
    ///
    /// Raised when:
    /// - An unquoted token is neither `true`, `false`, `null` nor a
    ///   decimal number
    /// - A string contains an invalid escape sequence
    ///
    /// A malformed document cannot be partially trusted, so there is no
    /// recovery.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// The health store reported an error while fetching records.
    ///
    /// Exporters record the first such error, finish flushing the page
    /// already fetched, and re-raise it once the paginated walk exits.
    #[error("data write error: {0}")]
    DataWriteError(String),

    /// An imported document is not in the supported profile format.
    ///
    /// Raised before any store write occurs.
    #[error("unsupported profile type: {0}")]
    UnsupportedProfileType(String),

    /// An export target refused to start.
    ///
    /// Raised when a file-backed target's destination already exists and
    /// overwriting was not explicitly permitted.
    #[error("export target not valid: {0}")]
    TargetNotValid(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Filesystem I/O errors occur
    /// - The configuration file cannot be read or parsed
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Shorthand for an [`Error::OperationFailed`] with a cause.
    pub(crate) fn operation(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for healthpack operations.
pub type Result<T> = std::result::Result<T, Error>;
