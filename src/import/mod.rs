//! Profile import pipeline.
//!
//! Import is the reverse data flow of export: a profile file streams
//! through the tokenizer into handlers that reconstruct one record at a
//! time, the creators turn each flattened mapping back into a typed
//! [`crate::models::Record`], and the importer saves the records to a
//! store in batches. Memory stays bounded by one record regardless of
//! document size.

mod creators;
mod handlers;
mod importer;
mod profile;

pub use creators::create_record;
pub use handlers::{MetaDataHandler, RecordAccumulatorHandler};
pub use importer::{ImportSummary, ProfileImporter};
pub use profile::{Profile, ProfileMetadata, normalize_file_name, read_profiles_from_dir};
