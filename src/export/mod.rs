//! Profile export pipeline.
//!
//! An export run pulls paginated records from a [`crate::store::HealthStore`],
//! flattens each record to a field mapping, and streams the mappings
//! through one or more [`ExportTarget`]s. Targets may be driven in
//! parallel from the same pass (fan-out), so one run can produce an
//! in-memory copy and a file copy with identical record order.

mod config;
mod exporters;
mod queue;
mod service;
mod target;

pub use config::{ExportConfiguration, ExportType};
pub use exporters::{
    CategoryTypeDataExporter, CorrelationTypeDataExporter, DataExporter, MetaDataExporter,
    PAGE_SIZE, QuantityTypeDataExporter, UserDataExporter, WorkoutDataExporter,
};
pub use queue::ExportQueue;
pub use service::{ExportService, ExportSummary};
pub use target::{DOC_TYPE, ExportTarget, JsonSingleDocExportTarget, PROFILE_SUFFIX};
