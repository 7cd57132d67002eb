//! Export run orchestration.

use super::config::ExportConfiguration;
use super::exporters::{
    CategoryTypeDataExporter, CorrelationTypeDataExporter, DataExporter, MetaDataExporter,
    QuantityTypeDataExporter, UserDataExporter, WorkoutDataExporter,
};
use super::target::ExportTarget;
use crate::models::{SampleKind, catalog};
use crate::store::HealthStore;
use crate::{Error, Result};
use tracing::info;

/// Version string written into the metadata block.
pub(crate) const FORMAT_VERSION: &str = "1.0.0";

/// Outcome of one export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    /// Records written per target, across all type blocks.
    pub records_exported: usize,
}

/// Drives one export run end to end.
///
/// Checks every target's validity, opens the document, runs the
/// metadata and user data exporters, then one per-type exporter for
/// every catalog entry in order, and closes the document. Constructed
/// per call site; holds no global state.
#[derive(Debug, Default)]
pub struct ExportService {
    version: String,
}

impl ExportService {
    /// Creates a service writing the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
        }
    }

    /// Runs one export against every attached target.
    ///
    /// `progress` is invoked with a message before each exporter runs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TargetNotValid`] if any target refuses to
    /// start, or the first error any exporter raises.
    pub fn export(
        &self,
        store: &dyn HealthStore,
        config: &ExportConfiguration,
        targets: &mut [&mut dyn ExportTarget],
        mut progress: impl FnMut(&str),
    ) -> Result<ExportSummary> {
        for target in targets.iter() {
            if !target.is_valid() {
                return Err(Error::TargetNotValid(
                    "an export target refused to start".to_string(),
                ));
            }
        }

        for target in targets.iter_mut() {
            target.start_export()?;
        }

        let mut records_exported = 0_usize;
        for exporter in self.exporters(config) {
            let message = exporter.message();
            progress(&message);
            info!(profile = config.profile_name.as_str(), "{message}");
            records_exported += exporter.export(store, targets)?;
        }

        for target in targets.iter_mut() {
            target.end_export()?;
        }

        info!(
            profile = config.profile_name.as_str(),
            records_exported, "export finished"
        );
        Ok(ExportSummary { records_exported })
    }

    /// The ordered exporter list for one run: metadata, user data, then
    /// one exporter per catalog type.
    fn exporters(&self, config: &ExportConfiguration) -> Vec<Box<dyn DataExporter>> {
        let mut exporters: Vec<Box<dyn DataExporter>> = vec![
            Box::new(MetaDataExporter::new(config, &self.version)),
            Box::new(UserDataExporter),
        ];
        for sample_type in catalog() {
            exporters.push(match sample_type.kind {
                SampleKind::Quantity => Box::new(QuantityTypeDataExporter::new(config, sample_type)),
                SampleKind::Category => Box::new(CategoryTypeDataExporter::new(config, sample_type)),
                SampleKind::Correlation => {
                    Box::new(CorrelationTypeDataExporter::new(config, sample_type))
                }
                SampleKind::Workout => Box::new(WorkoutDataExporter::new(config, sample_type)),
            });
        }
        exporters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::config::ExportType;
    use crate::export::target::JsonSingleDocExportTarget;
    use crate::models::UserCharacteristics;
    use crate::store::InMemoryHealthStore;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_export_writes_every_catalog_block() {
        let mut store = InMemoryHealthStore::new();
        store.set_characteristics(UserCharacteristics {
            biological_sex: Some(2),
            ..UserCharacteristics::default()
        });
        let date = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        store.insert_external(crate::models::Record::quantity(
            "HKQuantityTypeIdentifierStepCount",
            date,
            11.0,
            "count",
        ));

        let config = ExportConfiguration::new("Maria", ExportType::All).with_uuids(false);
        let mut target = JsonSingleDocExportTarget::in_memory();
        let mut messages = Vec::new();

        let summary = ExportService::new()
            .export(&store, &config, &mut [&mut target], |m| {
                messages.push(m.to_string());
            })
            .unwrap();
        assert_eq!(summary.records_exported, 1);
        assert_eq!(messages[0], "exporting metadata");

        let json = target.into_json().unwrap();
        assert!(json.starts_with("{\"metaData\":{"));
        assert!(json.contains("\"userData\":{\"biologicalSex\":2}"));
        assert!(json.contains(
            "\"HKQuantityTypeIdentifierStepCount\":{\"unit\":\"count\",\"data\":[{\"sdate\":1700000000000,\"value\":11,\"unit\":\"count\"}]}"
        ));
        // Empty catalog types still get their (empty) blocks.
        assert!(json.contains("\"HKWorkoutTypeIdentifier\":[]"));
        assert!(json.ends_with('}'));
    }

    #[test]
    fn test_invalid_target_aborts_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let taken = dir.path().join("p.json.hsg");
        std::fs::write(&taken, "{}").unwrap();

        let store = InMemoryHealthStore::new();
        let config = ExportConfiguration::new("Maria", ExportType::All);
        let mut target = JsonSingleDocExportTarget::to_file(&taken, false);

        let err = ExportService::new()
            .export(&store, &config, &mut [&mut target], |_| {})
            .unwrap_err();
        assert!(matches!(err, Error::TargetNotValid(_)));
        // The refused run must not have touched the existing file.
        assert_eq!(std::fs::read_to_string(&taken).unwrap(), "{}");
    }

    #[test]
    fn test_fan_out_produces_identical_documents() {
        let mut store = InMemoryHealthStore::new();
        let date = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        store.insert_external(crate::models::Record::quantity(
            "HKQuantityTypeIdentifierHeartRate",
            date,
            61.0,
            "count/min",
        ));

        let config = ExportConfiguration::new("Maria", ExportType::All).with_uuids(false);
        let mut a = JsonSingleDocExportTarget::in_memory();
        let mut b = JsonSingleDocExportTarget::in_memory();

        ExportService::new()
            .export(&store, &config, &mut [&mut a, &mut b], |_| {})
            .unwrap();
        assert_eq!(a.into_json().unwrap(), b.into_json().unwrap());
    }
}
