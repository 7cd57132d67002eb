//! Typed record exporters.
//!
//! One exporter per record category. The per-type exporters share the
//! anchored pagination walk: fetch a page, flatten every record, hand
//! each mapping to every attached target, and loop while the last page
//! was full. The first error from a fetch or a target write is captured
//! in a collected-error slot and re-raised once after the walk, so
//! records already written stay in the output.

use super::config::ExportConfiguration;
use super::target::ExportTarget;
use crate::json::{FieldMap, JsonValue};
use crate::models::{Record, RecordPayload, SampleType, keys};
use crate::store::HealthStore;
use crate::{Error, Result};
use chrono::Utc;
use tracing::debug;

/// Records requested per anchored fetch.
pub const PAGE_SIZE: usize = 10_000;

/// One step of an export run.
pub trait DataExporter {
    /// Human-readable progress message for this step.
    fn message(&self) -> String;

    /// Runs the step against every attached target, returning the
    /// number of records written per target.
    ///
    /// # Errors
    ///
    /// Returns the first error captured during the step.
    fn export(
        &self,
        store: &dyn HealthStore,
        targets: &mut [&mut dyn ExportTarget],
    ) -> Result<usize>;
}

/// Writes the metadata block.
pub struct MetaDataExporter {
    config: ExportConfiguration,
    version: String,
}

impl MetaDataExporter {
    /// Creates the metadata exporter for one run.
    #[must_use]
    pub fn new(config: &ExportConfiguration, version: &str) -> Self {
        Self {
            config: config.clone(),
            version: version.to_string(),
        }
    }
}

impl DataExporter for MetaDataExporter {
    fn message(&self) -> String {
        "exporting metadata".to_string()
    }

    fn export(
        &self,
        _store: &dyn HealthStore,
        targets: &mut [&mut dyn ExportTarget],
    ) -> Result<usize> {
        // One creation date for the whole fan-out.
        let creation_date = Utc::now();
        for target in targets.iter_mut() {
            target.write_metadata(creation_date, &self.config.profile_name, &self.version)?;
        }
        Ok(0)
    }
}

/// Writes the user characteristics block.
pub struct UserDataExporter;

impl DataExporter for UserDataExporter {
    fn message(&self) -> String {
        "exporting user data".to_string()
    }

    fn export(
        &self,
        store: &dyn HealthStore,
        targets: &mut [&mut dyn ExportTarget],
    ) -> Result<usize> {
        let characteristics = store.characteristics()?;

        let mut fields = FieldMap::new();
        if let Some(date) = characteristics.date_of_birth {
            fields.put(keys::DATE_OF_BIRTH, date);
        }
        if let Some(sex) = characteristics.biological_sex {
            fields.put(keys::BIOLOGICAL_SEX, sex);
        }
        if let Some(blood) = characteristics.blood_type {
            fields.put(keys::BLOOD_TYPE, blood);
        }
        if let Some(skin) = characteristics.fitzpatrick_skin_type {
            fields.put(keys::FITZPATRICK_SKIN_TYPE, skin);
        }

        for target in targets.iter_mut() {
            target.write_user_data(&fields)?;
        }
        Ok(0)
    }
}

/// Exports one unit-bearing quantity type.
pub struct QuantityTypeDataExporter {
    paged: PagedTypeExport,
}

impl QuantityTypeDataExporter {
    /// Creates the exporter for one quantity type.
    #[must_use]
    pub fn new(config: &ExportConfiguration, sample_type: &'static SampleType) -> Self {
        Self {
            paged: PagedTypeExport::new(config, sample_type, PAGE_SIZE),
        }
    }
}

impl DataExporter for QuantityTypeDataExporter {
    fn message(&self) -> String {
        self.paged.message()
    }

    fn export(
        &self,
        store: &dyn HealthStore,
        targets: &mut [&mut dyn ExportTarget],
    ) -> Result<usize> {
        self.paged.export(store, targets)
    }
}

/// Exports one enumerated-category type.
pub struct CategoryTypeDataExporter {
    paged: PagedTypeExport,
}

impl CategoryTypeDataExporter {
    /// Creates the exporter for one category type.
    #[must_use]
    pub fn new(config: &ExportConfiguration, sample_type: &'static SampleType) -> Self {
        Self {
            paged: PagedTypeExport::new(config, sample_type, PAGE_SIZE),
        }
    }
}

impl DataExporter for CategoryTypeDataExporter {
    fn message(&self) -> String {
        self.paged.message()
    }

    fn export(
        &self,
        store: &dyn HealthStore,
        targets: &mut [&mut dyn ExportTarget],
    ) -> Result<usize> {
        self.paged.export(store, targets)
    }
}

/// Exports one grouped correlation type, flattening sub-records
/// recursively.
pub struct CorrelationTypeDataExporter {
    paged: PagedTypeExport,
}

impl CorrelationTypeDataExporter {
    /// Creates the exporter for one correlation type.
    #[must_use]
    pub fn new(config: &ExportConfiguration, sample_type: &'static SampleType) -> Self {
        Self {
            paged: PagedTypeExport::new(config, sample_type, PAGE_SIZE),
        }
    }
}

impl DataExporter for CorrelationTypeDataExporter {
    fn message(&self) -> String {
        self.paged.message()
    }

    fn export(
        &self,
        store: &dyn HealthStore,
        targets: &mut [&mut dyn ExportTarget],
    ) -> Result<usize> {
        self.paged.export(store, targets)
    }
}

/// Exports workout records with their ordered event lists.
pub struct WorkoutDataExporter {
    paged: PagedTypeExport,
}

impl WorkoutDataExporter {
    /// Creates the workout exporter.
    #[must_use]
    pub fn new(config: &ExportConfiguration, sample_type: &'static SampleType) -> Self {
        Self {
            paged: PagedTypeExport::new(config, sample_type, PAGE_SIZE),
        }
    }
}

impl DataExporter for WorkoutDataExporter {
    fn message(&self) -> String {
        self.paged.message()
    }

    fn export(
        &self,
        store: &dyn HealthStore,
        targets: &mut [&mut dyn ExportTarget],
    ) -> Result<usize> {
        self.paged.export(store, targets)
    }
}

/// The shared anchored-pagination walk over one type.
pub(crate) struct PagedTypeExport {
    config: ExportConfiguration,
    sample_type: &'static SampleType,
    page_size: usize,
}

impl PagedTypeExport {
    pub(crate) fn new(
        config: &ExportConfiguration,
        sample_type: &'static SampleType,
        page_size: usize,
    ) -> Self {
        Self {
            config: config.clone(),
            sample_type,
            page_size,
        }
    }

    fn message(&self) -> String {
        format!("exporting {}", self.sample_type.name)
    }

    pub(crate) fn export(
        &self,
        store: &dyn HealthStore,
        targets: &mut [&mut dyn ExportTarget],
    ) -> Result<usize> {
        for target in targets.iter_mut() {
            target.start_write_type(self.sample_type)?;
        }

        let filter = self.config.export_type.filter();
        let mut anchor = None;
        let mut written = 0_usize;
        let mut fetches = 0_usize;
        let mut collected: Option<Error> = None;

        loop {
            let page = match store.fetch_page(self.sample_type.name, filter, anchor, self.page_size)
            {
                Ok(page) => page,
                Err(e) => {
                    collected = Some(Error::DataWriteError(e.to_string()));
                    break;
                }
            };
            fetches += 1;
            let count = page.records.len();

            'records: for record in &page.records {
                let fields = flatten_record(record, self.config.export_uuids);
                for target in targets.iter_mut() {
                    if let Err(e) = target.write_record(&fields) {
                        collected = Some(e);
                        break 'records;
                    }
                }
                written += 1;
            }
            if collected.is_some() {
                break;
            }

            debug!(
                sample_type = self.sample_type.name,
                fetches, count, "fetched page"
            );
            anchor = Some(page.anchor);
            // A partial page means the sequence is exhausted; an exact
            // full page is the only signal more data may remain.
            if count < self.page_size {
                break;
            }
        }

        for target in targets.iter_mut() {
            // A target left mid-record by a failed write may refuse to
            // close its block; the first error of the walk wins.
            if let Err(e) = target.end_write_type() {
                if collected.is_none() {
                    collected = Some(e);
                }
            }
        }
        match collected {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }
}

/// Flattens one record into the document's field mapping.
///
/// The identifier is included only when uuid export is on, and the end
/// date only when it differs from the start date.
#[must_use]
pub fn flatten_record(record: &Record, export_uuids: bool) -> FieldMap {
    let mut fields = FieldMap::new();
    if export_uuids {
        if let Some(uuid) = record.uuid {
            fields.put(keys::UUID, uuid.to_string());
        }
    }
    fields.put(keys::START_DATE, record.start_date);
    if record.end_date != record.start_date {
        fields.put(keys::END_DATE, record.end_date);
    }

    match &record.payload {
        RecordPayload::Quantity { value, unit } => {
            fields.put(keys::VALUE, *value);
            fields.put(keys::UNIT, unit.as_str());
        }
        RecordPayload::Category { value } => {
            fields.put(keys::VALUE, *value);
        }
        RecordPayload::Correlation { objects } => {
            let nested: Vec<JsonValue> = objects
                .iter()
                .map(|sub| {
                    let mut sub_fields = flatten_record(sub, export_uuids);
                    sub_fields.put(keys::TYPE, sub.type_name.as_str());
                    JsonValue::Object(sub_fields)
                })
                .collect();
            fields.put(keys::OBJECTS, nested);
        }
        RecordPayload::Workout {
            activity_type,
            duration,
            total_distance,
            total_energy_burned,
            events,
        } => {
            fields.put(keys::WORKOUT_ACTIVITY_TYPE, *activity_type);
            if let Some(duration) = duration {
                fields.put(keys::DURATION, *duration);
            }
            if let Some(distance) = total_distance {
                fields.put(keys::TOTAL_DISTANCE, *distance);
            }
            if let Some(energy) = total_energy_burned {
                fields.put(keys::TOTAL_ENERGY_BURNED, *energy);
            }
            let nested: Vec<JsonValue> = events
                .iter()
                .map(|event| {
                    let mut event_fields = FieldMap::new();
                    event_fields.put(keys::TYPE, event.event_type);
                    event_fields.put(keys::EVENT_START_DATE, event.date);
                    JsonValue::Object(event_fields)
                })
                .collect();
            fields.put(keys::WORKOUT_EVENTS, nested);
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkoutEvent;
    use chrono::{DateTime, TimeZone};
    use uuid::Uuid;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_category_record_flattens_without_uuid_or_edate() {
        let record = Record {
            type_name: "HKCategoryTypeIdentifierSleepAnalysis".to_string(),
            uuid: Some(Uuid::new_v4()),
            start_date: at(1_700_000_000_000),
            end_date: at(1_700_000_000_000),
            payload: RecordPayload::Category { value: 1 },
        };

        let fields = flatten_record(&record, false);
        assert!(!fields.contains_key(keys::UUID));
        assert!(!fields.contains_key(keys::END_DATE));
        assert_eq!(
            fields.get(keys::START_DATE),
            Some(&JsonValue::Date(at(1_700_000_000_000)))
        );
        assert_eq!(fields.get(keys::VALUE).and_then(JsonValue::as_i64), Some(1));
    }

    #[test]
    fn test_distinct_end_date_is_kept() {
        let record = Record::category(
            "HKCategoryTypeIdentifierSleepAnalysis",
            at(1_700_000_000_000),
            at(1_700_000_360_000),
            0,
        );
        let fields = flatten_record(&record, false);
        assert_eq!(
            fields.get(keys::END_DATE),
            Some(&JsonValue::Date(at(1_700_000_360_000)))
        );
    }

    #[test]
    fn test_uuid_included_only_when_enabled() {
        let record = Record::quantity(
            "HKQuantityTypeIdentifierStepCount",
            at(1_700_000_000_000),
            11.0,
            "count",
        );
        assert!(flatten_record(&record, true).contains_key(keys::UUID));
        assert!(!flatten_record(&record, false).contains_key(keys::UUID));
    }

    #[test]
    fn test_correlation_sub_records_carry_type_annotation() {
        let systolic = Record::quantity(
            "HKQuantityTypeIdentifierBloodPressureSystolic",
            at(1_700_000_000_000),
            120.0,
            "mmHg",
        );
        let record = Record {
            type_name: "HKCorrelationTypeIdentifierBloodPressure".to_string(),
            uuid: None,
            start_date: at(1_700_000_000_000),
            end_date: at(1_700_000_000_000),
            payload: RecordPayload::Correlation {
                objects: vec![systolic],
            },
        };

        let fields = flatten_record(&record, false);
        let objects = fields.get(keys::OBJECTS).and_then(JsonValue::as_array).unwrap();
        let sub = objects[0].as_object().unwrap();
        assert_eq!(
            sub.get(keys::TYPE).and_then(JsonValue::as_str),
            Some("HKQuantityTypeIdentifierBloodPressureSystolic")
        );
        assert_eq!(sub.get(keys::VALUE).and_then(JsonValue::as_f64), Some(120.0));
    }

    #[test]
    fn test_first_error_of_the_walk_survives_block_close() {
        use crate::export::config::ExportType;
        use crate::store::InMemoryHealthStore;

        /// Fails every record write, then refuses to close the block.
        struct BrokenTarget;

        impl ExportTarget for BrokenTarget {
            fn is_valid(&self) -> bool {
                true
            }
            fn start_export(&mut self) -> Result<()> {
                Ok(())
            }
            fn write_metadata(
                &mut self,
                _creation_date: DateTime<Utc>,
                _profile_name: &str,
                _version: &str,
            ) -> Result<()> {
                Ok(())
            }
            fn write_user_data(&mut self, _user_data: &FieldMap) -> Result<()> {
                Ok(())
            }
            fn start_write_type(&mut self, _sample_type: &SampleType) -> Result<()> {
                Ok(())
            }
            fn write_record(&mut self, _record: &FieldMap) -> Result<()> {
                Err(Error::DataWriteError("record write failed".to_string()))
            }
            fn end_write_type(&mut self) -> Result<()> {
                Err(Error::InvalidWriterState("block left mid-record".to_string()))
            }
            fn end_export(&mut self) -> Result<()> {
                Ok(())
            }
        }

        let mut store = InMemoryHealthStore::new();
        store.insert_external(Record::quantity(
            "HKQuantityTypeIdentifierStepCount",
            at(1_700_000_000_000),
            11.0,
            "count",
        ));
        let config = crate::export::ExportConfiguration::new("Broken", ExportType::All);
        let sample = crate::models::sample_type("HKQuantityTypeIdentifierStepCount").unwrap();

        let mut target = BrokenTarget;
        let mut targets: [&mut dyn ExportTarget; 1] = [&mut target];
        let err = PagedTypeExport::new(&config, sample, PAGE_SIZE)
            .export(&store, &mut targets)
            .unwrap_err();
        // The failed write is reported, not the later block-close error.
        assert!(matches!(err, Error::DataWriteError(_)));
    }

    #[test]
    fn test_workout_events_use_their_own_date_key() {
        let record = Record {
            type_name: "HKWorkoutTypeIdentifier".to_string(),
            uuid: None,
            start_date: at(1_700_000_000_000),
            end_date: at(1_700_003_600_000),
            payload: RecordPayload::Workout {
                activity_type: 37,
                duration: Some(3600.0),
                total_distance: Some(10_000.0),
                total_energy_burned: None,
                events: vec![WorkoutEvent {
                    event_type: 1,
                    date: at(1_700_001_000_000),
                }],
            },
        };

        let fields = flatten_record(&record, false);
        assert!(!fields.contains_key(keys::TOTAL_ENERGY_BURNED));
        let events = fields
            .get(keys::WORKOUT_EVENTS)
            .and_then(JsonValue::as_array)
            .unwrap();
        let event = events[0].as_object().unwrap();
        assert!(event.contains_key(keys::EVENT_START_DATE));
        assert!(!event.contains_key(keys::START_DATE));
    }
}
