//! Streaming profile import into a health store.

use super::creators::create_record;
use super::handlers::RecordAccumulatorHandler;
use super::profile::Profile;
use crate::export::DOC_TYPE;
use crate::json::JsonReader;
use crate::models::Record;
use crate::store::HealthStore;
use crate::{Error, Result};
use std::cell::{Cell, RefCell};
use tracing::{debug, info};

/// Records buffered between store saves.
const BATCH_SIZE: usize = 1000;

/// Outcome of one import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// Profile name from the document's metadata block.
    pub profile_name: String,
    /// Records saved to the store.
    pub records_imported: usize,
}

/// Imports a profile document into a store.
///
/// The format discriminator in the metadata block is verified before
/// any store write occurs; a document of any other type fails the whole
/// import up front. Records then stream through the accumulator handler
/// one at a time and are saved in batches.
#[derive(Debug)]
pub struct ProfileImporter {
    batch_size: usize,
}

impl ProfileImporter {
    /// Creates an importer with the default batch size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            batch_size: BATCH_SIZE,
        }
    }

    /// Runs one import.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedProfileType`] if the document is not
    /// in the supported format, or any read, creation or store error.
    pub fn import(
        &self,
        store: &mut dyn HealthStore,
        profile: &Profile,
    ) -> Result<ImportSummary> {
        let metadata = profile.load_metadata()?;
        if metadata.doc_type != DOC_TYPE {
            return Err(Error::UnsupportedProfileType(metadata.doc_type));
        }
        info!(
            profile = metadata.profile_name.as_str(),
            file = profile.file_name.as_str(),
            "importing profile"
        );

        let store = RefCell::new(store);
        let pending: RefCell<Vec<Record>> = RefCell::new(Vec::new());
        let imported = Cell::new(0_usize);
        {
            let handler = RecordAccumulatorHandler::new(|fields, type_name| {
                let record = create_record(type_name, &fields)?;
                let mut batch = pending.borrow_mut();
                batch.push(record);
                imported.set(imported.get() + 1);
                if batch.len() >= self.batch_size {
                    let drained: Vec<Record> = batch.drain(..).collect();
                    drop(batch);
                    debug!(count = drained.len(), "saving record batch");
                    store.borrow_mut().save(drained)?;
                }
                Ok(())
            });
            JsonReader::read_file(profile.path(), handler)?;
        }

        let rest = pending.into_inner();
        if !rest.is_empty() {
            store.into_inner().save(rest)?;
        }

        let summary = ImportSummary {
            profile_name: metadata.profile_name,
            records_imported: imported.get(),
        };
        info!(
            profile = summary.profile_name.as_str(),
            records = summary.records_imported,
            "import finished"
        );
        Ok(summary)
    }
}

impl Default for ProfileImporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryHealthStore, RecordFilter};

    const DOC: &str = "{\"metaData\":{\"creationDate\":1700000000000,\
        \"profileName\":\"Maria\",\"version\":\"1.0.0\",\
        \"type\":\"JsonSingleDocExportTarget\"},\
        \"userData\":{\"biologicalSex\":2},\
        \"HKQuantityTypeIdentifierStepCount\":{\"unit\":\"count\",\
        \"data\":[{\"sdate\":1700000000000,\"value\":11,\"unit\":\"count\"},\
        {\"sdate\":1700000060000,\"value\":12,\"unit\":\"count\"}]},\
        \"HKCategoryTypeIdentifierSleepAnalysis\":[\
        {\"sdate\":1700000000000,\"edate\":1700003600000,\"value\":1}]}";

    fn profile_with(dir: &tempfile::TempDir, doc: &str) -> Profile {
        let path = dir.path().join("p.json.hsg");
        std::fs::write(&path, doc).unwrap();
        Profile::at(&path).unwrap()
    }

    #[test]
    fn test_import_saves_all_records() {
        let dir = tempfile::tempdir().unwrap();
        let profile = profile_with(&dir, DOC);
        let mut store = InMemoryHealthStore::new();

        let summary = ProfileImporter::new().import(&mut store, &profile).unwrap();
        assert_eq!(summary.profile_name, "Maria");
        assert_eq!(summary.records_imported, 3);
        assert_eq!(store.count_of_type("HKQuantityTypeIdentifierStepCount"), 2);
        assert_eq!(store.count_of_type("HKCategoryTypeIdentifierSleepAnalysis"), 1);

        // Imported records belong to this application's source.
        let page = store
            .fetch_page(
                "HKQuantityTypeIdentifierStepCount",
                RecordFilter::FromThisSource,
                None,
                10,
            )
            .unwrap();
        assert_eq!(page.records.len(), 2);
    }

    #[test]
    fn test_wrong_doc_type_fails_before_any_write() {
        let doc = DOC.replace("JsonSingleDocExportTarget", "CsvExportTarget");
        let dir = tempfile::tempdir().unwrap();
        let profile = profile_with(&dir, &doc);
        let mut store = InMemoryHealthStore::new();

        let err = ProfileImporter::new().import(&mut store, &profile).unwrap_err();
        assert!(matches!(err, Error::UnsupportedProfileType(_)));
        assert!(store.is_empty());
    }
}
