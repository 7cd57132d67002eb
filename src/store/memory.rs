//! In-memory store used by the CLI demo flows and the tests.

use super::{Anchor, HealthStore, RecordFilter, RecordPage};
use crate::Result;
use crate::models::{Record, UserCharacteristics};

/// Provenance flags kept next to each stored record.
#[derive(Debug, Clone)]
struct StoredRecord {
    record: Record,
    /// Written by this application (its own source).
    own_source: bool,
    /// Carries the generator marker metadata key.
    generated: bool,
}

/// A [`HealthStore`] backed by a plain vector.
///
/// Pagination anchors are offsets into the filtered sequence, which is
/// stable because the store is append-only.
#[derive(Debug, Default)]
pub struct InMemoryHealthStore {
    characteristics: UserCharacteristics,
    records: Vec<StoredRecord>,
}

impl InMemoryHealthStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the owner's characteristics.
    pub fn set_characteristics(&mut self, characteristics: UserCharacteristics) {
        self.characteristics = characteristics;
    }

    /// Inserts a record written by another source.
    pub fn insert_external(&mut self, record: Record) {
        self.records.push(StoredRecord {
            record,
            own_source: false,
            generated: false,
        });
    }

    /// Inserts a record written by this application, optionally carrying
    /// the generator marker.
    pub fn insert_own(&mut self, record: Record, generated: bool) {
        self.records.push(StoredRecord {
            record,
            own_source: true,
            generated,
        });
    }

    /// Total number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Counts stored records of one type, ignoring filters.
    #[must_use]
    pub fn count_of_type(&self, type_name: &str) -> usize {
        self.records
            .iter()
            .filter(|s| s.record.type_name == type_name)
            .count()
    }

    fn matches(stored: &StoredRecord, type_name: &str, filter: RecordFilter) -> bool {
        if stored.record.type_name != type_name {
            return false;
        }
        match filter {
            RecordFilter::All => true,
            RecordFilter::FromThisSource => stored.own_source,
            RecordFilter::WithGeneratorMarker => stored.generated,
        }
    }
}

impl HealthStore for InMemoryHealthStore {
    fn characteristics(&self) -> Result<UserCharacteristics> {
        Ok(self.characteristics.clone())
    }

    fn fetch_page(
        &self,
        type_name: &str,
        filter: RecordFilter,
        anchor: Option<Anchor>,
        limit: usize,
    ) -> Result<RecordPage> {
        let offset = anchor.map_or(0, |a| usize::try_from(a.value()).unwrap_or(usize::MAX));
        let records: Vec<Record> = self
            .records
            .iter()
            .filter(|s| Self::matches(s, type_name, filter))
            .skip(offset)
            .take(limit)
            .map(|s| s.record.clone())
            .collect();
        let next = offset + records.len();
        Ok(RecordPage {
            records,
            anchor: Anchor::new(next as u64),
        })
    }

    fn save(&mut self, records: Vec<Record>) -> Result<()> {
        for record in records {
            // Imported records count as this application's own writes.
            self.insert_own(record, false);
        }
        Ok(())
    }
}
