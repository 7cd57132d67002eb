//! The external health-store contract.
//!
//! The pipeline depends only on this narrow trait, never on store
//! internals: a characteristics accessor, an anchored page query, and a
//! save operation for imported records. Queries are synchronous; the
//! exporter issues one page request at a time and processes pages in
//! issuance order.

mod memory;

pub use memory::InMemoryHealthStore;

use crate::Result;
use crate::models::{Record, UserCharacteristics};

/// Opaque pagination continuation token.
///
/// A store hands a fresh anchor back with every page; the caller treats
/// it as a black box and passes it into the next fetch. `None` denotes
/// the start of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor(u64);

impl Anchor {
    /// Wraps a store-private continuation value.
    #[must_use]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The wrapped continuation value, for store implementations.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Subset predicate applied when pulling records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFilter {
    /// No source filter.
    All,
    /// Restrict to records this application wrote itself.
    FromThisSource,
    /// Restrict to records carrying the generator marker.
    WithGeneratorMarker,
}

/// One page of an anchored query.
#[derive(Debug, Clone)]
pub struct RecordPage {
    /// The records of this page, at most `limit` of them.
    pub records: Vec<Record>,
    /// Continuation token for the next fetch.
    pub anchor: Anchor,
}

/// The store collaborator the pipeline exports from and imports into.
pub trait HealthStore {
    /// Returns the owner's scalar profile fields, each possibly unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    fn characteristics(&self) -> Result<UserCharacteristics>;

    /// Fetches one page of records of a type.
    ///
    /// Returns at most `limit` records and a new anchor. A page with
    /// fewer than `limit` records means the sequence is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn fetch_page(
        &self,
        type_name: &str,
        filter: RecordFilter,
        anchor: Option<Anchor>,
        limit: usize,
    ) -> Result<RecordPage>;

    /// Persists reconstructed records.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the batch.
    fn save(&mut self, records: Vec<Record>) -> Result<()>;
}
