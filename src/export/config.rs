//! Export run configuration.

use crate::store::RecordFilter;

/// Which subset of the store an export run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportType {
    /// Every record, regardless of source.
    #[default]
    All,
    /// Only records this application wrote itself.
    AddedByThisApp,
    /// Only records carrying the generator marker.
    GeneratedByThisApp,
}

impl ExportType {
    /// The store filter this export type maps to.
    #[must_use]
    pub fn filter(self) -> RecordFilter {
        match self {
            Self::All => RecordFilter::All,
            Self::AddedByThisApp => RecordFilter::FromThisSource,
            Self::GeneratedByThisApp => RecordFilter::WithGeneratorMarker,
        }
    }
}

/// Immutable description of one export run.
#[derive(Debug, Clone)]
pub struct ExportConfiguration {
    /// Subset of the store to export.
    pub export_type: ExportType,
    /// Free-text profile name, written into the metadata block and used
    /// as the default file stem.
    pub profile_name: String,
    /// Whether per-record identifiers are embedded. Omitting them
    /// shrinks the output and anonymizes it.
    pub export_uuids: bool,
}

impl ExportConfiguration {
    /// Creates a configuration with uuid export enabled.
    #[must_use]
    pub fn new(profile_name: &str, export_type: ExportType) -> Self {
        Self {
            export_type,
            profile_name: profile_name.to_string(),
            export_uuids: true,
        }
    }

    /// Sets whether per-record identifiers are embedded.
    #[must_use]
    pub fn with_uuids(mut self, export_uuids: bool) -> Self {
        self.export_uuids = export_uuids;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_type_maps_to_store_filter() {
        assert_eq!(ExportType::All.filter(), RecordFilter::All);
        assert_eq!(
            ExportType::AddedByThisApp.filter(),
            RecordFilter::FromThisSource
        );
        assert_eq!(
            ExportType::GeneratedByThisApp.filter(),
            RecordFilter::WithGeneratorMarker
        );
    }
}
