//! Sample-type catalog and user characteristics.

use chrono::{DateTime, Utc};

/// The four record categories, each with its own document block shape
/// and flattening rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// Unit-bearing numeric series.
    Quantity,
    /// Enumerated category series.
    Category,
    /// Grouped record owning a set of sub-records.
    Correlation,
    /// Interval record with ordered events.
    Workout,
}

/// A record type the pipeline knows how to export and import.
///
/// The name doubles as the JSON key of the type's top-level block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleType {
    /// Type name, used as the document block key.
    pub name: &'static str,
    /// Record category, decides block shape and flattening.
    pub kind: SampleKind,
    /// Unit of a quantity type, `None` for the other kinds.
    pub unit: Option<&'static str>,
}

/// The full ordered catalog of supported types. Export walks this list
/// in order, so block order in the document is stable.
#[must_use]
pub fn catalog() -> &'static [SampleType] {
    &[
        SampleType {
            name: "HKQuantityTypeIdentifierStepCount",
            kind: SampleKind::Quantity,
            unit: Some("count"),
        },
        SampleType {
            name: "HKQuantityTypeIdentifierHeartRate",
            kind: SampleKind::Quantity,
            unit: Some("count/min"),
        },
        SampleType {
            name: "HKQuantityTypeIdentifierBodyMass",
            kind: SampleKind::Quantity,
            unit: Some("kg"),
        },
        SampleType {
            name: "HKQuantityTypeIdentifierActiveEnergyBurned",
            kind: SampleKind::Quantity,
            unit: Some("kcal"),
        },
        SampleType {
            name: "HKQuantityTypeIdentifierBloodPressureSystolic",
            kind: SampleKind::Quantity,
            unit: Some("mmHg"),
        },
        SampleType {
            name: "HKQuantityTypeIdentifierBloodPressureDiastolic",
            kind: SampleKind::Quantity,
            unit: Some("mmHg"),
        },
        SampleType {
            name: "HKCategoryTypeIdentifierSleepAnalysis",
            kind: SampleKind::Category,
            unit: None,
        },
        SampleType {
            name: "HKCorrelationTypeIdentifierBloodPressure",
            kind: SampleKind::Correlation,
            unit: None,
        },
        SampleType {
            name: "HKWorkoutTypeIdentifier",
            kind: SampleKind::Workout,
            unit: None,
        },
    ]
}

/// Looks a sample type up by its block key.
#[must_use]
pub fn sample_type(name: &str) -> Option<&'static SampleType> {
    catalog().iter().find(|t| t.name == name)
}

/// Scalar profile fields of the store's owner. Every field can be
/// unset, in which case it is omitted from the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserCharacteristics {
    /// Date of birth.
    pub date_of_birth: Option<DateTime<Utc>>,
    /// Biological sex code.
    pub biological_sex: Option<i64>,
    /// Blood type code.
    pub blood_type: Option<i64>,
    /// Fitzpatrick skin type code.
    pub fitzpatrick_skin_type: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup_by_name() {
        let t = sample_type("HKQuantityTypeIdentifierStepCount").unwrap();
        assert_eq!(t.kind, SampleKind::Quantity);
        assert_eq!(t.unit, Some("count"));
        assert!(sample_type("NoSuchType").is_none());
    }

    #[test]
    fn test_only_quantity_types_carry_units() {
        for t in catalog() {
            assert_eq!(t.unit.is_some(), t.kind == SampleKind::Quantity);
        }
    }
}
