//! The exportable record unit.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One pause/resume style event inside a workout.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutEvent {
    /// Event type code.
    pub event_type: i64,
    /// When the event occurred.
    pub date: DateTime<Utc>,
}

/// Type-specific payload of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordPayload {
    /// Unit-bearing numeric sample.
    Quantity {
        /// Measured value.
        value: f64,
        /// Unit string, e.g. `count/min`.
        unit: String,
    },
    /// Enumerated category sample.
    Category {
        /// Category code.
        value: i64,
    },
    /// Grouped sample owning a set of sub-records.
    Correlation {
        /// Contained records, each carrying its own type name.
        objects: Vec<Record>,
    },
    /// Interval record with totals and ordered events.
    Workout {
        /// Activity code.
        activity_type: i64,
        /// Duration in seconds.
        duration: Option<f64>,
        /// Total distance covered.
        total_distance: Option<f64>,
        /// Total energy burned.
        total_energy_burned: Option<f64>,
        /// Ordered pause/resume events.
        events: Vec<WorkoutEvent>,
    },
}

/// One exportable unit of domain data.
///
/// `end_date` always holds the true end; a record whose measurement is
/// instantaneous has `end_date == start_date`, and the document format
/// omits the end date in exactly that case.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Type name, matching an entry in the catalog.
    pub type_name: String,
    /// Stable identifier, if the store assigned one.
    pub uuid: Option<Uuid>,
    /// Start timestamp.
    pub start_date: DateTime<Utc>,
    /// End timestamp, equal to `start_date` for instantaneous records.
    pub end_date: DateTime<Utc>,
    /// Type-specific payload.
    pub payload: RecordPayload,
}

impl Record {
    /// Creates an instantaneous quantity record with a fresh uuid.
    #[must_use]
    pub fn quantity(
        type_name: &str,
        date: DateTime<Utc>,
        value: f64,
        unit: &str,
    ) -> Self {
        Self {
            type_name: type_name.to_string(),
            uuid: Some(Uuid::new_v4()),
            start_date: date,
            end_date: date,
            payload: RecordPayload::Quantity {
                value,
                unit: unit.to_string(),
            },
        }
    }

    /// Creates a category record spanning a time interval with a fresh
    /// uuid.
    #[must_use]
    pub fn category(
        type_name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        value: i64,
    ) -> Self {
        Self {
            type_name: type_name.to_string(),
            uuid: Some(Uuid::new_v4()),
            start_date: start,
            end_date: end,
            payload: RecordPayload::Category { value },
        }
    }
}
