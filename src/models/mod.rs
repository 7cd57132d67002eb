//! Domain model: records, sample types, user characteristics.
//!
//! Everything that crosses the wire is keyed by the constants in
//! [`keys`], so the exporters and the record creators can never drift
//! apart on spelling.

mod record;
mod types;

pub use record::{Record, RecordPayload, WorkoutEvent};
pub use types::{SampleKind, SampleType, UserCharacteristics, catalog, sample_type};

/// JSON key names of the document format.
///
/// Record dictionaries use lower-case `sdate`/`edate`; workout event
/// dictionaries use `sDate`. The mismatch is part of the format.
pub mod keys {
    /// Stable record identifier, present only when uuid export is on.
    pub const UUID: &str = "uuid";
    /// Record start timestamp, milliseconds since the Unix epoch.
    pub const START_DATE: &str = "sdate";
    /// Record end timestamp, omitted when equal to the start.
    pub const END_DATE: &str = "edate";
    /// Numeric or categorical value.
    pub const VALUE: &str = "value";
    /// Unit string of a quantity record.
    pub const UNIT: &str = "unit";
    /// Sub-records of a correlation record.
    pub const OBJECTS: &str = "objects";
    /// Type name annotation on correlation sub-records, and the
    /// document format discriminator inside the metadata block.
    pub const TYPE: &str = "type";
    /// Workout activity code.
    pub const WORKOUT_ACTIVITY_TYPE: &str = "workoutActivityType";
    /// Workout duration in seconds.
    pub const DURATION: &str = "duration";
    /// Workout total distance.
    pub const TOTAL_DISTANCE: &str = "totalDistance";
    /// Workout total energy burned.
    pub const TOTAL_ENERGY_BURNED: &str = "totalEnergyBurned";
    /// Ordered pause/resume style events of a workout.
    pub const WORKOUT_EVENTS: &str = "workoutEvents";
    /// Workout event timestamp.
    pub const EVENT_START_DATE: &str = "sDate";
    /// Wrapper field of a unit-bearing type block.
    pub const DATA: &str = "data";

    /// Top-level metadata block.
    pub const META_DATA: &str = "metaData";
    /// Metadata: document creation timestamp.
    pub const CREATION_DATE: &str = "creationDate";
    /// Metadata: profile name.
    pub const PROFILE_NAME: &str = "profileName";
    /// Metadata: format version.
    pub const VERSION: &str = "version";

    /// Top-level user characteristics block.
    pub const USER_DATA: &str = "userData";
    /// User characteristic: date of birth.
    pub const DATE_OF_BIRTH: &str = "dateOfBirth";
    /// User characteristic: biological sex code.
    pub const BIOLOGICAL_SEX: &str = "biologicalSex";
    /// User characteristic: blood type code.
    pub const BLOOD_TYPE: &str = "bloodType";
    /// User characteristic: Fitzpatrick skin type code.
    pub const FITZPATRICK_SKIN_TYPE: &str = "fitzpatrickSkinType";
}
