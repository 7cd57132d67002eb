//! Record creators: flattened mappings back into typed records.

use crate::json::{FieldMap, JsonValue};
use crate::models::{
    Record, RecordPayload, SampleKind, WorkoutEvent, keys, sample_type,
};
use crate::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

/// Rebuilds one typed record from a flattened record mapping.
///
/// Timeframe rule: a mapping without an end date describes an
/// instantaneous record, so the end date defaults to the start date.
///
/// # Errors
///
/// Returns [`Error::MalformedDocument`] when the type is unknown or a
/// required field is missing or has the wrong shape.
pub fn create_record(type_name: &str, fields: &FieldMap) -> Result<Record> {
    let sample = sample_type(type_name).ok_or_else(|| {
        Error::MalformedDocument(format!("unknown record type: {type_name}"))
    })?;

    let uuid = match fields.get(keys::UUID).and_then(JsonValue::as_str) {
        Some(text) => Some(Uuid::parse_str(text).map_err(|_| {
            Error::MalformedDocument(format!("invalid record uuid: {text}"))
        })?),
        None => None,
    };
    let start_date = required_date(fields, keys::START_DATE, type_name)?;
    let end_date = match fields.get(keys::END_DATE) {
        Some(value) => date_from(value, keys::END_DATE, type_name)?,
        None => start_date,
    };

    let payload = match sample.kind {
        SampleKind::Quantity => create_quantity(sample.unit, fields, type_name)?,
        SampleKind::Category => RecordPayload::Category {
            value: required_i64(fields, keys::VALUE, type_name)?,
        },
        SampleKind::Correlation => create_correlation(fields, type_name)?,
        SampleKind::Workout => create_workout(fields, type_name)?,
    };

    Ok(Record {
        type_name: type_name.to_string(),
        uuid,
        start_date,
        end_date,
        payload,
    })
}

fn create_quantity(
    default_unit: Option<&str>,
    fields: &FieldMap,
    type_name: &str,
) -> Result<RecordPayload> {
    let unit = fields
        .get(keys::UNIT)
        .and_then(JsonValue::as_str)
        .or(default_unit)
        .ok_or_else(|| {
            Error::MalformedDocument(format!("quantity record without a unit: {type_name}"))
        })?;
    Ok(RecordPayload::Quantity {
        value: required_f64(fields, keys::VALUE, type_name)?,
        unit: unit.to_string(),
    })
}

fn create_correlation(fields: &FieldMap, type_name: &str) -> Result<RecordPayload> {
    let mut objects = Vec::new();
    if let Some(subs) = fields.get(keys::OBJECTS).and_then(JsonValue::as_array) {
        for sub in subs {
            let sub_fields = sub.as_object().ok_or_else(|| {
                Error::MalformedDocument(format!(
                    "correlation sub-record is not an object: {type_name}"
                ))
            })?;
            let sub_type = sub_fields
                .get(keys::TYPE)
                .and_then(JsonValue::as_str)
                .ok_or_else(|| {
                    Error::MalformedDocument(format!(
                        "correlation sub-record without a type: {type_name}"
                    ))
                })?;
            objects.push(create_record(sub_type, sub_fields)?);
        }
    }
    Ok(RecordPayload::Correlation { objects })
}

fn create_workout(fields: &FieldMap, type_name: &str) -> Result<RecordPayload> {
    let mut events = Vec::new();
    if let Some(raw_events) = fields.get(keys::WORKOUT_EVENTS).and_then(JsonValue::as_array) {
        for raw in raw_events {
            let event = raw.as_object().ok_or_else(|| {
                Error::MalformedDocument("workout event is not an object".to_string())
            })?;
            events.push(WorkoutEvent {
                event_type: required_i64(event, keys::TYPE, type_name)?,
                date: required_date(event, keys::EVENT_START_DATE, type_name)?,
            });
        }
    }
    Ok(RecordPayload::Workout {
        activity_type: required_i64(fields, keys::WORKOUT_ACTIVITY_TYPE, type_name)?,
        duration: fields.get(keys::DURATION).and_then(JsonValue::as_f64),
        total_distance: fields.get(keys::TOTAL_DISTANCE).and_then(JsonValue::as_f64),
        total_energy_burned: fields
            .get(keys::TOTAL_ENERGY_BURNED)
            .and_then(JsonValue::as_f64),
        events,
    })
}

fn required_f64(fields: &FieldMap, key: &str, type_name: &str) -> Result<f64> {
    fields.get(key).and_then(JsonValue::as_f64).ok_or_else(|| {
        Error::MalformedDocument(format!("missing numeric field {key} on {type_name}"))
    })
}

fn required_i64(fields: &FieldMap, key: &str, type_name: &str) -> Result<i64> {
    fields.get(key).and_then(JsonValue::as_i64).ok_or_else(|| {
        Error::MalformedDocument(format!("missing integer field {key} on {type_name}"))
    })
}

fn required_date(fields: &FieldMap, key: &str, type_name: &str) -> Result<DateTime<Utc>> {
    let value = fields.get(key).ok_or_else(|| {
        Error::MalformedDocument(format!("missing date field {key} on {type_name}"))
    })?;
    date_from(value, key, type_name)
}

/// Dates arrive as integer millisecond epochs.
fn date_from(value: &JsonValue, key: &str, type_name: &str) -> Result<DateTime<Utc>> {
    let millis = value.as_i64().ok_or_else(|| {
        Error::MalformedDocument(format!("date field {key} on {type_name} is not a number"))
    })?;
    Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
        Error::MalformedDocument(format!("date field {key} on {type_name} is out of range"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, JsonValue)]) -> FieldMap {
        let mut map = FieldMap::new();
        for (k, v) in pairs {
            map.put(*k, v.clone());
        }
        map
    }

    #[test]
    fn test_creates_quantity_with_default_unit() {
        let map = fields(&[
            ("sdate", JsonValue::Number(1_700_000_000_000.0)),
            ("value", JsonValue::Number(11.0)),
        ]);
        let record = create_record("HKQuantityTypeIdentifierStepCount", &map).unwrap();
        assert_eq!(record.start_date, record.end_date);
        match record.payload {
            RecordPayload::Quantity { value, unit } => {
                assert_eq!(value, 11.0);
                assert_eq!(unit, "count");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_missing_end_date_defaults_to_start() {
        let map = fields(&[
            ("sdate", JsonValue::Number(1_700_000_000_000.0)),
            ("value", JsonValue::Number(1.0)),
        ]);
        let record = create_record("HKCategoryTypeIdentifierSleepAnalysis", &map).unwrap();
        assert_eq!(record.end_date.timestamp_millis(), 1_700_000_000_000);

        let map = fields(&[
            ("sdate", JsonValue::Number(1_700_000_000_000.0)),
            ("edate", JsonValue::Number(1_700_000_360_000.0)),
            ("value", JsonValue::Number(1.0)),
        ]);
        let record = create_record("HKCategoryTypeIdentifierSleepAnalysis", &map).unwrap();
        assert_eq!(record.end_date.timestamp_millis(), 1_700_000_360_000);
    }

    #[test]
    fn test_creates_correlation_with_sub_records() {
        let sub = fields(&[
            ("sdate", JsonValue::Number(1.0)),
            ("value", JsonValue::Number(120.0)),
            ("unit", JsonValue::String("mmHg".to_string())),
            (
                "type",
                JsonValue::String("HKQuantityTypeIdentifierBloodPressureSystolic".to_string()),
            ),
        ]);
        let map = fields(&[
            ("sdate", JsonValue::Number(1.0)),
            ("objects", JsonValue::Array(vec![JsonValue::Object(sub)])),
        ]);

        let record = create_record("HKCorrelationTypeIdentifierBloodPressure", &map).unwrap();
        match record.payload {
            RecordPayload::Correlation { objects } => {
                assert_eq!(objects.len(), 1);
                assert_eq!(
                    objects[0].type_name,
                    "HKQuantityTypeIdentifierBloodPressureSystolic"
                );
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_creates_workout_with_events() {
        let event = fields(&[
            ("type", JsonValue::Number(1.0)),
            ("sDate", JsonValue::Number(1_700_001_000_000.0)),
        ]);
        let map = fields(&[
            ("sdate", JsonValue::Number(1_700_000_000_000.0)),
            ("edate", JsonValue::Number(1_700_003_600_000.0)),
            ("workoutActivityType", JsonValue::Number(37.0)),
            ("duration", JsonValue::Number(3600.0)),
            (
                "workoutEvents",
                JsonValue::Array(vec![JsonValue::Object(event)]),
            ),
        ]);

        let record = create_record("HKWorkoutTypeIdentifier", &map).unwrap();
        match record.payload {
            RecordPayload::Workout {
                activity_type,
                duration,
                events,
                ..
            } => {
                assert_eq!(activity_type, 37);
                assert_eq!(duration, Some(3600.0));
                assert_eq!(events[0].date.timestamp_millis(), 1_700_001_000_000);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_is_malformed() {
        let map = fields(&[("sdate", JsonValue::Number(1.0))]);
        let err = create_record("NoSuchType", &map).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }

    #[test]
    fn test_missing_start_date_is_malformed() {
        let map = fields(&[("value", JsonValue::Number(1.0))]);
        let err = create_record("HKCategoryTypeIdentifierSleepAnalysis", &map).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }
}
