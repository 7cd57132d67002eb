//! Synthetic sample-data generator.
//!
//! Seeds a store with plausible records across every catalog type so a
//! demo export produces a document worth looking at. Generated records
//! carry the generator marker, which is what the
//! `GeneratedByThisApp` export type filters on.

use crate::models::{Record, RecordPayload, UserCharacteristics, WorkoutEvent};
use crate::store::InMemoryHealthStore;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use uuid::Uuid;

/// Generates deterministic synthetic health records.
#[derive(Debug)]
pub struct DataGenerator {
    rng: StdRng,
    days: i64,
}

impl DataGenerator {
    /// Creates a generator covering the given number of days back from
    /// now. The seed makes runs reproducible.
    #[must_use]
    pub fn new(days: u32, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            days: i64::from(days),
        }
    }

    /// Fills the store with records and sets the owner characteristics.
    /// Returns the number of records generated.
    pub fn populate(&mut self, store: &mut InMemoryHealthStore) -> usize {
        store.set_characteristics(UserCharacteristics {
            date_of_birth: Some(Utc::now() - Duration::days(365 * 30)),
            biological_sex: Some(2),
            blood_type: Some(3),
            fitzpatrick_skin_type: Some(2),
        });

        let mut generated = 0_usize;
        let now = Utc::now();
        for day in 0..self.days {
            let midnight = now - Duration::days(day);

            generated += self.daily_quantities(store, midnight);
            generated += self.nightly_sleep(store, midnight);
            generated += self.blood_pressure(store, midnight);
            if day % 3 == 0 {
                generated += self.workout(store, midnight);
            }
        }

        info!(days = self.days, records = generated, "generated sample data");
        generated
    }

    fn daily_quantities(
        &mut self,
        store: &mut InMemoryHealthStore,
        day: DateTime<Utc>,
    ) -> usize {
        let mut count = 0;
        // Hourly step buckets during waking hours.
        for hour in 8..22 {
            let date = day - Duration::hours(hour);
            let steps = f64::from(self.rng.gen_range(0..1500_u32));
            store.insert_own(
                Record::quantity("HKQuantityTypeIdentifierStepCount", date, steps, "count"),
                true,
            );
            let pulse = f64::from(self.rng.gen_range(55..95_u32));
            store.insert_own(
                Record::quantity(
                    "HKQuantityTypeIdentifierHeartRate",
                    date,
                    pulse,
                    "count/min",
                ),
                true,
            );
            count += 2;
        }
        let mass = 62.0 + f64::from(self.rng.gen_range(-15..15_i32)) / 10.0;
        store.insert_own(
            Record::quantity("HKQuantityTypeIdentifierBodyMass", day, mass, "kg"),
            true,
        );
        let energy = f64::from(self.rng.gen_range(1500..2600_u32));
        store.insert_own(
            Record::quantity(
                "HKQuantityTypeIdentifierActiveEnergyBurned",
                day,
                energy,
                "kcal",
            ),
            true,
        );
        count + 2
    }

    fn nightly_sleep(&mut self, store: &mut InMemoryHealthStore, day: DateTime<Utc>) -> usize {
        let start = day - Duration::hours(23);
        let hours = i64::from(self.rng.gen_range(6..9_u32));
        store.insert_own(
            Record::category(
                "HKCategoryTypeIdentifierSleepAnalysis",
                start,
                start + Duration::hours(hours),
                1,
            ),
            true,
        );
        1
    }

    fn blood_pressure(&mut self, store: &mut InMemoryHealthStore, day: DateTime<Utc>) -> usize {
        let date = day - Duration::hours(9);
        let systolic = f64::from(self.rng.gen_range(105..135_u32));
        let diastolic = f64::from(self.rng.gen_range(65..90_u32));
        let record = Record {
            type_name: "HKCorrelationTypeIdentifierBloodPressure".to_string(),
            uuid: Some(Uuid::new_v4()),
            start_date: date,
            end_date: date,
            payload: RecordPayload::Correlation {
                objects: vec![
                    Record::quantity(
                        "HKQuantityTypeIdentifierBloodPressureSystolic",
                        date,
                        systolic,
                        "mmHg",
                    ),
                    Record::quantity(
                        "HKQuantityTypeIdentifierBloodPressureDiastolic",
                        date,
                        diastolic,
                        "mmHg",
                    ),
                ],
            },
        };
        store.insert_own(record, true);
        1
    }

    fn workout(&mut self, store: &mut InMemoryHealthStore, day: DateTime<Utc>) -> usize {
        let start = day - Duration::hours(18);
        let raw_minutes = self.rng.gen_range(25..70_u32);
        let minutes = i64::from(raw_minutes);
        let end = start + Duration::minutes(minutes);
        let pause = start + Duration::minutes(minutes / 2);
        let record = Record {
            type_name: "HKWorkoutTypeIdentifier".to_string(),
            uuid: Some(Uuid::new_v4()),
            start_date: start,
            end_date: end,
            payload: RecordPayload::Workout {
                // 37 is the running activity code.
                activity_type: 37,
                duration: Some(f64::from(raw_minutes * 60)),
                total_distance: Some(f64::from(self.rng.gen_range(3000..12_000_u32))),
                total_energy_burned: Some(f64::from(self.rng.gen_range(180..700_u32))),
                events: vec![
                    WorkoutEvent {
                        event_type: 1,
                        date: pause,
                    },
                    WorkoutEvent {
                        event_type: 2,
                        date: pause + Duration::minutes(2),
                    },
                ],
            },
        };
        store.insert_own(record, true);
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::HealthStore;

    #[test]
    fn test_generator_is_deterministic() {
        let mut a = InMemoryHealthStore::new();
        let mut b = InMemoryHealthStore::new();
        let count_a = DataGenerator::new(3, 42).populate(&mut a);
        let count_b = DataGenerator::new(3, 42).populate(&mut b);

        assert_eq!(count_a, count_b);
        assert_eq!(a.len(), b.len());
        assert!(count_a > 0);
    }

    #[test]
    fn test_generated_records_carry_the_marker() {
        let mut store = InMemoryHealthStore::new();
        DataGenerator::new(2, 7).populate(&mut store);

        let page = store
            .fetch_page(
                "HKQuantityTypeIdentifierStepCount",
                crate::store::RecordFilter::WithGeneratorMarker,
                None,
                10_000,
            )
            .unwrap();
        assert_eq!(page.records.len(), store.count_of_type("HKQuantityTypeIdentifierStepCount"));
    }
}
