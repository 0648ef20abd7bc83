//! Materializer: turns a consensus result into the canonical Vehicle row.
//!
//! The decision half ([`resolve_vehicle_record`]) is pure; the
//! [`Materializer`] wraps it with the plate-keyed upsert and cache
//! coherence. Vehicle rows are written here and nowhere else.

use platewatch_consensus::{compute_overall_confidence, ConsensusResult, FieldConsensus};
use platewatch_core::models::{Submission, VehicleRecord, VehicleResponse};
use platewatch_core::AppError;
use platewatch_db::VehicleRepository;
use platewatch_infra::{cache_keys, Cache};

/// TTL for the re-primed vehicle-by-plate cache entry.
const VEHICLE_CACHE_TTL_SECS: u64 = 600;

/// Consensus value if present, otherwise the most recent active
/// submission's value. Required fields (make, color) can never be null on
/// a published vehicle; failing to resolve one fails that plate's
/// materialization.
fn resolve_required<T, F>(
    value: Option<T>,
    submissions: &[Submission],
    extract: F,
    plate: &str,
    field: &'static str,
) -> Result<T, AppError>
where
    F: Fn(&Submission) -> Option<T>,
{
    if let Some(v) = value {
        return Ok(v);
    }

    let mut active: Vec<&Submission> = submissions.iter().filter(|s| s.is_active).collect();
    active.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    active
        .iter()
        .find_map(|s| extract(s))
        .ok_or(AppError::RequiredFieldUnresolvable {
            plate: plate.to_string(),
            field,
        })
}

/// Optional fields keep their consensus value only when its confidence
/// clears the floor; a low-confidence plurality is suppressed to null.
fn gate<T: Clone>(field: &FieldConsensus<T>, min_confidence: f64) -> Option<T> {
    if field.confidence >= min_confidence {
        field.value.clone()
    } else {
        None
    }
}

/// Decide every field of the canonical record for one plate.
///
/// Pure: same consensus + submissions in, same record out, so repeated
/// materialization of an unchanged submission set cannot drift.
pub fn resolve_vehicle_record(
    plate: &str,
    consensus: &ConsensusResult,
    submissions: &[Submission],
    min_field_confidence: f64,
    min_submissions_for_public: i32,
) -> Result<VehicleRecord, AppError> {
    let is_public = consensus.total_submissions >= min_submissions_for_public as usize;

    Ok(VehicleRecord {
        plate: plate.to_string(),
        make: resolve_required(
            consensus.fields.make.value.clone(),
            submissions,
            |s| Some(s.make.clone()),
            plate,
            "make",
        )?,
        model: gate(&consensus.fields.model, min_field_confidence),
        color: resolve_required(
            consensus.fields.color.value.clone(),
            submissions,
            |s| Some(s.color.clone()),
            plate,
            "color",
        )?,
        year: gate(&consensus.fields.year, min_field_confidence),
        vehicle_type: gate(&consensus.fields.vehicle_type, min_field_confidence),
        for_sale: gate(&consensus.fields.for_sale, min_field_confidence),
        confidence: compute_overall_confidence(&consensus.fields),
        submission_count: consensus.total_submissions as i32,
        is_active: is_public,
    })
}

#[derive(Clone)]
pub struct Materializer {
    vehicles: VehicleRepository,
    cache: Cache,
    min_submissions_for_public: i32,
    min_field_confidence: f64,
}

impl Materializer {
    pub fn new(
        vehicles: VehicleRepository,
        cache: Cache,
        min_submissions_for_public: i32,
        min_field_confidence: f64,
    ) -> Self {
        Self {
            vehicles,
            cache,
            min_submissions_for_public,
            min_field_confidence,
        }
    }

    /// Upsert the canonical vehicle for a plate and keep the cache
    /// coherent. No-op when the submission set is empty.
    #[tracing::instrument(skip(self, consensus, submissions), fields(plate = %plate))]
    pub async fn materialize(
        &self,
        plate: &str,
        consensus: &ConsensusResult,
        submissions: &[Submission],
    ) -> Result<(), AppError> {
        if submissions.is_empty() {
            return Ok(());
        }

        let record = resolve_vehicle_record(
            plate,
            consensus,
            submissions,
            self.min_field_confidence,
            self.min_submissions_for_public,
        )?;

        let vehicle = self.vehicles.upsert_by_plate(&record).await?;

        let key = cache_keys::vehicle_by_plate(plate);
        self.cache.delete(&key).await;
        self.cache
            .set(
                &key,
                &VehicleResponse::from(vehicle),
                VEHICLE_CACHE_TTL_SECS,
            )
            .await;

        tracing::info!(
            plate = %plate,
            submission_count = record.submission_count,
            confidence = record.confidence,
            is_active = record.is_active,
            "Vehicle materialized"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use platewatch_consensus::compute_consensus;
    use platewatch_core::models::VehicleType;
    use uuid::Uuid;

    const MIN_CONFIDENCE: f64 = 0.6;
    const MIN_PUBLIC: i32 = 2;

    fn submission(make: &str, color: &str) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            plate: "ABC123".to_string(),
            make: make.to_string(),
            model: None,
            color: color.to_string(),
            year: None,
            vehicle_type: None,
            for_sale: None,
            submitted_by_id: Uuid::new_v4(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn resolve(submissions: &[Submission]) -> VehicleRecord {
        let consensus = compute_consensus(submissions).unwrap();
        resolve_vehicle_record(
            &consensus.plate.clone(),
            &consensus,
            submissions,
            MIN_CONFIDENCE,
            MIN_PUBLIC,
        )
        .unwrap()
    }

    #[test]
    fn scenario_three_submissions() {
        let submissions = vec![
            submission("Toyota", "Red"),
            submission("Toyota", "Red"),
            submission("Toyota", "Blue"),
        ];
        let record = resolve(&submissions);

        assert_eq!(record.make, "Toyota");
        // Color is required: kept at 2/3 confidence regardless of the floor.
        assert_eq!(record.color, "Red");
        assert_eq!(record.submission_count, 3);
        assert!(record.is_active);
    }

    #[test]
    fn required_fields_are_never_null() {
        // A single submission gives make confidence 1.0, but even a
        // zero-consensus required field must fall back to the most recent
        // active submission instead of null.
        let mut older = submission("Honda", "Green");
        older.updated_at = Utc::now() - Duration::hours(2);
        let newer = submission("Toyota", "Silver");
        let submissions = vec![older, newer.clone()];

        let consensus = compute_consensus(&submissions).unwrap();
        // Force the resolver down the fallback path.
        let mut no_consensus = consensus.clone();
        no_consensus.fields.make = FieldConsensus::empty();
        no_consensus.fields.color = FieldConsensus::empty();

        let record = resolve_vehicle_record(
            "ABC123",
            &no_consensus,
            &submissions,
            MIN_CONFIDENCE,
            MIN_PUBLIC,
        )
        .unwrap();
        assert_eq!(record.make, newer.make);
        assert_eq!(record.color, newer.color);
    }

    #[test]
    fn fallback_ignores_inactive_submissions() {
        let mut inactive = submission("Honda", "Green");
        inactive.is_active = false;
        inactive.updated_at = Utc::now() + Duration::hours(1);
        let active = submission("Toyota", "Red");
        let submissions = vec![inactive, active.clone()];

        let consensus = compute_consensus(&submissions).unwrap();
        let mut no_consensus = consensus;
        no_consensus.fields.make = FieldConsensus::empty();

        let record = resolve_vehicle_record(
            "ABC123",
            &no_consensus,
            &submissions,
            MIN_CONFIDENCE,
            MIN_PUBLIC,
        )
        .unwrap();
        assert_eq!(record.make, active.make);
    }

    #[test]
    fn unresolvable_required_field_errors() {
        let consensus = compute_consensus(&[submission("Toyota", "Red")]).unwrap();
        let mut no_consensus = consensus;
        no_consensus.fields.make = FieldConsensus::empty();

        // No submissions to fall back to.
        let result =
            resolve_vehicle_record("ABC123", &no_consensus, &[], MIN_CONFIDENCE, MIN_PUBLIC);
        assert!(matches!(
            result,
            Err(AppError::RequiredFieldUnresolvable { field: "make", .. })
        ));
    }

    #[test]
    fn low_confidence_optional_fields_are_nulled() {
        // 2 of 4 submissions say Corolla: a plurality at 0.5 confidence,
        // below the 0.6 floor, so the materialized model must be null.
        let mut a = submission("Toyota", "Red");
        a.model = Some("Corolla".to_string());
        let mut b = submission("Toyota", "Red");
        b.model = Some("Corolla".to_string());
        let mut c = submission("Toyota", "Red");
        c.model = Some("Camry".to_string());
        let mut d = submission("Toyota", "Red");
        d.model = Some("Yaris".to_string());
        let submissions = vec![a, b, c, d];

        let record = resolve(&submissions);
        assert_eq!(record.model, None);
    }

    #[test]
    fn confident_optional_fields_are_kept() {
        let mut a = submission("Toyota", "Red");
        a.year = Some(2019);
        a.vehicle_type = Some(VehicleType::Sedan);
        let mut b = submission("Toyota", "Red");
        b.year = Some(2019);
        b.vehicle_type = Some(VehicleType::Sedan);
        let mut c = submission("Toyota", "Red");
        c.year = Some(2020);
        let submissions = vec![a, b, c];

        let record = resolve(&submissions);
        // year: 2/3 = 0.667 >= 0.6 -> kept
        assert_eq!(record.year, Some(2019));
        // vehicle_type: 2/2 non-null votes agree -> confidence 1.0 -> kept
        assert_eq!(record.vehicle_type, Some(VehicleType::Sedan));
    }

    #[test]
    fn publication_gate() {
        let one = vec![submission("Toyota", "Red")];
        let record = resolve(&one);
        assert_eq!(record.submission_count, 1);
        assert!(!record.is_active);

        let two = vec![submission("Toyota", "Red"), submission("Toyota", "Red")];
        let record = resolve(&two);
        assert_eq!(record.submission_count, 2);
        assert!(record.is_active);
    }

    #[test]
    fn materialization_is_idempotent() {
        let submissions = vec![
            submission("Toyota", "Red"),
            submission("Honda", "Red"),
            submission("Toyota", "Blue"),
        ];
        let first = resolve(&submissions);
        let second = resolve(&submissions);
        assert_eq!(first, second);
    }

    #[test]
    fn overall_confidence_is_field_mean() {
        let submissions = vec![submission("Toyota", "Red"), submission("Toyota", "Red")];
        let record = resolve(&submissions);
        // make 1.0 + color 1.0, four voteless fields at 0.
        assert!((record.confidence - 2.0 / 6.0).abs() < f64::EPSILON);
    }
}
