//! Consensus calculator: per-field majority votes combined into one
//! result for a plate.

use serde::{Deserialize, Serialize};

use platewatch_core::models::{Submission, VehicleType};

use crate::resolver::{majority_vote, FieldConsensus};

/// Per-field resolutions for one plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusFields {
    pub make: FieldConsensus<String>,
    pub model: FieldConsensus<String>,
    pub year: FieldConsensus<i32>,
    pub color: FieldConsensus<String>,
    pub vehicle_type: FieldConsensus<VehicleType>,
    pub for_sale: FieldConsensus<bool>,
}

/// Ephemeral aggregate for one plate. `total_submissions` is the active
/// submission count; each field's confidence denominator is that field's
/// own non-null vote count, which may legitimately be smaller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub plate: String,
    pub total_submissions: usize,
    pub fields: ConsensusFields,
}

/// Resolve every field independently over the active submissions.
///
/// Returns `None` when no active submission remains after filtering;
/// callers skip such plates rather than materializing anything.
pub fn compute_consensus(submissions: &[Submission]) -> Option<ConsensusResult> {
    let active: Vec<&Submission> = submissions.iter().filter(|s| s.is_active).collect();
    let first = active.first()?;

    Some(ConsensusResult {
        plate: first.plate.clone(),
        total_submissions: active.len(),
        fields: ConsensusFields {
            make: majority_vote(
                &active
                    .iter()
                    .map(|s| Some(s.make.clone()))
                    .collect::<Vec<_>>(),
            ),
            model: majority_vote(&active.iter().map(|s| s.model.clone()).collect::<Vec<_>>()),
            year: majority_vote(&active.iter().map(|s| s.year).collect::<Vec<_>>()),
            color: majority_vote(
                &active
                    .iter()
                    .map(|s| Some(s.color.clone()))
                    .collect::<Vec<_>>(),
            ),
            vehicle_type: majority_vote(
                &active.iter().map(|s| s.vehicle_type).collect::<Vec<_>>(),
            ),
            for_sale: majority_vote(&active.iter().map(|s| s.for_sale).collect::<Vec<_>>()),
        },
    })
}

/// Overall confidence: unweighted arithmetic mean of the six per-field
/// confidences.
pub fn compute_overall_confidence(fields: &ConsensusFields) -> f64 {
    let sum = fields.make.confidence
        + fields.model.confidence
        + fields.year.confidence
        + fields.color.confidence
        + fields.vehicle_type.confidence
        + fields.for_sale.confidence;
    sum / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn submission(plate: &str, make: &str, color: &str) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            plate: plate.to_string(),
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

    #[test]
    fn three_submission_scenario() {
        // {Toyota,Red} {Toyota,Red} {Toyota,Blue}
        let submissions = vec![
            submission("ABC123", "Toyota", "Red"),
            submission("ABC123", "Toyota", "Red"),
            submission("ABC123", "Toyota", "Blue"),
        ];
        let consensus = compute_consensus(&submissions).unwrap();

        assert_eq!(consensus.plate, "ABC123");
        assert_eq!(consensus.total_submissions, 3);
        assert_eq!(consensus.fields.make.value.as_deref(), Some("Toyota"));
        assert!((consensus.fields.make.confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(consensus.fields.color.value.as_deref(), Some("Red"));
        assert!((consensus.fields.color.confidence - 2.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(consensus.fields.color.votes, 2);
    }

    #[test]
    fn inactive_submissions_are_ignored() {
        let mut soft_deleted = submission("ABC123", "Honda", "Green");
        soft_deleted.is_active = false;
        let submissions = vec![
            submission("ABC123", "Toyota", "Red"),
            soft_deleted,
        ];
        let consensus = compute_consensus(&submissions).unwrap();
        assert_eq!(consensus.total_submissions, 1);
        assert_eq!(consensus.fields.make.value.as_deref(), Some("Toyota"));
    }

    #[test]
    fn no_active_submissions_yields_none() {
        let mut inactive = submission("ABC123", "Toyota", "Red");
        inactive.is_active = false;
        assert!(compute_consensus(&[inactive]).is_none());
        assert!(compute_consensus(&[]).is_none());
    }

    #[test]
    fn field_denominators_are_independent_of_total() {
        // Two active submissions, but only one carries a year: that field's
        // confidence denominator is 1, not 2.
        let mut with_year = submission("XYZ789", "Toyota", "Red");
        with_year.year = Some(2018);
        let submissions = vec![with_year, submission("XYZ789", "Toyota", "Blue")];

        let consensus = compute_consensus(&submissions).unwrap();
        assert_eq!(consensus.total_submissions, 2);
        assert_eq!(consensus.fields.year.value, Some(2018));
        assert_eq!(consensus.fields.year.votes, 1);
        assert!((consensus.fields.year.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn overall_confidence_is_mean_of_six() {
        let submissions = vec![
            submission("ABC123", "Toyota", "Red"),
            submission("ABC123", "Toyota", "Red"),
        ];
        let consensus = compute_consensus(&submissions).unwrap();
        // make and color fully agree; model/year/type/for_sale have no votes.
        let overall = compute_overall_confidence(&consensus.fields);
        assert!((overall - 2.0 / 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn recompute_is_stable() {
        let submissions = vec![
            submission("ABC123", "Toyota", "Red"),
            submission("ABC123", "Honda", "Red"),
            submission("ABC123", "Toyota", "Blue"),
        ];
        let first = compute_consensus(&submissions).unwrap();
        let second = compute_consensus(&submissions).unwrap();
        assert_eq!(first, second);
    }
}
