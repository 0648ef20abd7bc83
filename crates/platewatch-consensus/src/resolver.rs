//! Field resolver: majority vote over one field across submissions.

use serde::{Deserialize, Serialize};

/// Result of resolving one field. `votes` counts the winning value's
/// occurrences; `confidence` is winning votes over non-null votes.
/// Never persisted, recomputed on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConsensus<T> {
    pub value: Option<T>,
    pub confidence: f64,
    pub votes: usize,
}

impl<T> FieldConsensus<T> {
    pub fn empty() -> Self {
        Self {
            value: None,
            confidence: 0.0,
            votes: 0,
        }
    }
}

/// Pick the most frequent non-null value.
///
/// Nulls are excluded from both the candidate set and the confidence
/// denominator. Ties on the maximum count are broken deterministically:
/// the smallest candidate by `Ord` wins, regardless of input order.
pub fn majority_vote<T: Clone + Eq + Ord>(values: &[Option<T>]) -> FieldConsensus<T> {
    let mut counts: Vec<(&T, usize)> = Vec::new();
    let mut total = 0usize;

    for v in values.iter().flatten() {
        total += 1;
        match counts.iter_mut().find(|(candidate, _)| *candidate == v) {
            Some((_, count)) => *count += 1,
            None => counts.push((v, 1)),
        }
    }

    let mut winner: Option<(&T, usize)> = None;
    for (value, count) in counts {
        winner = match winner {
            None => Some((value, count)),
            Some((best, best_count)) => {
                if count > best_count || (count == best_count && value < best) {
                    Some((value, count))
                } else {
                    Some((best, best_count))
                }
            }
        };
    }

    match winner {
        Some((value, count)) => FieldConsensus {
            value: Some(value.clone()),
            confidence: count as f64 / total as f64,
            votes: count,
        },
        None => FieldConsensus::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn plurality_winner_with_exact_confidence() {
        let votes = strings(&[Some("red"), Some("red"), Some("blue")]);
        let result = majority_vote(&votes);
        assert_eq!(result.value.as_deref(), Some("red"));
        assert_eq!(result.votes, 2);
        assert!((result.confidence - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn all_null_yields_empty_consensus() {
        let votes: Vec<Option<String>> = vec![None, None, None];
        let result = majority_vote(&votes);
        assert_eq!(result.value, None);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.votes, 0);
    }

    #[test]
    fn empty_input_yields_empty_consensus() {
        let result = majority_vote::<String>(&[]);
        assert_eq!(result.value, None);
        assert_eq!(result.votes, 0);
    }

    #[test]
    fn nulls_excluded_from_denominator() {
        let votes = strings(&[Some("red"), None, Some("red"), None]);
        let result = majority_vote(&votes);
        assert_eq!(result.value.as_deref(), Some("red"));
        assert_eq!(result.votes, 2);
        assert!((result.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tie_breaks_to_smallest_value() {
        // Order-independent: whichever way the tie arrives, the Ord-smallest wins.
        let forward = majority_vote(&strings(&[Some("red"), Some("blue")]));
        let reverse = majority_vote(&strings(&[Some("blue"), Some("red")]));
        assert_eq!(forward.value.as_deref(), Some("blue"));
        assert_eq!(forward, reverse);
        assert!((forward.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn works_over_integers_and_booleans() {
        let years = majority_vote(&[Some(2019), Some(2019), Some(2020), None]);
        assert_eq!(years.value, Some(2019));
        assert_eq!(years.votes, 2);
        assert!((years.confidence - 2.0 / 3.0).abs() < f64::EPSILON);

        let for_sale = majority_vote(&[Some(true), Some(false), Some(true)]);
        assert_eq!(for_sale.value, Some(true));
        assert!((for_sale.confidence - 2.0 / 3.0).abs() < f64::EPSILON);
    }
}
