//! Manufacturer name normalization.
//!
//! Free-text makes are matched against a canonical list with a bounded
//! edit-distance ratio, so "toyata" becomes "Toyota" while genuinely
//! unknown makes pass through untouched. Runs at submission time:
//! consensus later votes over already-normalized values.

use serde::{Deserialize, Serialize};

pub const KNOWN_MAKES: &[&str] = &[
    "Toyota",
    "Honda",
    "Ford",
    "Chevrolet",
    "BMW",
    "Mercedes-Benz",
    "Mitsubishi",
    "Volkswagen",
    "Nissan",
    "Hyundai",
    "Kia",
    "Mazda",
    "Subaru",
    "Audi",
    "Tesla",
    "Land Rover",
    "Suzuki",
    "Peugeot",
    "Jaguar",
    "Aston Martin",
    "Fiat",
    "Leyland",
    "MAN",
    "Scania",
    "Lexus",
    "Infiniti",
    "Volvo",
];

/// Reject a candidate when more than a quarter of it would have to change.
const MAX_DISTANCE_RATIO: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakeMatch {
    pub value: String,
    pub corrected: bool,
    pub confidence: f64,
}

/// Map a free-text manufacturer string to its canonical form.
///
/// Levenshtein distance is computed case-insensitively against every
/// canonical name; the minimum-distance candidate is accepted when
/// `distance / candidate.len() <= 0.25`, with `confidence = 1 - ratio`.
/// Anything farther passes through unchanged with confidence 0.
pub fn normalize_make(input: &str) -> MakeMatch {
    let raw = input.trim();
    let lower = raw.to_lowercase();

    let mut best_match: Option<&str> = None;
    let mut best_distance = usize::MAX;

    for make in KNOWN_MAKES {
        let distance = strsim::levenshtein(&lower, &make.to_lowercase());
        if distance < best_distance {
            best_distance = distance;
            best_match = Some(make);
        }
    }

    if let Some(best) = best_match {
        let ratio = best_distance as f64 / best.len() as f64;
        if ratio <= MAX_DISTANCE_RATIO {
            return MakeMatch {
                value: best.to_string(),
                corrected: best != raw,
                confidence: 1.0 - ratio,
            };
        }
    }

    // Too far-fetched: let it through untouched
    MakeMatch {
        value: raw.to_string(),
        corrected: false,
        confidence: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrects_close_misspelling() {
        // "toyata" vs "Toyota": distance 1 over length 6 -> ratio 0.1667
        let result = normalize_make("toyata");
        assert_eq!(result.value, "Toyota");
        assert!(result.corrected);
        assert!((result.confidence - (1.0 - 1.0 / 6.0)).abs() < 1e-9);
    }

    #[test]
    fn exact_match_differs_only_in_case() {
        let result = normalize_make("toyota");
        assert_eq!(result.value, "Toyota");
        assert!(result.corrected);
        assert!((result.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn canonical_input_is_not_corrected() {
        let result = normalize_make("Toyota");
        assert_eq!(result.value, "Toyota");
        assert!(!result.corrected);
        assert!((result.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn gibberish_passes_through() {
        let result = normalize_make("Zzyzx");
        assert_eq!(result.value, "Zzyzx");
        assert!(!result.corrected);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn input_is_trimmed() {
        let result = normalize_make("  Honda  ");
        assert_eq!(result.value, "Honda");
        assert!(!result.corrected);
    }

    #[test]
    fn multi_word_makes_resolve() {
        let result = normalize_make("land rover");
        assert_eq!(result.value, "Land Rover");
        assert!(result.corrected);
    }
}
