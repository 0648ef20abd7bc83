//! Cache key namespace.
//!
//! All keys live here so invalidation patterns and lookups cannot drift
//! apart.

use uuid::Uuid;

pub fn vehicle_by_plate(plate: &str) -> String {
    format!("vehicle:plate:{}", plate)
}

pub fn submission_by_id(id: Uuid) -> String {
    format!("submission:{}", id)
}

pub fn submissions_by_plate(plate: &str) -> String {
    format!("submissions:plate:{}", plate)
}

/// The periodic runner's working set of active submissions.
pub const ACTIVE_SUBMISSIONS: &str = "submissions:active";

pub const ALL_VEHICLES_PATTERN: &str = "vehicle:plate:*";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        let id = Uuid::new_v4();
        assert_eq!(vehicle_by_plate("ABC123"), "vehicle:plate:ABC123");
        assert_eq!(submission_by_id(id), format!("submission:{}", id));
        assert_eq!(submissions_by_plate("ABC123"), "submissions:plate:ABC123");
    }
}
