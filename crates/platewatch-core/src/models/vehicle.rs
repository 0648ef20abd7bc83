use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::VehicleType;

/// Canonical public record for one plate: the materialized consensus.
///
/// Rows are owned and exclusively written by the materializer; no other
/// component mutates them. `is_active` gates public visibility and is
/// true iff `submission_count` reached the configured publication
/// threshold.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub plate: String,
    pub make: String,
    pub model: Option<String>,
    pub color: String,
    pub year: Option<i32>,
    pub vehicle_type: Option<VehicleType>,
    pub for_sale: Option<bool>,
    pub confidence: f64,
    pub submission_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The materializer's write payload: every field of the canonical record
/// that consensus decides. The upsert keyed by plate writes exactly this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub plate: String,
    pub make: String,
    pub model: Option<String>,
    pub color: String,
    pub year: Option<i32>,
    pub vehicle_type: Option<VehicleType>,
    pub for_sale: Option<bool>,
    pub confidence: f64,
    pub submission_count: i32,
    pub is_active: bool,
}

/// Stripped public view of a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub plate: String,
    pub make: String,
    pub model: Option<String>,
    pub color: String,
    pub year: Option<i32>,
    pub vehicle_type: Option<VehicleType>,
    pub for_sale: Option<bool>,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(v: Vehicle) -> Self {
        Self {
            id: v.id,
            plate: v.plate,
            make: v.make,
            model: v.model,
            color: v.color,
            year: v.year,
            vehicle_type: v.vehicle_type,
            for_sale: v.for_sale,
            confidence: v.confidence,
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}

/// Filtered lookup over the public vehicles table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VehicleQuery {
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub year: Option<i32>,
    pub vehicle_type: Option<VehicleType>,
    pub for_sale: Option<bool>,
    pub plate: Option<String>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_omits_gate_fields() {
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            plate: "ABC123".to_string(),
            make: "Toyota".to_string(),
            model: Some("Corolla".to_string()),
            color: "Red".to_string(),
            year: Some(2019),
            vehicle_type: Some(VehicleType::Sedan),
            for_sale: None,
            confidence: 0.87,
            submission_count: 3,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let resp = VehicleResponse::from(vehicle);
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("submission_count").is_none());
        assert!(json.get("is_active").is_none());
        assert_eq!(json["plate"], "ABC123");
    }
}
