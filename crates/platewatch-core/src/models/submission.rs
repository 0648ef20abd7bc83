use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Body style reported by submitters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "vehicle_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Sedan,
    Hatchback,
    Suv,
    Coupe,
    Convertible,
    Wagon,
    Pickup,
    Van,
    Motorcycle,
    Other,
}

impl Display for VehicleType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            VehicleType::Sedan => "sedan",
            VehicleType::Hatchback => "hatchback",
            VehicleType::Suv => "suv",
            VehicleType::Coupe => "coupe",
            VehicleType::Convertible => "convertible",
            VehicleType::Wagon => "wagon",
            VehicleType::Pickup => "pickup",
            VehicleType::Van => "van",
            VehicleType::Motorcycle => "motorcycle",
            VehicleType::Other => "other",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for VehicleType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sedan" => Ok(VehicleType::Sedan),
            "hatchback" => Ok(VehicleType::Hatchback),
            "suv" => Ok(VehicleType::Suv),
            "coupe" => Ok(VehicleType::Coupe),
            "convertible" => Ok(VehicleType::Convertible),
            "wagon" => Ok(VehicleType::Wagon),
            "pickup" => Ok(VehicleType::Pickup),
            "van" => Ok(VehicleType::Van),
            "motorcycle" => Ok(VehicleType::Motorcycle),
            "other" => Ok(VehicleType::Other),
            _ => Err(anyhow::anyhow!("Invalid vehicle type: {}", s)),
        }
    }
}

/// One user's claim about one plate at one point in time.
///
/// At most one row exists per `(plate, submitted_by_id)`; a later
/// submission from the same user overwrites the earlier one rather than
/// adding a second vote.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Submission {
    pub id: Uuid,
    pub plate: String,
    pub make: String,
    pub model: Option<String>,
    pub color: String,
    pub year: Option<i32>,
    pub vehicle_type: Option<VehicleType>,
    pub for_sale: Option<bool>,
    pub submitted_by_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inbound submission payload, validated before it touches the store.
/// The plate arrives already upper-cased and trimmed at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewSubmission {
    #[validate(length(min = 2, max = 16))]
    pub plate: String,
    #[validate(length(min = 1, max = 64))]
    pub make: String,
    #[validate(length(max = 64))]
    pub model: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub color: String,
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
    pub vehicle_type: Option<VehicleType>,
    pub for_sale: Option<bool>,
}

/// Stripped view of a submission returned to the caller. Omits the
/// submitter id and the soft-delete flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub plate: String,
    pub make: String,
    pub model: Option<String>,
    pub color: String,
    pub year: Option<i32>,
    pub vehicle_type: Option<VehicleType>,
    pub for_sale: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Submission> for SubmissionResponse {
    fn from(s: Submission) -> Self {
        Self {
            id: s.id,
            plate: s.plate,
            make: s.make,
            model: s.model,
            color: s.color,
            year: s.year,
            vehicle_type: s.vehicle_type,
            for_sale: s.for_sale,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}
