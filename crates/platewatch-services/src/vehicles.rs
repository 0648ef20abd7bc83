//! Read side of the canonical vehicle table.
//!
//! Lookups go through the cache with the durable store as fallback; a
//! cache miss or failure only costs latency.

use platewatch_core::models::{VehicleQuery, VehicleResponse};
use platewatch_core::AppError;
use platewatch_db::VehicleRepository;
use platewatch_infra::{cache_keys, Cache};

const VEHICLE_CACHE_TTL_SECS: u64 = 600;

#[derive(Clone)]
pub struct VehicleReadService {
    vehicles: VehicleRepository,
    cache: Cache,
    min_submissions_for_public: i32,
}

impl VehicleReadService {
    pub fn new(
        vehicles: VehicleRepository,
        cache: Cache,
        min_submissions_for_public: i32,
    ) -> Self {
        Self {
            vehicles,
            cache,
            min_submissions_for_public,
        }
    }

    /// Published vehicle for one plate, read-through cached.
    #[tracing::instrument(skip(self), fields(plate = %plate))]
    pub async fn get_by_plate(&self, plate: &str) -> Result<Option<VehicleResponse>, AppError> {
        let key = cache_keys::vehicle_by_plate(plate);

        if let Some(cached) = self.cache.get::<VehicleResponse>(&key).await {
            return Ok(Some(cached));
        }

        let Some(vehicle) = self.vehicles.get_by_plate(plate).await? else {
            return Ok(None);
        };

        if !vehicle.is_active {
            return Ok(None);
        }

        let response = VehicleResponse::from(vehicle);
        self.cache.set(&key, &response, VEHICLE_CACHE_TTL_SECS).await;

        Ok(Some(response))
    }

    /// Filtered search over published vehicles. Admin callers see rows
    /// still below the publication gate.
    #[tracing::instrument(skip(self, query))]
    pub async fn search(
        &self,
        query: &VehicleQuery,
        is_admin: bool,
    ) -> Result<Vec<VehicleResponse>, AppError> {
        let vehicles = self
            .vehicles
            .search(query, self.min_submissions_for_public, is_admin)
            .await?;

        Ok(vehicles.into_iter().map(VehicleResponse::from).collect())
    }
}
