use sqlx::{PgPool, Postgres};

use platewatch_core::models::{Vehicle, VehicleQuery, VehicleRecord};
use platewatch_core::AppError;

/// Canonical vehicle repository.
///
/// The plate-keyed upsert is a single conditional write, which is all the
/// atomicity the materializer needs: concurrent runs for the same plate
/// last-write-win at the row level.
#[derive(Clone)]
pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Write the materialized consensus for a plate, creating the row on
    /// first publication.
    #[tracing::instrument(skip(self, record), fields(db.table = "vehicles", db.operation = "upsert", plate = %record.plate))]
    pub async fn upsert_by_plate(&self, record: &VehicleRecord) -> Result<Vehicle, AppError> {
        let vehicle = sqlx::query_as::<Postgres, Vehicle>(
            r#"
            INSERT INTO vehicles (
                id, plate, make, model, color, year, vehicle_type, for_sale,
                confidence, submission_count, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW())
            ON CONFLICT (plate) DO UPDATE SET
                make = EXCLUDED.make,
                model = EXCLUDED.model,
                color = EXCLUDED.color,
                year = EXCLUDED.year,
                vehicle_type = EXCLUDED.vehicle_type,
                for_sale = EXCLUDED.for_sale,
                confidence = EXCLUDED.confidence,
                submission_count = EXCLUDED.submission_count,
                is_active = EXCLUDED.is_active,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(uuid::Uuid::new_v4())
        .bind(&record.plate)
        .bind(&record.make)
        .bind(&record.model)
        .bind(&record.color)
        .bind(record.year)
        .bind(record.vehicle_type)
        .bind(record.for_sale)
        .bind(record.confidence)
        .bind(record.submission_count)
        .bind(record.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    #[tracing::instrument(skip(self), fields(db.table = "vehicles"))]
    pub async fn get_by_plate(&self, plate: &str) -> Result<Option<Vehicle>, AppError> {
        let vehicle =
            sqlx::query_as::<Postgres, Vehicle>("SELECT * FROM vehicles WHERE plate = $1")
                .bind(plate)
                .fetch_optional(&self.pool)
                .await?;

        Ok(vehicle)
    }

    /// Filtered lookup over published vehicles. Admin callers may include
    /// unpublished rows; everyone else only sees records past the
    /// publication gate.
    #[tracing::instrument(skip(self, query), fields(db.table = "vehicles"))]
    pub async fn search(
        &self,
        query: &VehicleQuery,
        min_submissions: i32,
        include_inactive: bool,
    ) -> Result<Vec<Vehicle>, AppError> {
        let limit = query.limit.unwrap_or(50).min(200);

        let mut sql = String::from(
            "SELECT * FROM vehicles WHERE submission_count >= $1",
        );
        let mut bind_count = 2;

        if !include_inactive {
            sql.push_str(" AND is_active = TRUE");
        }
        if query.make.is_some() {
            sql.push_str(&format!(" AND make = ${}", bind_count));
            bind_count += 1;
        }
        if query.model.is_some() {
            sql.push_str(&format!(" AND model ILIKE ${}", bind_count));
            bind_count += 1;
        }
        if query.color.is_some() {
            sql.push_str(&format!(" AND color ILIKE ${}", bind_count));
            bind_count += 1;
        }
        if query.year.is_some() {
            sql.push_str(&format!(" AND year = ${}", bind_count));
            bind_count += 1;
        }
        if query.vehicle_type.is_some() {
            sql.push_str(&format!(" AND vehicle_type = ${}", bind_count));
            bind_count += 1;
        }
        if query.for_sale.is_some() {
            sql.push_str(&format!(" AND for_sale = ${}", bind_count));
            bind_count += 1;
        }
        if query.plate.is_some() {
            sql.push_str(&format!(" AND plate ILIKE ${}", bind_count));
            bind_count += 1;
        }
        sql.push_str(&format!(" ORDER BY updated_at DESC LIMIT ${}", bind_count));

        let mut q = sqlx::query_as::<Postgres, Vehicle>(&sql).bind(min_submissions);
        if let Some(ref make) = query.make {
            q = q.bind(make);
        }
        if let Some(ref model) = query.model {
            q = q.bind(format!("%{}%", model.trim()));
        }
        if let Some(ref color) = query.color {
            q = q.bind(format!("%{}%", color.trim()));
        }
        if let Some(year) = query.year {
            q = q.bind(year);
        }
        if let Some(vehicle_type) = query.vehicle_type {
            q = q.bind(vehicle_type);
        }
        if let Some(for_sale) = query.for_sale {
            q = q.bind(for_sale);
        }
        if let Some(ref plate) = query.plate {
            q = q.bind(format!("%{}%", plate.trim()));
        }

        let vehicles = q.bind(limit).fetch_all(&self.pool).await?;

        Ok(vehicles)
    }
}
