use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use platewatch_core::models::{NewSubmission, Submission};
use platewatch_core::AppError;

/// Submission repository.
///
/// The `(plate, submitted_by_id)` unique key gives resubmission its
/// upsert semantics: a user's later claim about the same plate replaces
/// their earlier one entirely instead of adding a second vote.
#[derive(Clone)]
pub struct SubmissionRepository {
    pool: PgPool,
}

impl SubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert one user's claim about one plate. The make must already be
    /// normalized by the caller.
    #[tracing::instrument(skip(self, new), fields(db.table = "submissions", db.operation = "upsert", plate = %new.plate))]
    pub async fn upsert(&self, new: &NewSubmission, user_id: Uuid) -> Result<Submission, AppError> {
        let submission: Submission = sqlx::query_as::<Postgres, Submission>(
            r#"
            INSERT INTO submissions (
                id, plate, make, model, color, year, vehicle_type, for_sale,
                submitted_by_id, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, NOW(), NOW())
            ON CONFLICT (plate, submitted_by_id) DO UPDATE SET
                make = EXCLUDED.make,
                model = EXCLUDED.model,
                color = EXCLUDED.color,
                year = EXCLUDED.year,
                vehicle_type = EXCLUDED.vehicle_type,
                for_sale = EXCLUDED.for_sale,
                is_active = TRUE,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.plate)
        .bind(&new.make)
        .bind(&new.model)
        .bind(&new.color)
        .bind(new.year)
        .bind(new.vehicle_type)
        .bind(new.for_sale)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(submission_id = %submission.id, plate = %submission.plate, "Submission upserted");

        Ok(submission)
    }

    #[tracing::instrument(skip(self), fields(db.table = "submissions"))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Submission>, AppError> {
        let submission = sqlx::query_as::<Postgres, Submission>(
            "SELECT * FROM submissions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(submission)
    }

    /// Owner lookup for the ownership check; cheaper than fetching the row.
    pub async fn owner_id(&self, id: Uuid) -> Result<Option<Uuid>, AppError> {
        let owner: Option<Uuid> =
            sqlx::query_scalar("SELECT submitted_by_id FROM submissions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(owner)
    }

    /// All active submissions for one plate: the vote source for a
    /// consensus run.
    #[tracing::instrument(skip(self), fields(db.table = "submissions"))]
    pub async fn list_active_by_plate(&self, plate: &str) -> Result<Vec<Submission>, AppError> {
        let submissions = sqlx::query_as::<Postgres, Submission>(
            r#"
            SELECT * FROM submissions
            WHERE plate = $1 AND is_active = TRUE
            ORDER BY updated_at DESC
            "#,
        )
        .bind(plate)
        .fetch_all(&self.pool)
        .await?;

        Ok(submissions)
    }

    /// The full active working set, used by the periodic runner to
    /// enumerate plates worth revisiting.
    #[tracing::instrument(skip(self), fields(db.table = "submissions"))]
    pub async fn list_active(&self) -> Result<Vec<Submission>, AppError> {
        let submissions = sqlx::query_as::<Postgres, Submission>(
            "SELECT * FROM submissions WHERE is_active = TRUE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(submissions)
    }

    /// One user's submissions, newest first.
    #[tracing::instrument(skip(self), fields(db.table = "submissions"))]
    pub async fn list_by_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Submission>, AppError> {
        let submissions = sqlx::query_as::<Postgres, Submission>(
            r#"
            SELECT * FROM submissions
            WHERE submitted_by_id = $1
            ORDER BY updated_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(submissions)
    }

    /// Soft-delete: the submission stops counting toward consensus but the
    /// row survives for audit.
    #[tracing::instrument(skip(self), fields(db.table = "submissions", db.operation = "update"))]
    pub async fn deactivate(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE submissions SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
