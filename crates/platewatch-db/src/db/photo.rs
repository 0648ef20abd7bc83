use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use platewatch_core::models::{Photo, PhotoStatus};
use platewatch_core::AppError;

/// Photo repository.
///
/// Rows are created synchronously with the submission and updated by the
/// async transcode worker; the daily sweep deletes abandoned rows.
#[derive(Clone)]
pub struct PhotoRepository {
    pool: PgPool,
}

impl PhotoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a photo row in `processing` with no url yet. The first image
    /// of a batch is flagged primary by the caller.
    #[tracing::instrument(skip(self), fields(db.table = "photos", db.operation = "insert"))]
    pub async fn create(
        &self,
        submission_id: Uuid,
        is_primary: bool,
        upload_size_kb: i32,
    ) -> Result<Photo, AppError> {
        let photo = sqlx::query_as::<Postgres, Photo>(
            r#"
            INSERT INTO photos (
                id, submission_id, url, is_primary, upload_size_kb, status,
                created_at, updated_at
            )
            VALUES ($1, $2, NULL, $3, $4, 'processing', NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(submission_id)
        .bind(is_primary)
        .bind(upload_size_kb)
        .fetch_one(&self.pool)
        .await?;

        Ok(photo)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Photo>, AppError> {
        let photo = sqlx::query_as::<Postgres, Photo>("SELECT * FROM photos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(photo)
    }

    pub async fn list_by_submission(&self, submission_id: Uuid) -> Result<Vec<Photo>, AppError> {
        let photos = sqlx::query_as::<Postgres, Photo>(
            r#"
            SELECT * FROM photos
            WHERE submission_id = $1
            ORDER BY is_primary DESC, created_at ASC
            "#,
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(photos)
    }

    /// Reset a photo to `processing` at the start of a transcode attempt.
    /// Keeps the row truthful under at-least-once task delivery.
    pub async fn mark_processing(&self, id: Uuid) -> Result<(), AppError> {
        self.set_status(id, PhotoStatus::Processing).await
    }

    /// Record a completed transcode: populated url, final size, `done`.
    #[tracing::instrument(skip(self), fields(db.table = "photos", db.operation = "update"))]
    pub async fn mark_done(
        &self,
        id: Uuid,
        url: &str,
        upload_size_kb: i32,
    ) -> Result<Photo, AppError> {
        let photo = sqlx::query_as::<Postgres, Photo>(
            r#"
            UPDATE photos
            SET status = 'done',
                url = $2,
                upload_size_kb = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(url)
        .bind(upload_size_kb)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(photo_id = %id, url = %url, "Photo transcode recorded");

        Ok(photo)
    }

    pub async fn mark_failed(&self, id: Uuid) -> Result<(), AppError> {
        self.set_status(id, PhotoStatus::Failed).await
    }

    async fn set_status(&self, id: Uuid, status: PhotoStatus) -> Result<(), AppError> {
        sqlx::query("UPDATE photos SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Batched delete of abandoned uploads: no url, never finished, older
    /// than the retention cutoff. Returns the number of rows removed.
    #[tracing::instrument(skip(self), fields(db.table = "photos", db.operation = "delete"))]
    pub async fn delete_abandoned(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM photos
            WHERE url IS NULL
                AND status IN ('pending', 'failed')
                AND created_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
