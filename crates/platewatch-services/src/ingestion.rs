//! Submission ingestion and photo job coordination.
//!
//! The synchronous half of the pipeline: validate, normalize, upsert the
//! submission, stage uploaded images, create photo rows, and enqueue the
//! async work. The caller gets its response without waiting for any
//! transcoding or consensus recompute.

use std::path::PathBuf;

use uuid::Uuid;
use validator::Validate;

use platewatch_consensus::normalize_make;
use platewatch_core::models::{
    ConsensusRefreshPayload, NewSubmission, PhotoTranscodePayload, Priority, Submission,
    SubmissionResponse, Task, TaskType,
};
use platewatch_core::{AppConfig, AppError};
use platewatch_db::{PhotoRepository, SubmissionRepository};
use platewatch_infra::{cache_keys, Cache};
use platewatch_worker::TaskQueue;

/// TTL for the cached submission row.
const SUBMISSION_CACHE_TTL_SECS: u64 = 600;

/// One uploaded image, already read out of the multipart body by the
/// serving layer.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Deterministic destination for a photo's transcoded derivative.
/// Retries of the same job overwrite the same object.
pub fn photo_storage_key(plate: &str, photo_id: Uuid) -> String {
    format!("vehicles/{}/image-{}.jpg", plate, photo_id)
}

pub fn upload_size_kb(byte_len: usize) -> i32 {
    byte_len.div_ceil(1024) as i32
}

fn image_extension(filename: &str) -> Option<String> {
    let ext = filename.rsplit('.').next()?;
    if ext.is_empty() || ext == filename {
        return None;
    }
    Some(ext.to_lowercase())
}

#[derive(Clone)]
pub struct SubmissionService {
    submissions: SubmissionRepository,
    photos: PhotoRepository,
    cache: Cache,
    queue: TaskQueue,
    staging_dir: PathBuf,
    max_photo_size_bytes: usize,
    allowed_extensions: Vec<String>,
    photo_transcode_max_retries: i32,
    consensus_refresh_max_retries: i32,
}

impl SubmissionService {
    pub fn new(
        submissions: SubmissionRepository,
        photos: PhotoRepository,
        cache: Cache,
        queue: TaskQueue,
        config: &AppConfig,
    ) -> Self {
        Self {
            submissions,
            photos,
            cache,
            queue,
            staging_dir: PathBuf::from(&config.staging_dir),
            max_photo_size_bytes: config.max_photo_size_bytes,
            allowed_extensions: config.allowed_photo_extensions.clone(),
            photo_transcode_max_retries: config.photo_transcode_max_retries,
            consensus_refresh_max_retries: config.consensus_refresh_max_retries,
        }
    }

    /// Accept or supersede one user's claim about a plate.
    ///
    /// Images are size- and type-checked here, before any async work,
    /// then staged to disk; each gets a photo row in `processing` and
    /// exactly one transcode task. A consensus refresh for the plate is
    /// enqueued fire-and-forget. Never blocks on transcoding.
    #[tracing::instrument(skip(self, new, images), fields(plate = %new.plate, images = images.len()))]
    pub async fn submit(
        &self,
        new: NewSubmission,
        images: Vec<UploadedImage>,
        user_id: Uuid,
    ) -> Result<SubmissionResponse, AppError> {
        new.validate()?;

        for image in &images {
            self.validate_image(image)?;
        }

        let make = normalize_make(&new.make);
        if make.corrected {
            tracing::debug!(
                raw = %new.make,
                normalized = %make.value,
                confidence = make.confidence,
                "Normalized manufacturer name"
            );
        }
        let new = NewSubmission {
            make: make.value,
            ..new
        };

        let submission = self.submissions.upsert(&new, user_id).await?;

        for (index, image) in images.into_iter().enumerate() {
            if let Err(e) = self.stage_photo(&submission, image, index == 0).await {
                // The submission itself already succeeded; a photo that
                // cannot be staged is dropped and reported, not fatal.
                tracing::error!(
                    error = %e,
                    submission_id = %submission.id,
                    "Failed to stage photo for processing"
                );
            }
        }

        // Fire-and-forget: the recompute happens on the worker pool.
        if let Err(e) = self
            .queue
            .submit_task(
                TaskType::ConsensusRefresh,
                Task::payload_from(&ConsensusRefreshPayload {
                    plate: submission.plate.clone(),
                }),
                Priority::Normal.as_i32(),
                Some(self.consensus_refresh_max_retries),
            )
            .await
        {
            tracing::warn!(
                error = %e,
                plate = %submission.plate,
                "Failed to enqueue consensus refresh, periodic run will reconcile"
            );
        }

        self.cache
            .delete(&cache_keys::submissions_by_plate(&submission.plate))
            .await;
        self.cache.delete(cache_keys::ACTIVE_SUBMISSIONS).await;
        self.cache
            .set(
                &cache_keys::submission_by_id(submission.id),
                &submission,
                SUBMISSION_CACHE_TTL_SECS,
            )
            .await;

        tracing::info!(
            submission_id = %submission.id,
            plate = %submission.plate,
            "Submission accepted"
        );

        Ok(SubmissionResponse::from(submission))
    }

    /// Ownership check: a caller may only touch a submission they created.
    /// Fast path through the cache, durable store on miss.
    pub async fn is_own_submission(
        &self,
        submission_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, AppError> {
        if let Some(cached) = self
            .cache
            .get::<Submission>(&cache_keys::submission_by_id(submission_id))
            .await
        {
            if cached.submitted_by_id == user_id {
                return Ok(true);
            }
        }

        let owner = self.submissions.owner_id(submission_id).await?;
        Ok(owner == Some(user_id))
    }

    fn validate_image(&self, image: &UploadedImage) -> Result<(), AppError> {
        if image.bytes.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Uploaded file '{}' is empty",
                image.filename
            )));
        }

        if image.bytes.len() > self.max_photo_size_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "'{}' is {} bytes, limit is {}",
                image.filename,
                image.bytes.len(),
                self.max_photo_size_bytes
            )));
        }

        match image_extension(&image.filename) {
            Some(ext) if self.allowed_extensions.contains(&ext) => Ok(()),
            _ => Err(AppError::InvalidInput(format!(
                "Unsupported image type: '{}'",
                image.filename
            ))),
        }
    }

    /// Write the raw upload to staging, create the photo row, and enqueue
    /// its transcode task.
    async fn stage_photo(
        &self,
        submission: &Submission,
        image: UploadedImage,
        is_primary: bool,
    ) -> Result<(), AppError> {
        // validate_image guarantees an extension at this point
        let ext = image_extension(&image.filename)
            .ok_or_else(|| AppError::InvalidInput("Missing file extension".to_string()))?;

        let size_kb = upload_size_kb(image.bytes.len());
        let staging_path = self.staging_dir.join(format!("{}.{}", Uuid::new_v4(), ext));
        tokio::fs::write(&staging_path, &image.bytes).await?;

        let photo = self.photos.create(submission.id, is_primary, size_kb).await?;

        let payload = PhotoTranscodePayload {
            photo_id: photo.id,
            submission_id: submission.id,
            staging_path: staging_path.to_string_lossy().into_owned(),
            storage_key: photo_storage_key(&submission.plate, photo.id),
            extension: ext,
        };

        if let Err(e) = self
            .queue
            .submit_task(
                TaskType::PhotoTranscode,
                Task::payload_from(&payload),
                Priority::Normal.as_i32(),
                Some(self.photo_transcode_max_retries),
            )
            .await
        {
            // No task will ever pick this photo up; fail it so the daily
            // sweep reclaims the row.
            tracing::error!(error = %e, photo_id = %photo.id, "Failed to enqueue photo transcode");
            if let Err(e) = self.photos.mark_failed(photo.id).await {
                tracing::warn!(error = %e, photo_id = %photo.id, "Failed to mark photo failed");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_is_deterministic_per_photo() {
        let id = Uuid::new_v4();
        let key = photo_storage_key("ABC123", id);
        assert_eq!(key, format!("vehicles/ABC123/image-{}.jpg", id));
        assert_eq!(key, photo_storage_key("ABC123", id));
    }

    #[test]
    fn upload_size_rounds_up_to_kib() {
        assert_eq!(upload_size_kb(0), 0);
        assert_eq!(upload_size_kb(1), 1);
        assert_eq!(upload_size_kb(1024), 1);
        assert_eq!(upload_size_kb(1025), 2);
        assert_eq!(upload_size_kb(10 * 1024 * 1024), 10 * 1024);
    }

    #[test]
    fn extension_extraction() {
        assert_eq!(image_extension("photo.JPG"), Some("jpg".to_string()));
        assert_eq!(image_extension("a.b.webp"), Some("webp".to_string()));
        assert_eq!(image_extension("noextension"), None);
        assert_eq!(image_extension("trailingdot."), None);
    }
}
