//! Photo transcode handler.
//!
//! Reads the staged upload, downscales and re-encodes it, writes the
//! derivative to its deterministic storage key, and records the outcome
//! on the photo row. Re-delivery is safe: every attempt re-marks the row
//! `processing`, and the storage key never changes, so a retried upload
//! overwrites its own output.

use std::sync::Arc;

use serde_json::json;

use platewatch_core::models::PhotoTranscodePayload;
use platewatch_core::TaskError;
use platewatch_db::PhotoRepository;
use platewatch_storage::Storage;

use crate::ingestion::upload_size_kb;
use crate::processing::transcode_to_jpeg;

pub struct PhotoTranscodeHandler {
    photos: PhotoRepository,
    storage: Arc<dyn Storage>,
}

impl PhotoTranscodeHandler {
    pub fn new(photos: PhotoRepository, storage: Arc<dyn Storage>) -> Self {
        Self { photos, storage }
    }

    #[tracing::instrument(skip(self, payload), fields(photo_id = %payload.photo_id, key = %payload.storage_key))]
    pub async fn handle(
        &self,
        payload: PhotoTranscodePayload,
    ) -> Result<serde_json::Value, TaskError> {
        self.photos
            .mark_processing(payload.photo_id)
            .await
            .map_err(TaskError::recoverable)?;

        let data = match tokio::fs::read(&payload.staging_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // The staging file is gone; no retry can bring it back.
                self.fail_photo(payload.photo_id).await;
                return Err(TaskError::unrecoverable(anyhow::anyhow!(
                    "Staging file missing: {}",
                    payload.staging_path
                )));
            }
            Err(e) => {
                self.fail_photo(payload.photo_id).await;
                return Err(TaskError::recoverable(anyhow::anyhow!(
                    "Failed to read staging file {}: {}",
                    payload.staging_path,
                    e
                )));
            }
        };

        let jpeg = match transcode_to_jpeg(&data) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                self.fail_photo(payload.photo_id).await;
                return Err(TaskError::unrecoverable(e));
            }
        };
        let size_kb = upload_size_kb(jpeg.len());

        let url = match self
            .storage
            .upload_with_key(&payload.storage_key, jpeg, "image/jpeg")
            .await
        {
            Ok(url) => url,
            Err(e) => {
                self.fail_photo(payload.photo_id).await;
                return Err(TaskError::recoverable(anyhow::anyhow!(
                    "Storage upload failed: {}",
                    e
                )));
            }
        };

        self.photos
            .mark_done(payload.photo_id, &url, size_kb)
            .await
            .map_err(TaskError::recoverable)?;

        // Best-effort: a leftover staging file is only disk noise.
        if let Err(e) = tokio::fs::remove_file(&payload.staging_path).await {
            tracing::debug!(
                error = %e,
                staging_path = %payload.staging_path,
                "Failed to remove staging file"
            );
        }

        Ok(json!({
            "photo_id": payload.photo_id,
            "url": url,
            "upload_size_kb": size_kb,
        }))
    }

    /// The row tracks the latest attempt; the next retry re-marks it
    /// `processing`, and after the final attempt it stays `failed` until
    /// the daily sweep reaps it.
    async fn fail_photo(&self, photo_id: uuid::Uuid) {
        if let Err(e) = self.photos.mark_failed(photo_id).await {
            tracing::warn!(error = %e, photo_id = %photo_id, "Failed to mark photo failed");
        }
    }
}
