use crate::{LocalStorage, S3Storage, Storage, StorageBackend, StorageError, StorageResult};
use platewatch_core::AppConfig;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &AppConfig) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION not configured".to_string())
            })?;
            let endpoint = config.s3_endpoint.clone();

            let storage = S3Storage::new(bucket, region, endpoint).await?;
            Ok(Arc::new(storage))
        }

        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config.local_storage_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;

            let storage = LocalStorage::new(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }
    }
}
