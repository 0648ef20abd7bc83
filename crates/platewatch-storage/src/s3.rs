use crate::traits::{validate_key, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload, Result as ObjectResult};
use platewatch_core::StorageBackend;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
        })
    }

    fn generate_url(&self, key: &str) -> String {
        object_url(self.endpoint_url.as_deref(), &self.bucket, &self.region, key)
    }
}

/// Public URL for an object: path-style through a custom endpoint,
/// virtual-hosted style on AWS proper.
fn object_url(endpoint_url: Option<&str>, bucket: &str, region: &str, key: &str) -> String {
    if let Some(endpoint) = endpoint_url {
        let base_url = endpoint.trim_end_matches('/');
        format!("{}/{}/{}", base_url, bucket, key)
    } else {
        format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key)
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        validate_key(storage_key)?;
        let size = data.len() as u64;
        let bytes = Bytes::from(data);
        let location = Path::from(storage_key.to_string());
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.put(&location, PutPayload::from(bytes)).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(self.generate_url(storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        validate_key(storage_key)?;
        let location = Path::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %storage_key,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        validate_key(storage_key)?;
        let location = Path::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(_) => Ok(()),
            Err(ObjectStoreError::NotFound { .. }) => Ok(()),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    "S3 delete failed"
                );
                Err(StorageError::DeleteFailed(e.to_string()))
            }
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        validate_key(storage_key)?;
        let location = Path::from(storage_key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_generation_with_custom_endpoint() {
        assert_eq!(
            object_url(
                Some("http://localhost:9000/"),
                "platewatch-photos",
                "us-east-1",
                "vehicles/ABC123/image-1.jpg"
            ),
            "http://localhost:9000/platewatch-photos/vehicles/ABC123/image-1.jpg"
        );
    }

    #[test]
    fn url_generation_on_aws() {
        assert_eq!(
            object_url(None, "platewatch-photos", "eu-west-1", "a/b.jpg"),
            "https://platewatch-photos.s3.eu-west-1.amazonaws.com/a/b.jpg"
        );
    }
}
