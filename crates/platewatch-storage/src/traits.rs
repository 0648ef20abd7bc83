//! Storage abstraction trait
//!
//! All storage backends (S3, local filesystem) implement this trait, so
//! the photo pipeline never couples to a specific provider.

use async_trait::async_trait;
use platewatch_core::StorageBackend;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait.
///
/// Writes are overwrite-safe by key: uploading to the same key twice
/// replaces the object, which is what makes transcode retries idempotent.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload data to a specific storage key and return the public URL.
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Download an object by its storage key.
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete an object by its storage key. Deleting a missing object is
    /// not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if an object exists.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Validate a storage key: relative, no traversal.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty()
        || storage_key.starts_with('/')
        || storage_key.split('/').any(|segment| segment == "..")
    {
        return Err(StorageError::InvalidKey(format!(
            "Invalid storage key: {}",
            storage_key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_relative_nested_keys() {
        assert!(validate_key("vehicles/ABC123/image-1.jpg").is_ok());
        assert!(validate_key("file.jpg").is_ok());
    }

    #[test]
    fn rejects_traversal_and_absolute_keys() {
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("vehicles/../secrets").is_err());
        assert!(validate_key("..").is_err());
    }
}
