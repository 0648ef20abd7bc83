use crate::traits::{validate_key, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use platewatch_core::StorageBackend;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/platewatch/photos")
    /// * `base_url` - Base URL the files are served under (e.g., "http://localhost:4000/photos")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;
        Ok(self.base_path.join(storage_key))
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len() as u64;

        self.ensure_parent_dir(&path).await?;
        fs::write(&path, data).await.map_err(|e| {
            tracing::error!(error = %e, key = %storage_key, "Local upload failed");
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(key = %storage_key, size_bytes = size, "Local upload successful");

        Ok(self.generate_url(storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;

        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => {
                tracing::error!(error = %e, key = %storage_key, "Local download failed");
                Err(StorageError::DownloadFailed(e.to_string()))
            }
        }
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                tracing::error!(error = %e, key = %storage_key, "Local delete failed");
                Err(StorageError::DeleteFailed(e.to_string()))
            }
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await?)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn storage() -> (TempDir, LocalStorage) {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:4000/photos".to_string())
            .await
            .unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn upload_download_roundtrip() {
        let (_dir, storage) = storage().await;
        let url = storage
            .upload_with_key("vehicles/ABC123/image-1.jpg", b"jpeg bytes".to_vec(), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:4000/photos/vehicles/ABC123/image-1.jpg");

        let data = storage.download("vehicles/ABC123/image-1.jpg").await.unwrap();
        assert_eq!(data, b"jpeg bytes");
        assert!(storage.exists("vehicles/ABC123/image-1.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn overwrite_same_key_is_safe() {
        let (_dir, storage) = storage().await;
        storage
            .upload_with_key("vehicles/X/image.jpg", b"first".to_vec(), "image/jpeg")
            .await
            .unwrap();
        storage
            .upload_with_key("vehicles/X/image.jpg", b"second".to_vec(), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(storage.download("vehicles/X/image.jpg").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_dir, storage) = storage().await;
        storage
            .upload_with_key("a/b.jpg", b"x".to_vec(), "image/jpeg")
            .await
            .unwrap();
        storage.delete("a/b.jpg").await.unwrap();
        storage.delete("a/b.jpg").await.unwrap();
        assert!(!storage.exists("a/b.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn rejects_traversal_keys() {
        let (_dir, storage) = storage().await;
        assert!(matches!(
            storage.download("../outside").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            storage
                .upload_with_key("/abs/path", b"x".to_vec(), "image/jpeg")
                .await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let (_dir, storage) = storage().await;
        assert!(matches!(
            storage.download("nope.jpg").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
