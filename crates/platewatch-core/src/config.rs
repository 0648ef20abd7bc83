//! Configuration module
//!
//! Environment-driven configuration for the reconciliation service:
//! database, cache, storage, photo ingestion bounds, consensus
//! thresholds, and task queue tuning.

use std::env;

use crate::storage_types::StorageBackend;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_PHOTO_SIZE_MB: usize = 10;
const MIN_SUBMISSIONS_FOR_PUBLIC: i32 = 2;
const MIN_FIELD_CONFIDENCE: f64 = 0.6;
const CONSENSUS_INTERVAL_SECS: u64 = 3600;
const PHOTO_CLEANUP_INTERVAL_SECS: u64 = 86_400;
const PHOTO_RETENTION_HOURS: i64 = 24;
const TASK_QUEUE_MAX_WORKERS: usize = 4;
const TASK_QUEUE_POLL_INTERVAL_MS: u64 = 1000;
const TASK_QUEUE_DEFAULT_TIMEOUT_SECS: i32 = 600;
const PHOTO_TRANSCODE_MAX_RETRIES: i32 = 5;
const CONSENSUS_REFRESH_MAX_RETRIES: i32 = 3;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
    /// Redis connection URL. When unset the cache runs disabled and every
    /// lookup falls through to the durable store.
    pub redis_url: Option<String>,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Photo ingestion
    pub staging_dir: String,
    pub max_photo_size_bytes: usize,
    pub allowed_photo_extensions: Vec<String>,
    // Consensus thresholds
    pub min_submissions_for_public: i32,
    pub min_field_confidence: f64,
    // Schedules
    pub consensus_interval_secs: u64,
    pub photo_cleanup_interval_secs: u64,
    pub photo_retention_hours: i64,
    // Task queue
    pub task_queue_max_workers: usize,
    pub task_queue_poll_interval_ms: u64,
    pub task_queue_default_timeout_seconds: i32,
    pub photo_transcode_max_retries: i32,
    pub consensus_refresh_max_retries: i32,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "s3" => StorageBackend::S3,
            _ => StorageBackend::Local,
        };

        let allowed_photo_extensions = env::var("ALLOWED_PHOTO_EXTENSIONS")
            .unwrap_or_else(|_| "jpg,jpeg,png,webp".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let staging_dir = env::var("STAGING_DIR")
            .unwrap_or_else(|_| env::temp_dir().to_string_lossy().into_owned());

        let config = AppConfig {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            environment,
            redis_url: env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            staging_dir,
            max_photo_size_bytes: env_or("MAX_PHOTO_SIZE_MB", MAX_PHOTO_SIZE_MB) * 1024 * 1024,
            allowed_photo_extensions,
            min_submissions_for_public: env_or(
                "MIN_SUBMISSIONS_FOR_PUBLIC",
                MIN_SUBMISSIONS_FOR_PUBLIC,
            ),
            min_field_confidence: env_or("MIN_FIELD_CONFIDENCE", MIN_FIELD_CONFIDENCE),
            consensus_interval_secs: env_or("CONSENSUS_INTERVAL_SECS", CONSENSUS_INTERVAL_SECS),
            photo_cleanup_interval_secs: env_or(
                "PHOTO_CLEANUP_INTERVAL_SECS",
                PHOTO_CLEANUP_INTERVAL_SECS,
            ),
            photo_retention_hours: env_or("PHOTO_RETENTION_HOURS", PHOTO_RETENTION_HOURS),
            task_queue_max_workers: env_or("TASK_QUEUE_MAX_WORKERS", TASK_QUEUE_MAX_WORKERS),
            task_queue_poll_interval_ms: env_or(
                "TASK_QUEUE_POLL_INTERVAL_MS",
                TASK_QUEUE_POLL_INTERVAL_MS,
            ),
            task_queue_default_timeout_seconds: env_or(
                "TASK_QUEUE_DEFAULT_TIMEOUT_SECONDS",
                TASK_QUEUE_DEFAULT_TIMEOUT_SECS,
            ),
            photo_transcode_max_retries: env_or(
                "PHOTO_TRANSCODE_MAX_RETRIES",
                PHOTO_TRANSCODE_MAX_RETRIES,
            ),
            consensus_refresh_max_retries: env_or(
                "CONSENSUS_REFRESH_MAX_RETRIES",
                CONSENSUS_REFRESH_MAX_RETRIES,
            ),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if !(0.0..=1.0).contains(&self.min_field_confidence) {
            return Err(anyhow::anyhow!(
                "MIN_FIELD_CONFIDENCE must be between 0 and 1"
            ));
        }

        if self.min_submissions_for_public < 1 {
            return Err(anyhow::anyhow!("MIN_SUBMISSIONS_FOR_PUBLIC must be >= 1"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            database_url: "postgresql://localhost/platewatch".to_string(),
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            environment: "development".to_string(),
            redis_url: None,
            storage_backend: StorageBackend::Local,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: Some("/var/lib/platewatch".to_string()),
            local_storage_base_url: Some("http://localhost:4000/files".to_string()),
            staging_dir: "/tmp".to_string(),
            max_photo_size_bytes: MAX_PHOTO_SIZE_MB * 1024 * 1024,
            allowed_photo_extensions: vec!["jpg".to_string(), "png".to_string()],
            min_submissions_for_public: MIN_SUBMISSIONS_FOR_PUBLIC,
            min_field_confidence: MIN_FIELD_CONFIDENCE,
            consensus_interval_secs: CONSENSUS_INTERVAL_SECS,
            photo_cleanup_interval_secs: PHOTO_CLEANUP_INTERVAL_SECS,
            photo_retention_hours: PHOTO_RETENTION_HOURS,
            task_queue_max_workers: TASK_QUEUE_MAX_WORKERS,
            task_queue_poll_interval_ms: TASK_QUEUE_POLL_INTERVAL_MS,
            task_queue_default_timeout_seconds: TASK_QUEUE_DEFAULT_TIMEOUT_SECS,
            photo_transcode_max_retries: PHOTO_TRANSCODE_MAX_RETRIES,
            consensus_refresh_max_retries: CONSENSUS_REFRESH_MAX_RETRIES,
        }
    }

    #[test]
    fn valid_local_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn s3_backend_requires_bucket_and_region() {
        let mut config = base_config();
        config.storage_backend = StorageBackend::S3;
        assert!(config.validate().is_err());

        config.s3_bucket = Some("platewatch-photos".to_string());
        config.s3_region = Some("eu-west-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_postgres_url() {
        let mut config = base_config();
        config.database_url = "mysql://localhost/nope".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let mut config = base_config();
        config.min_field_confidence = 1.5;
        assert!(config.validate().is_err());
    }
}
