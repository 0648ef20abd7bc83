use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// Photo upload lifecycle.
///
/// Rows are created in `Processing` synchronously with the submission,
/// move to `Done` (with a populated url) when the transcode task
/// completes, or `Failed` on processing error. Rows with a null url in
/// `Pending`/`Failed` older than the retention window are reaped by the
/// daily cleanup sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "photo_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PhotoStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl Display for PhotoStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PhotoStatus::Pending => write!(f, "pending"),
            PhotoStatus::Processing => write!(f, "processing"),
            PhotoStatus::Done => write!(f, "done"),
            PhotoStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for PhotoStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PhotoStatus::Pending),
            "processing" => Ok(PhotoStatus::Processing),
            "done" => Ok(PhotoStatus::Done),
            "failed" => Ok(PhotoStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid photo status: {}", s)),
        }
    }
}

/// One uploaded image attached to a submission. `url` stays null until
/// the async transcode completes.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Photo {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub url: Option<String>,
    pub is_primary: bool,
    pub upload_size_kb: i32,
    pub status: PhotoStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_status_roundtrip() {
        for status in [
            PhotoStatus::Pending,
            PhotoStatus::Processing,
            PhotoStatus::Done,
            PhotoStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<PhotoStatus>().unwrap(), status);
        }
        assert!("uploading".parse::<PhotoStatus>().is_err());
    }
}
