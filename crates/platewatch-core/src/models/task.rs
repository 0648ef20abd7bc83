use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    PhotoTranscode,
    ConsensusRefresh,
}

impl Display for TaskType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TaskType::PhotoTranscode => write!(f, "photo_transcode"),
            TaskType::ConsensusRefresh => write!(f, "consensus_refresh"),
        }
    }
}

impl FromStr for TaskType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photo_transcode" => Ok(TaskType::PhotoTranscode),
            "consensus_refresh" => Ok(TaskType::ConsensusRefresh),
            _ => Err(anyhow::anyhow!("Invalid task type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Scheduled,
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Scheduled => write!(f, "scheduled"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low = 3,
    #[default]
    Normal = 5,
    High = 7,
}

impl Priority {
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }
}

/// One durable queue entry. Delivery is at-least-once: handlers must
/// tolerate duplicate invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub priority: i32,
    pub payload: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub scheduled_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub timeout_seconds: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for Task {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(Task {
            id: row.get("id"),
            task_type: row.get::<String, _>("task_type").parse().map_err(|e| {
                sqlx::Error::Decode(format!("Failed to parse task_type: {}", e).into())
            })?,
            status: row.get("status"),
            priority: row.get("priority"),
            payload: row.get("payload"),
            result: row.get("result"),
            scheduled_at: row.get("scheduled_at"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
            retry_count: row.get("retry_count"),
            max_retries: row.get("max_retries"),
            timeout_seconds: row.get("timeout_seconds"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

impl Task {
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Extract the payload as a typed struct, returning an error on failure.
    pub fn try_payload_as<P: TaskPayload>(&self) -> Result<P, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }

    /// Serialize a typed payload for task creation.
    pub fn payload_from<P: TaskPayload>(payload: &P) -> serde_json::Value {
        serde_json::to_value(payload).unwrap_or_default()
    }
}

/// Trait for type-safe task payloads
pub trait TaskPayload: Serialize + for<'de> Deserialize<'de> {
    fn task_type() -> TaskType;
}

/// Everything the transcode worker needs: which photo row to update,
/// where the raw upload was staged, and the overwrite-safe destination
/// key in object storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoTranscodePayload {
    pub photo_id: Uuid,
    pub submission_id: Uuid,
    pub staging_path: String,
    pub storage_key: String,
    pub extension: String,
}

impl TaskPayload for PhotoTranscodePayload {
    fn task_type() -> TaskType {
        TaskType::PhotoTranscode
    }
}

/// Fire-and-forget consensus recompute for one plate. Re-running is
/// harmless: consensus is a pure recompute over current data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusRefreshPayload {
    pub plate: String,
}

impl TaskPayload for ConsensusRefreshPayload {
    fn task_type() -> TaskType {
        TaskType::ConsensusRefresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_type_display_and_parse() {
        assert_eq!(TaskType::PhotoTranscode.to_string(), "photo_transcode");
        assert_eq!(TaskType::ConsensusRefresh.to_string(), "consensus_refresh");
        assert_eq!(
            "photo_transcode".parse::<TaskType>().unwrap(),
            TaskType::PhotoTranscode
        );
        assert!("email_send".parse::<TaskType>().is_err());
    }

    #[test]
    fn priority_values() {
        assert_eq!(Priority::Low.as_i32(), 3);
        assert_eq!(Priority::Normal.as_i32(), 5);
        assert_eq!(Priority::High.as_i32(), 7);
        assert_eq!(Priority::default(), Priority::Normal);
        assert!(Priority::Low < Priority::High);
    }

    fn make_task(retry_count: i32, max_retries: i32) -> Task {
        Task {
            id: Uuid::new_v4(),
            task_type: TaskType::PhotoTranscode,
            status: TaskStatus::Failed,
            priority: Priority::Normal.as_i32(),
            payload: serde_json::json!({}),
            result: None,
            scheduled_at: Utc::now(),
            started_at: None,
            completed_at: None,
            retry_count,
            max_retries,
            timeout_seconds: Some(600),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn can_retry_under_limit() {
        assert!(make_task(2, 5).can_retry());
        assert!(!make_task(5, 5).can_retry());
        assert!(!make_task(6, 5).can_retry());
    }

    #[test]
    fn typed_payload_roundtrip() {
        let payload = PhotoTranscodePayload {
            photo_id: Uuid::new_v4(),
            submission_id: Uuid::new_v4(),
            staging_path: "/tmp/abc.jpg".to_string(),
            storage_key: "vehicles/ABC123/image-xyz.jpg".to_string(),
            extension: "jpg".to_string(),
        };
        let mut task = make_task(0, 5);
        task.payload = Task::payload_from(&payload);
        let parsed: PhotoTranscodePayload = task.try_payload_as().unwrap();
        assert_eq!(parsed.photo_id, payload.photo_id);
        assert_eq!(parsed.storage_key, payload.storage_key);
    }

    #[test]
    fn malformed_payload_errors() {
        let mut task = make_task(0, 3);
        task.payload = serde_json::json!({"nope": true});
        assert!(task.try_payload_as::<ConsensusRefreshPayload>().is_err());
    }
}
