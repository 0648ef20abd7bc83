use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use platewatch_core::models::{Task, TaskStatus, TaskType};

/// Channel used to wake workers the moment a task is created, instead of
/// waiting out the poll interval.
pub const TASK_NOTIFY_CHANNEL: &str = "platewatch_new_task";

const TASK_COLUMNS: &str = r#"
    id,
    task_type,
    status,
    priority,
    payload,
    result,
    scheduled_at,
    started_at,
    completed_at,
    retry_count,
    max_retries,
    timeout_seconds,
    created_at,
    updated_at
"#;

/// Durable task queue rows. Claiming uses `FOR UPDATE SKIP LOCKED` so any
/// number of workers can pull concurrently without double-delivery from a
/// single claim (delivery overall remains at-least-once).
#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new task and notify workers.
    #[tracing::instrument(skip(self, payload))]
    pub async fn create_task(
        &self,
        task_type: TaskType,
        payload: serde_json::Value,
        priority: i32,
        max_retries: i32,
        timeout_seconds: Option<i32>,
    ) -> Result<Task> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction for task creation")?;

        let task: Task = sqlx::query_as::<Postgres, Task>(&format!(
            r#"
            INSERT INTO tasks (task_type, status, priority, payload, scheduled_at, max_retries, timeout_seconds)
            VALUES ($1, 'pending', $2, $3, NOW(), $4, $5)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(task_type.to_string())
        .bind(priority)
        .bind(payload)
        .bind(max_retries)
        .bind(timeout_seconds)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert task into database")?;

        // Non-fatal: workers fall back to polling if LISTEN/NOTIFY is down.
        if let Err(e) = sqlx::query("SELECT pg_notify($1, '')")
            .bind(TASK_NOTIFY_CHANNEL)
            .execute(&mut *tx)
            .await
        {
            tracing::warn!(
                error = %e,
                task_id = %task.id,
                "Failed to send pg_notify for new task, workers will discover it via polling"
            );
        }

        tx.commit()
            .await
            .context("Failed to commit task creation transaction")?;

        tracing::info!(
            task_id = %task.id,
            task_type = %task.task_type,
            priority = priority,
            "Task created"
        );

        Ok(task)
    }

    /// Atomically claim the next runnable task and mark it running.
    #[tracing::instrument(skip(self))]
    pub async fn claim_next_task(&self) -> Result<Option<Task>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let task: Option<Task> = sqlx::query_as::<Postgres, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE status IN ('pending', 'scheduled')
                AND scheduled_at <= NOW()
            ORDER BY priority DESC, scheduled_at ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        ))
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to fetch next task")?;

        if let Some(task) = task {
            let claimed: Task = sqlx::query_as::<Postgres, Task>(&format!(
                r#"
                UPDATE tasks
                SET status = 'running',
                    started_at = NOW(),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING {TASK_COLUMNS}
                "#,
            ))
            .bind(task.id)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to mark claimed task running")?;

            tx.commit().await.context("Failed to commit claim")?;

            tracing::debug!(task_id = %claimed.id, task_type = %claimed.task_type, "Task claimed");

            Ok(Some(claimed))
        } else {
            tx.rollback().await.ok();
            Ok(None)
        }
    }

    /// Mark task as completed with its result.
    #[tracing::instrument(skip(self, result))]
    pub async fn mark_completed(&self, task_id: Uuid, result: serde_json::Value) -> Result<Task> {
        let task: Task = sqlx::query_as::<Postgres, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = 'completed',
                result = $2,
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(task_id)
        .bind(result)
        .fetch_one(&self.pool)
        .await
        .context("Failed to mark task as completed")?;

        tracing::info!(task_id = %task_id, task_type = %task.task_type, "Task completed");

        Ok(task)
    }

    /// Mark task as failed with error details.
    #[tracing::instrument(skip(self, error))]
    pub async fn mark_failed(&self, task_id: Uuid, error: serde_json::Value) -> Result<Task> {
        let task: Task = sqlx::query_as::<Postgres, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = 'failed',
                result = $2,
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(task_id)
        .bind(error)
        .fetch_one(&self.pool)
        .await
        .context("Failed to mark task as failed")?;

        tracing::error!(
            task_id = %task_id,
            task_type = %task.task_type,
            retry_count = task.retry_count,
            "Task failed"
        );

        Ok(task)
    }

    /// Push a failed task back into the queue after its backoff delay.
    /// The claim query only picks tasks whose `scheduled_at` has passed,
    /// so the delay is enforced at claim time.
    #[tracing::instrument(skip(self))]
    pub async fn reschedule_retry(&self, task_id: Uuid, backoff_seconds: u64) -> Result<Task> {
        let task: Task = sqlx::query_as::<Postgres, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = 'scheduled',
                retry_count = retry_count + 1,
                scheduled_at = NOW() + make_interval(secs => $2),
                started_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(task_id)
        .bind(backoff_seconds as f64)
        .fetch_one(&self.pool)
        .await
        .context("Failed to reschedule task retry")?;

        tracing::info!(
            task_id = %task_id,
            retry_count = task.retry_count,
            max_retries = task.max_retries,
            backoff_seconds = backoff_seconds,
            "Task retry scheduled"
        );

        Ok(task)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, task_id: Uuid, status: TaskStatus) -> Result<Task> {
        let task: Task = sqlx::query_as::<Postgres, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(task_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .context("Failed to update task status")?;

        Ok(task)
    }
}
