//! Task queue: worker pool, LISTEN/NOTIFY or polling, retry, and submission.
//!
//! Shutdown: [`TaskQueue::shutdown`] signals the pool to stop; it does not
//! wait for in-flight tasks. For graceful shutdown, give running tasks a
//! bounded time to finish before process exit.

use anyhow::{Context, Result};
use serde_json::json;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::sleep;
use uuid::Uuid;

use platewatch_core::models::{Task, TaskType};
use platewatch_core::TaskError;
use platewatch_db::db::TASK_NOTIFY_CHANNEL;
use platewatch_db::TaskRepository;

use crate::context::TaskHandlerContext;

/// Maximum delay in seconds before retrying a failed task. Caps exponential
/// backoff so high retry counts do not produce excessively long delays.
pub const MAX_RETRY_BACKOFF_SECS: u64 = 300;

/// Backoff in seconds for a given retry count: 2s base, doubling, capped.
#[inline]
pub(crate) fn compute_retry_backoff_seconds(retry_count: i32) -> u64 {
    (2_u64 * 2_u64.pow(retry_count as u32)).min(MAX_RETRY_BACKOFF_SECS)
}

#[derive(Clone)]
pub struct TaskQueueConfig {
    pub max_workers: usize,
    pub poll_interval_ms: u64,
    pub default_timeout_seconds: i32,
    pub default_max_retries: i32,
}

impl Default for TaskQueueConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            poll_interval_ms: 1000,
            default_timeout_seconds: 600,
            default_max_retries: 3,
        }
    }
}

pub struct TaskQueue {
    repository: TaskRepository,
    config: TaskQueueConfig,
    shutdown_tx: mpsc::Sender<()>,
}

impl TaskQueue {
    /// Create a new TaskQueue with a weak reference to the dispatch context.
    ///
    /// If `pool` is `Some`, the worker uses PostgreSQL LISTEN/NOTIFY to wake
    /// immediately when tasks are created, in addition to polling at
    /// `poll_interval_ms`. If `pool` is `None`, only polling is used.
    pub fn new(
        repository: TaskRepository,
        config: TaskQueueConfig,
        context: Weak<dyn TaskHandlerContext>,
        pool: Option<sqlx::PgPool>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let repo_clone = repository.clone();
        let config_clone = config.clone();

        tokio::spawn(async move {
            Self::worker_pool(repo_clone, config_clone, context, shutdown_rx, pool).await;
        });

        Self {
            repository,
            config,
            shutdown_tx,
        }
    }

    /// Creates a TaskQueue that does not spawn a worker. Tasks submitted
    /// here are written to the DB and picked up by the real worker.
    pub fn new_no_worker(repository: TaskRepository, config: TaskQueueConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        drop(shutdown_rx);
        Self {
            repository,
            config,
            shutdown_tx,
        }
    }

    /// Submit a new task to the queue. `max_retries` overrides the config
    /// default, letting each job type carry its own retry budget.
    #[tracing::instrument(skip(self, payload))]
    pub async fn submit_task(
        &self,
        task_type: TaskType,
        payload: serde_json::Value,
        priority: i32,
        max_retries: Option<i32>,
    ) -> Result<Uuid> {
        let task = self
            .repository
            .create_task(
                task_type.clone(),
                payload,
                priority,
                max_retries.unwrap_or(self.config.default_max_retries),
                Some(self.config.default_timeout_seconds),
            )
            .await
            .context("Failed to create task in repository")?;

        tracing::info!(
            task_id = %task.id,
            task_type = %task_type,
            priority = priority,
            "Task submitted to queue"
        );

        Ok(task.id)
    }

    async fn worker_pool(
        repository: TaskRepository,
        config: TaskQueueConfig,
        context: Weak<dyn TaskHandlerContext>,
        mut shutdown_rx: mpsc::Receiver<()>,
        pool: Option<sqlx::PgPool>,
    ) {
        let use_listen = pool.is_some();
        tracing::info!(
            max_workers = config.max_workers,
            poll_interval_ms = config.poll_interval_ms,
            listen_notify = use_listen,
            "Task queue worker pool started"
        );

        let semaphore = Arc::new(Semaphore::new(config.max_workers));
        let poll_interval = Duration::from_millis(config.poll_interval_ms);

        // Wake the main loop when LISTEN receives a NOTIFY.
        let (notify_tx, mut notify_rx) = mpsc::channel::<()>(16);
        if let Some(pool) = pool {
            let tx = notify_tx.clone();
            tokio::spawn(async move {
                loop {
                    match sqlx::postgres::PgListener::connect_with(&pool).await {
                        Ok(mut listener) => {
                            if let Err(e) = listener.listen(TASK_NOTIFY_CHANNEL).await {
                                tracing::warn!(error = %e, "LISTEN failed, will retry");
                                tokio::time::sleep(Duration::from_secs(5)).await;
                                continue;
                            }
                            while listener.recv().await.is_ok() {
                                let _ = tx.send(()).await;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "PgListener connect failed, will retry");
                            tokio::time::sleep(Duration::from_secs(5)).await;
                        }
                    }
                }
            });
        }

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Task queue worker pool shutting down");
                    break;
                }
                _ = notify_rx.recv() => {
                    Self::claim_and_dispatch_one(&repository, &semaphore, &context).await;
                }
                _ = sleep(poll_interval) => {
                    Self::claim_and_dispatch_one(&repository, &semaphore, &context).await;
                }
            }
        }

        tracing::info!("Task queue worker pool stopped");
    }

    async fn claim_and_dispatch_one(
        repository: &TaskRepository,
        semaphore: &Arc<Semaphore>,
        context: &Weak<dyn TaskHandlerContext>,
    ) {
        let permit = match semaphore.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::debug!("No workers available, skipping claim");
                return;
            }
        };

        match repository.claim_next_task().await {
            Ok(Some(task)) => {
                let repo = repository.clone();
                let ctx = context.clone();

                tokio::spawn(async move {
                    let _permit = permit;
                    if let Err(e) = Self::process_task_with_retry(task, repo, ctx).await {
                        tracing::error!(error = %e, "Task processing failed after retries");
                    }
                });
            }
            Ok(None) => {
                drop(permit);
                tracing::trace!("No tasks available in queue");
            }
            Err(e) => {
                drop(permit);
                tracing::error!(error = %e, "Failed to claim task from queue");
            }
        }
    }

    #[tracing::instrument(skip(repository, context), fields(task.id = %task.id, task.type = %task.task_type))]
    async fn process_task_with_retry(
        task: Task,
        repository: TaskRepository,
        context: Weak<dyn TaskHandlerContext>,
    ) -> Result<()> {
        let ctx = context.upgrade().ok_or_else(|| {
            anyhow::anyhow!("TaskHandlerContext was dropped, cannot process task")
        })?;

        let timeout_duration = task
            .timeout_seconds
            .map(|s| Duration::from_secs(s as u64))
            .unwrap_or(Duration::from_secs(600));

        let result = tokio::time::timeout(timeout_duration, ctx.dispatch_task(&task)).await;

        match result {
            Ok(Ok(task_result)) => {
                repository
                    .mark_completed(task.id, task_result)
                    .await
                    .context("Failed to mark task as completed")?;
                tracing::info!(task_id = %task.id, task_type = %task.task_type, "Task completed successfully");
                Ok(())
            }
            Ok(Err(e)) => {
                let is_unrecoverable = e
                    .downcast_ref::<TaskError>()
                    .map(|te| !te.is_recoverable())
                    .unwrap_or(false);

                tracing::error!(
                    task_id = %task.id,
                    error = %e,
                    retry_count = task.retry_count,
                    max_retries = task.max_retries,
                    unrecoverable = is_unrecoverable,
                    "Task execution failed"
                );

                if is_unrecoverable {
                    let error_result = json!({
                        "error": e.to_string(),
                        "retry_count": task.retry_count,
                        "unrecoverable": true,
                    });
                    repository
                        .mark_failed(task.id, error_result)
                        .await
                        .context("Failed to mark task as failed")?;
                    tracing::error!(task_id = %task.id, "Task failed with unrecoverable error, will not retry");
                    return Err(e);
                }

                if task.can_retry() {
                    let backoff_seconds = compute_retry_backoff_seconds(task.retry_count);
                    repository
                        .reschedule_retry(task.id, backoff_seconds)
                        .await
                        .context("Failed to reschedule task retry")?;
                    Ok(())
                } else {
                    let error_result = json!({
                        "error": e.to_string(),
                        "retry_count": task.retry_count,
                        "reason": "Task failed after maximum retries"
                    });
                    repository
                        .mark_failed(task.id, error_result)
                        .await
                        .context("Failed to mark task as failed")?;
                    tracing::error!(task_id = %task.id, "Task failed after max retries");
                    Err(e)
                }
            }
            Err(_) => {
                tracing::error!(
                    task_id = %task.id,
                    timeout_seconds = ?task.timeout_seconds,
                    "Task execution timed out"
                );
                if task.can_retry() {
                    let backoff_seconds = compute_retry_backoff_seconds(task.retry_count);
                    repository.reschedule_retry(task.id, backoff_seconds).await?;
                    Ok(())
                } else {
                    let error_result = json!({
                        "error": "Task execution timed out",
                        "timeout_seconds": task.timeout_seconds,
                    });
                    repository.mark_failed(task.id, error_result).await?;
                    Err(anyhow::anyhow!("Task execution timed out"))
                }
            }
        }
    }

    /// Signals the worker pool to stop claiming new tasks and exit.
    /// Returns immediately; already-spawned handlers continue running
    /// until they complete or time out.
    pub async fn shutdown(&self) {
        tracing::info!("Initiating task queue shutdown");
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl Clone for TaskQueue {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            config: self.config.clone(),
            shutdown_tx: self.shutdown_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_backoff_exponential_then_capped() {
        assert_eq!(compute_retry_backoff_seconds(0), 2);
        assert_eq!(compute_retry_backoff_seconds(1), 4);
        assert_eq!(compute_retry_backoff_seconds(2), 8);
        assert_eq!(compute_retry_backoff_seconds(6), 128);
        assert_eq!(compute_retry_backoff_seconds(7), MAX_RETRY_BACKOFF_SECS);
        assert_eq!(compute_retry_backoff_seconds(10), MAX_RETRY_BACKOFF_SECS);
    }

    #[test]
    fn unrecoverable_task_error_detected() {
        let err: anyhow::Error = TaskError::unrecoverable(anyhow::anyhow!("bad payload")).into();
        let is_unrecoverable = err
            .downcast_ref::<TaskError>()
            .map(|te| !te.is_recoverable())
            .unwrap_or(false);
        assert!(is_unrecoverable);
    }

    #[test]
    fn recoverable_task_error_detected() {
        let err: anyhow::Error = TaskError::recoverable(anyhow::anyhow!("network")).into();
        let is_unrecoverable = err
            .downcast_ref::<TaskError>()
            .map(|te| !te.is_recoverable())
            .unwrap_or(false);
        assert!(!is_unrecoverable);
    }

    #[test]
    fn non_task_error_treated_as_recoverable() {
        let err: anyhow::Error = anyhow::anyhow!("generic error");
        let is_unrecoverable = err
            .downcast_ref::<TaskError>()
            .map(|te| !te.is_recoverable())
            .unwrap_or(false);
        assert!(!is_unrecoverable);
    }
}
