//! Background task handlers and the dispatch context the worker calls
//! into.

mod consensus_refresh;
mod photo_transcode;

pub use consensus_refresh::ConsensusRefreshHandler;
pub use photo_transcode::PhotoTranscodeHandler;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use platewatch_core::models::{Task, TaskType};
use platewatch_core::TaskError;
use platewatch_worker::TaskHandlerContext;

/// Routes claimed tasks to their handlers. Held by the worker as a weak
/// reference; owned by whoever wires the service up.
pub struct DispatchContext {
    photo_transcode: PhotoTranscodeHandler,
    consensus_refresh: ConsensusRefreshHandler,
}

impl DispatchContext {
    pub fn new(
        photo_transcode: PhotoTranscodeHandler,
        consensus_refresh: ConsensusRefreshHandler,
    ) -> Self {
        Self {
            photo_transcode,
            consensus_refresh,
        }
    }
}

#[async_trait]
impl TaskHandlerContext for DispatchContext {
    async fn dispatch_task(self: Arc<Self>, task: &Task) -> Result<serde_json::Value> {
        match task.task_type {
            TaskType::PhotoTranscode => {
                // A payload that does not parse will never parse: fail now.
                let payload = task.try_payload_as().map_err(|e| {
                    anyhow::Error::new(TaskError::unrecoverable(anyhow::anyhow!(
                        "Invalid photo_transcode payload: {}",
                        e
                    )))
                })?;
                self.photo_transcode
                    .handle(payload)
                    .await
                    .map_err(anyhow::Error::new)
            }
            TaskType::ConsensusRefresh => {
                let payload = task.try_payload_as().map_err(|e| {
                    anyhow::Error::new(TaskError::unrecoverable(anyhow::anyhow!(
                        "Invalid consensus_refresh payload: {}",
                        e
                    )))
                })?;
                self.consensus_refresh
                    .handle(payload)
                    .await
                    .map_err(anyhow::Error::new)
            }
        }
    }
}
