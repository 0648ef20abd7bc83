//! Consensus refresh handler: the fire-and-forget recompute triggered by
//! a new submission. Duplicate delivery is harmless; the engine is a
//! pure recompute over current store state.

use std::sync::Arc;

use serde_json::json;

use platewatch_core::models::ConsensusRefreshPayload;
use platewatch_core::TaskError;

use crate::consensus_engine::ConsensusEngine;

pub struct ConsensusRefreshHandler {
    engine: Arc<ConsensusEngine>,
}

impl ConsensusRefreshHandler {
    pub fn new(engine: Arc<ConsensusEngine>) -> Self {
        Self { engine }
    }

    #[tracing::instrument(skip(self, payload), fields(plate = %payload.plate))]
    pub async fn handle(
        &self,
        payload: ConsensusRefreshPayload,
    ) -> Result<serde_json::Value, TaskError> {
        let materialized = self
            .engine
            .refresh_plate(&payload.plate)
            .await
            .map_err(|e| {
                if e.is_recoverable() {
                    TaskError::recoverable(e)
                } else {
                    TaskError::unrecoverable(e)
                }
            })?;

        Ok(json!({
            "plate": payload.plate,
            "materialized": materialized,
        }))
    }
}
