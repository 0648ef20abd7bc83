//! Periodic schedules: the consensus run and the photo cleanup sweep.
//!
//! Two independent interval loops with independent failure domains. Each
//! `start` spawns a detached task and returns its JoinHandle for
//! shutdown coordination.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;

use platewatch_db::PhotoRepository;

use crate::consensus_engine::ConsensusEngine;

pub struct ConsensusScheduler {
    engine: Arc<ConsensusEngine>,
    interval_secs: u64,
}

impl ConsensusScheduler {
    pub fn new(engine: Arc<ConsensusEngine>, interval_secs: u64) -> Self {
        Self {
            engine,
            interval_secs,
        }
    }

    /// Start the periodic consensus run (hourly by default).
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = interval(Duration::from_secs(self.interval_secs));
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tick.tick().await;

                tracing::info!("Starting scheduled consensus run");

                match self.engine.run_all().await {
                    Ok(processed) => {
                        tracing::info!(processed, "Scheduled consensus run finished");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Scheduled consensus run failed");
                    }
                }
            }
        })
    }
}

pub struct PhotoCleanupService {
    photos: PhotoRepository,
    interval_secs: u64,
    retention_hours: i64,
}

impl PhotoCleanupService {
    pub fn new(photos: PhotoRepository, interval_secs: u64, retention_hours: i64) -> Self {
        Self {
            photos,
            interval_secs,
            retention_hours,
        }
    }

    /// Start the cleanup sweep (daily by default): delete photos that
    /// never got a url and sat in pending/failed past the retention
    /// window.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = interval(Duration::from_secs(self.interval_secs));
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tick.tick().await;

                if let Err(e) = self.run_once().await {
                    tracing::error!(error = %e, "Photo cleanup sweep failed");
                }
            }
        })
    }

    pub async fn run_once(&self) -> Result<u64, platewatch_core::AppError> {
        let cutoff = Utc::now() - chrono::Duration::hours(self.retention_hours);
        let deleted = self.photos.delete_abandoned(cutoff).await?;

        tracing::info!(deleted, "Deleted abandoned photos");

        Ok(deleted)
    }
}
