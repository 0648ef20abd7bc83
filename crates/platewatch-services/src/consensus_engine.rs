//! Consensus engine: the per-plate refresh unit and the full periodic run.
//!
//! The cached active-submission list only enumerates plates worth
//! revisiting; the vote source for every plate is always a fresh fetch
//! from the durable store. A stale or missing cache changes latency,
//! never the outcome.

use std::collections::BTreeSet;

use platewatch_consensus::compute_consensus;
use platewatch_core::models::Submission;
use platewatch_core::AppError;
use platewatch_db::SubmissionRepository;
use platewatch_infra::{cache_keys, Cache};

use crate::materializer::Materializer;

/// TTL for the cached working set and per-plate submission lists.
const SUBMISSIONS_CACHE_TTL_SECS: u64 = 3600;

#[derive(Clone)]
pub struct ConsensusEngine {
    submissions: SubmissionRepository,
    materializer: Materializer,
    cache: Cache,
}

impl ConsensusEngine {
    pub fn new(
        submissions: SubmissionRepository,
        materializer: Materializer,
        cache: Cache,
    ) -> Self {
        Self {
            submissions,
            materializer,
            cache,
        }
    }

    /// Recompute and materialize consensus for one plate.
    ///
    /// Returns `false` when the plate has no active submissions left and
    /// was skipped. Safe to call concurrently and repeatedly: the
    /// computation is a pure function of current store state.
    #[tracing::instrument(skip(self), fields(plate = %plate))]
    pub async fn refresh_plate(&self, plate: &str) -> Result<bool, AppError> {
        let submissions = self.submissions.list_active_by_plate(plate).await?;

        // Re-prime the per-plate read cache for the serving layer.
        self.cache
            .set(
                &cache_keys::submissions_by_plate(plate),
                &submissions,
                SUBMISSIONS_CACHE_TTL_SECS,
            )
            .await;

        let Some(consensus) = compute_consensus(&submissions) else {
            tracing::debug!(plate = %plate, "No active submissions, skipping");
            return Ok(false);
        };

        self.materializer
            .materialize(plate, &consensus, &submissions)
            .await?;

        Ok(true)
    }

    /// One full consensus pass over every plate with active submissions.
    ///
    /// Failure isolation is per plate: one bad record is logged and the
    /// batch continues. Returns the number of plates materialized.
    pub async fn run_all(&self) -> Result<usize, AppError> {
        let working_set = self.load_working_set().await?;

        let plates: BTreeSet<String> =
            working_set.into_iter().map(|s| s.plate).collect();
        let total = plates.len();

        let mut processed = 0usize;
        for plate in plates {
            match self.refresh_plate(&plate).await {
                Ok(true) => processed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        plate = %plate,
                        "Plate materialization failed, continuing run"
                    );
                }
            }
        }

        tracing::info!(
            plates = total,
            processed = processed,
            "Consensus run completed"
        );

        Ok(processed)
    }

    /// Active-submission working set with refresh-on-miss caching.
    async fn load_working_set(&self) -> Result<Vec<Submission>, AppError> {
        if let Some(cached) = self
            .cache
            .get::<Vec<Submission>>(cache_keys::ACTIVE_SUBMISSIONS)
            .await
        {
            return Ok(cached);
        }

        let submissions = self.submissions.list_active().await?;
        self.cache
            .set(
                cache_keys::ACTIVE_SUBMISSIONS,
                &submissions,
                SUBMISSIONS_CACHE_TTL_SECS,
            )
            .await;

        Ok(submissions)
    }
}
