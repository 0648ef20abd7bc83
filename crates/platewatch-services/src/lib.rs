//! Platewatch Services Library
//!
//! The orchestration layer: submission ingestion with photo job
//! coordination, consensus materialization, the periodic runner and
//! cleanup schedules, and the background task handlers. The serving
//! layer calls into these services; they own all writes.

pub mod consensus_engine;
pub mod ingestion;
pub mod materializer;
pub mod processing;
pub mod scheduler;
pub mod task_handlers;
pub mod vehicles;

pub use consensus_engine::ConsensusEngine;
pub use ingestion::{SubmissionService, UploadedImage};
pub use materializer::{resolve_vehicle_record, Materializer};
pub use scheduler::{ConsensusScheduler, PhotoCleanupService};
pub use task_handlers::DispatchContext;
pub use vehicles::VehicleReadService;
