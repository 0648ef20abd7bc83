//! Database repositories for the data access layer
//!
//! One repository per domain entity, each owning its CRUD operations and
//! specialized queries against PostgreSQL. Upserts are single conditional
//! writes keyed by the entity's natural unique key, which is the only
//! write-contention guarantee the rest of the system relies on.

pub mod db;

pub use db::{PhotoRepository, SubmissionRepository, TaskRepository, VehicleRepository};
