//! Platewatch Infrastructure Library
//!
//! Cross-cutting concerns with no domain logic of their own: tracing
//! initialization and the best-effort Redis read-through cache.

pub mod cache;
pub mod telemetry;

pub use cache::{keys as cache_keys, Cache};
pub use telemetry::init_telemetry;
