//! Platewatch Worker Library
//!
//! Durable background task queue: a Postgres-backed worker pool with
//! LISTEN/NOTIFY wakeup, polling fallback, per-task timeout, and
//! at-least-once delivery with exponential backoff retries.

pub mod context;
pub mod queue;

pub use context::{empty_context_weak, TaskHandlerContext};
pub use queue::{TaskQueue, TaskQueueConfig};
