//! Data models for the application
//!
//! One sub-module per domain entity. Everything is re-exported here for
//! convenient imports.

mod photo;
mod submission;
mod task;
mod vehicle;

pub use photo::*;
pub use submission::*;
pub use task::*;
pub use vehicle::*;
