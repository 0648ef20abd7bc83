//! Platewatch Storage Library
//!
//! Object storage abstraction for transcoded photos. The Storage trait
//! covers exactly what the photo pipeline needs: write to a known key,
//! read back, delete, existence check. Keys are forward-slash paths like
//! `vehicles/{plate}/image-{photo_id}.jpg`; they must not contain `..` or
//! a leading `/`.

pub mod factory;
pub mod local;
pub mod s3;
pub mod traits;

pub use factory::create_storage;
pub use local::LocalStorage;
pub use platewatch_core::StorageBackend;
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
