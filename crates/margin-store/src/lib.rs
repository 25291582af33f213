//! # margin-store
//!
//! Persistence layer for margin: the filesystem notes backend and the
//! sidecar tag/pin store.

pub mod sidecar;
pub mod storage;

pub use sidecar::TagStore;
pub use storage::{FilesystemBackend, StorageBackend};
