//! Storage layer.
//!
//! The domain works against two collaborator traits: a per-record document
//! store used when a user session exists, and a wholesale snapshot store for
//! the anonymous local mode. Both have file-backed implementations so the
//! service runs self-contained; swapping in a hosted document database means
//! implementing [`traits::DocumentStore`] against it.

pub mod document;
pub mod local;
pub mod traits;

pub use document::FileDocumentStore;
#[cfg(test)]
pub use document::MemoryDocumentStore;
pub use local::FileSnapshotStore;
pub use traits::{DocumentStore, SnapshotStore};
