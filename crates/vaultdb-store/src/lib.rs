//! Canonical document/chunk metadata and snapshot persistence.

pub mod snapshot;
mod store;

pub use snapshot::{load, save, SnapshotMeta, SNAPSHOT_VERSION};
pub use store::DocumentStore;
