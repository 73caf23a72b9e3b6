//! Persistence: snapshot checkpoints.

pub mod checkpoint;

pub use checkpoint::{read_snapshot, write_snapshot, Snapshot};
