//! Partitioning errors for grid-halo.

use thiserror::Error;

/// Errors from partition construction and region lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartitionError {
    /// Offset plus weights must account for every cell of the box.
    #[error("partition weights cover {found} cells but the simulation box holds {expected}")]
    WeightsDontCoverBox { expected: usize, found: usize },
    /// A region was requested for a node the partition does not define.
    #[error("node {node} out of range: partition defines {nodes} nodes")]
    NodeOutOfRange { node: usize, nodes: usize },
    /// Partitioning an empty simulation box is meaningless.
    #[error("cannot partition an empty box")]
    EmptyBox,
    /// At least one weight is required.
    #[error("partition needs at least one weight")]
    NoWeights,
}
