//! Domain partitions: maps from node index to owned region.
//!
//! A [`Partition`] derives, from a simulation box and per-node weights, the
//! region each node owns. The partition manager only relies on this contract,
//! so decomposition schemes are pluggable; two schemes ship with the crate:
//!
//! - [`StripingPartition`]: contiguous spans of the row-major linearization,
//!   producing full rows plus partial prefix/suffix rows.
//! - [`RecursiveBisectionPartition`]: recursive splits along the longest axis,
//!   dividing the weight sum as evenly as possible at each level.

pub mod error;
pub mod recursive_bisection;
pub mod striping;

pub use error::PartitionError;
pub use recursive_bisection::RecursiveBisectionPartition;
pub use striping::StripingPartition;

use crate::geometry::adjacency::Adjacency;
use crate::geometry::region::Region;

/// Map from node index to owned region, plus the weights it was derived from.
pub trait Partition<const D: usize>: Send + Sync {
    /// The region node `node` owns.
    fn region(&self, node: usize) -> Result<Region<D>, PartitionError>;

    /// Per-node weights, one entry per node.
    fn weights(&self) -> &[usize];

    /// Explicit adjacency for unstructured decompositions; lattice partitions
    /// have none.
    fn adjacency(&self) -> Option<&Adjacency> {
        None
    }

    fn num_nodes(&self) -> usize {
        self.weights().len()
    }
}
