//! # grid-halo
//!
//! grid-halo is a modular Rust library for distributed stencil simulation:
//! it decomposes a regular N-dimensional cellular grid across cooperating
//! processes, exchanges only the minimal boundary data between neighbors, and
//! overlaps communication with computation while staying bit-identical to a
//! sequential reference run.
//!
//! ## Features
//! - Canonical region algebra (streak sets) for describing arbitrary grid
//!   subsets and the set operations decomposition relies on
//! - Weighted striping and recursive-bisection partitions behind one
//!   `Partition` contract
//! - A partition manager deriving rims, inner sets and per-peer ghost-zone
//!   fragments for any ghost zone width
//! - A nano-step stepper that advances `G` steps between halo syncs and
//!   pipelines the ghost replay ahead of the kernel
//! - Patch links over a pluggable `Communicator` (serial and threaded
//!   backends included; MPI plugs in through the same trait)
//! - Bit-exact checkpoint snapshots
//!
//! ## Usage
//! Add `grid-halo` as a dependency in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! grid-halo = "0.2"
//! # Optional features:
//! # features = ["rayon", "check-invariants"]
//! ```
//!
//! A simulation couples a [`cell::StencilCell`] (the update rule and its
//! capability set), an [`initializer::Initializer`] (extent, step range,
//! initial values) and a [`partition::Partition`] into an
//! [`update_group::UpdateGroup`] per rank; `run()` drives the subdomain to
//! the final step.

pub mod cell;
pub mod comm;
pub mod geometry;
pub mod initializer;
pub mod io;
pub mod partition;
pub mod patch;
pub mod sim_error;
pub mod stepper;
pub mod storage;
pub mod update_group;

pub use sim_error::GridHaloError;

/// A convenient prelude importing the most-used traits and types.
pub mod prelude {
    pub use crate::cell::{CellCaps, GridHood, Neighborhood, PatchWire, RowHood, StencilCell};
    pub use crate::comm::{CommTag, Communicator, NoComm, PollWait, ThreadComm, Wait};
    pub use crate::geometry::{
        Adjacency, Coord, CoordBox, PartitionManager, PeerId, Region, Streak, Topology,
    };
    pub use crate::initializer::Initializer;
    pub use crate::io::{read_snapshot, write_snapshot, Snapshot};
    pub use crate::partition::{
        Partition, PartitionError, RecursiveBisectionPartition, StripingPartition,
    };
    pub use crate::patch::{
        PatchAccepter, PatchBuffer, PatchLinkAccepter, PatchLinkProvider, PatchProvider,
        PatchType, SimEvent, Writer, WriterAdapter, ENDLESS,
    };
    pub use crate::sim_error::GridHaloError;
    pub use crate::stepper::{update_region, Stepper, VanillaStepper};
    pub use crate::storage::Grid;
    pub use crate::update_group::UpdateGroup;
}
