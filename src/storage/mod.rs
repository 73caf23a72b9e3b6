//! Storage: aligned cell buffers and the dense displaced grid.

pub mod aligned;
pub mod grid;

pub use aligned::AlignedVec;
pub use grid::Grid;
