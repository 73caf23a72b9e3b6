//! The initializer contract: simulation extent, step range, initial values.

use crate::geometry::coord::CoordBox;
use crate::storage::grid::Grid;

/// Describes a simulation run and seeds its grids.
///
/// `populate` must fill the target grid's *entire* bounding box (owned cells
/// and halo alike) with the state at `start_step`, and may set the edge cell.
/// Every rank's stepper calls it once against its own displaced grid.
pub trait Initializer<C, const D: usize>: Send + Sync {
    /// The global simulation box.
    fn grid_box(&self) -> CoordBox<D>;

    /// First cell step of the run.
    fn start_step(&self) -> u64 {
        0
    }

    /// Cell step at which the run completes.
    fn max_steps(&self) -> u64;

    /// Fill `grid`'s bounding box with initial values.
    fn populate(&self, grid: &mut Grid<C, D>);
}
