//! Dense grid storage with an edge cell.
//!
//! A [`Grid`] owns the cells of one axis-aligned box — usually a node's
//! expanded owned region — addressed by *global* coordinates. Accesses outside
//! the simulation space resolve through the topology: wrapped axes fold back
//! in, unwrapped axes read or write the edge cell. Whole-streak reads and
//! writes are the hot-path I/O primitives; per-cell access pays the
//! normalization cost on every call.

use crate::geometry::coord::{Coord, CoordBox};
use crate::geometry::region::Region;
use crate::geometry::streak::Streak;
use crate::geometry::topology::Topology;
use crate::storage::aligned::AlignedVec;

#[derive(Clone)]
pub struct Grid<C, const D: usize> {
    bounds: CoordBox<D>,
    global_box: CoordBox<D>,
    topology: Topology<D>,
    cells: AlignedVec<C>,
    edge_cell: C,
}

impl<C: Clone, const D: usize> Grid<C, D> {
    /// Allocate a grid over `bounds`, every cell a clone of `default_cell`.
    /// `global_box` is the simulation space the topology folds into.
    pub fn new(
        bounds: CoordBox<D>,
        global_box: CoordBox<D>,
        topology: Topology<D>,
        default_cell: C,
    ) -> Self {
        Self {
            bounds,
            global_box,
            topology,
            cells: AlignedVec::filled(bounds.size(), default_cell.clone()),
            edge_cell: default_cell,
        }
    }

    #[inline]
    pub fn bounding_box(&self) -> &CoordBox<D> {
        &self.bounds
    }

    #[inline]
    pub fn global_box(&self) -> &CoordBox<D> {
        &self.global_box
    }

    #[inline]
    pub fn global_dimensions(&self) -> Coord<D> {
        self.global_box.dimensions
    }

    #[inline]
    pub fn topology(&self) -> Topology<D> {
        self.topology
    }

    #[inline]
    pub fn edge_cell(&self) -> &C {
        &self.edge_cell
    }

    pub fn set_edge_cell(&mut self, cell: C) {
        self.edge_cell = cell;
    }

    /// Flat offset of an in-bounds coordinate; row-major, x innermost.
    #[inline]
    fn flat_index(&self, coord: Coord<D>) -> usize {
        debug_assert!(self.bounds.contains(coord), "coordinate outside grid bounds");
        let mut index = 0usize;
        for axis in (0..D).rev() {
            index = index * self.bounds.dimensions[axis] as usize
                + (coord[axis] - self.bounds.origin[axis]) as usize;
        }
        index
    }

    /// Read a cell. Out-of-simulation accesses on unwrapped axes yield the
    /// edge cell; wrapped axes fold back into the simulation box.
    pub fn get(&self, coord: Coord<D>) -> &C {
        match self.topology.normalize(coord, &self.global_box) {
            None => &self.edge_cell,
            Some(folded) => {
                if self.bounds.contains(folded) {
                    &self.cells[self.flat_index(folded)]
                } else {
                    debug_assert!(false, "read at {folded} outside the allocated halo");
                    &self.edge_cell
                }
            }
        }
    }

    /// Write a cell; an out-of-simulation write on an unwrapped axis replaces
    /// the edge cell.
    pub fn set(&mut self, coord: Coord<D>, cell: C) {
        match self.topology.normalize(coord, &self.global_box) {
            None => self.edge_cell = cell,
            Some(folded) => {
                if self.bounds.contains(folded) {
                    let index = self.flat_index(folded);
                    self.cells[index] = cell;
                } else {
                    debug_assert!(false, "write at {folded} outside the allocated halo");
                }
            }
        }
    }

    fn streak_range(&self, streak: &Streak<D>) -> std::ops::Range<usize> {
        debug_assert!(
            self.bounds.contains(streak.origin),
            "streak {streak:?} starts outside grid bounds"
        );
        let start = self.flat_index(streak.origin);
        start..start + streak.length()
    }

    /// Borrow a whole streak of cells; the streak must lie inside the grid's
    /// bounds.
    #[inline]
    pub fn streak(&self, streak: &Streak<D>) -> &[C] {
        &self.cells[self.streak_range(streak)]
    }

    #[inline]
    pub fn streak_mut(&mut self, streak: &Streak<D>) -> &mut [C] {
        let range = self.streak_range(streak);
        &mut self.cells[range]
    }

    /// Copy a streak's cells out of the grid.
    pub fn read_streak(&self, streak: &Streak<D>, out: &mut [C]) {
        out.clone_from_slice(self.streak(streak));
    }

    /// Copy cells into a streak of the grid.
    pub fn write_streak(&mut self, streak: &Streak<D>, cells: &[C]) {
        self.streak_mut(streak).clone_from_slice(cells);
    }

    /// Copy every cell of `region` from `src`. Both grids must cover the
    /// region.
    pub fn paste_region_from(&mut self, src: &Grid<C, D>, region: &Region<D>) {
        for streak in region.streaks() {
            self.write_streak(&streak, src.streak(&streak));
        }
    }

    /// Reallocate for new bounds. The old buffer is dropped before the new
    /// one is allocated so both never coexist; cells reset to the edge cell.
    pub fn resize(&mut self, bounds: CoordBox<D>) {
        self.cells = AlignedVec::new();
        self.bounds = bounds;
        self.cells = AlignedVec::filled(bounds.size(), self.edge_cell.clone());
    }
}
