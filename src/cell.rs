//! The cell contract: what the stepper needs to know about a user cell type.
//!
//! A cell advertises a small capability set — topology, stencil radius,
//! nano-steps per cell step, whether it carries a vectorized streak update —
//! which the stepper reads once at construction. The update itself sees the
//! source grid only through a [`Neighborhood`], so kernels stay independent of
//! grid layout and decomposition.

use crate::geometry::coord::Coord;
use crate::geometry::topology::Topology;
use crate::storage::grid::Grid;

/// Capability set read once by the stepper.
#[derive(Copy, Clone, Debug)]
pub struct CellCaps<const D: usize> {
    pub topology: Topology<D>,
    pub stencil_radius: u32,
    pub nano_steps: u32,
    pub has_streak_update: bool,
}

/// Read-only access to a cell's surroundings, addressed relative to the cell
/// being updated.
pub trait Neighborhood<C, const D: usize> {
    fn at(&self, relative: Coord<D>) -> &C;
}

/// Neighborhood centered on one grid cell.
pub struct GridHood<'a, C, const D: usize> {
    grid: &'a Grid<C, D>,
    center: Coord<D>,
}

impl<'a, C: Clone, const D: usize> GridHood<'a, C, D> {
    #[inline]
    pub fn new(grid: &'a Grid<C, D>, center: Coord<D>) -> Self {
        Self { grid, center }
    }
}

impl<C: Clone, const D: usize> Neighborhood<C, D> for GridHood<'_, C, D> {
    #[inline]
    fn at(&self, relative: Coord<D>) -> &C {
        self.grid.get(self.center + relative)
    }
}

/// Neighborhood for a whole streak of target cells; `cell_hood(i)` centers on
/// the i-th cell of the run.
pub struct RowHood<'a, C, const D: usize> {
    grid: &'a Grid<C, D>,
    base: Coord<D>,
}

impl<'a, C: Clone, const D: usize> RowHood<'a, C, D> {
    #[inline]
    pub fn new(grid: &'a Grid<C, D>, base: Coord<D>) -> Self {
        Self { grid, base }
    }

    #[inline]
    pub fn cell_hood(&self, offset: usize) -> GridHood<'a, C, D> {
        let mut center = self.base;
        center[0] += offset as i32;
        GridHood::new(self.grid, center)
    }

    /// Neighbor of the i-th target cell.
    #[inline]
    pub fn at(&self, offset: usize, relative: Coord<D>) -> &C {
        let mut center = self.base;
        center[0] += offset as i32;
        self.grid.get(center + relative)
    }
}

/// A stencil cell: one site of the grid plus its update rule.
pub trait StencilCell<const D: usize>: Clone + Default + Send + Sync + 'static {
    /// Nano-steps per user-visible cell step.
    const NANO_STEPS: u32 = 1;
    /// Chebyshev radius of the update's dependency set.
    const STENCIL_RADIUS: u32 = 1;
    /// True when `update_streak` is specialized; the stepper prefers the
    /// streak path either way, but the flag surfaces in [`CellCaps`].
    const HAS_STREAK_UPDATE: bool = false;

    fn topology() -> Topology<D>;

    fn caps() -> CellCaps<D> {
        CellCaps {
            topology: Self::topology(),
            stencil_radius: Self::STENCIL_RADIUS,
            nano_steps: Self::NANO_STEPS,
            has_streak_update: Self::HAS_STREAK_UPDATE,
        }
    }

    /// Compute this cell's next state from its neighborhood.
    fn update<H: Neighborhood<Self, D>>(hood: &H, nano_step: u32) -> Self;

    /// Update a whole streak of cells at once. The default forwards to the
    /// scalar rule cell by cell; cells that vectorize override this and set
    /// [`HAS_STREAK_UPDATE`](Self::HAS_STREAK_UPDATE).
    fn update_streak(row: &RowHood<'_, Self, D>, out: &mut [Self], nano_step: u32) {
        for (offset, cell) in out.iter_mut().enumerate() {
            *cell = Self::update(&row.cell_hood(offset), nano_step);
        }
    }
}

/// Fixed-layout wire twin of a cell, for patch payloads and checkpoints.
///
/// The twin must be `bytemuck::Pod`; conversion is infallible both ways and
/// bit-exact round-trip is part of the contract.
pub trait PatchWire: Sized {
    type Wire: bytemuck::Pod;
    fn to_wire(&self) -> Self::Wire;
    fn from_wire(wire: Self::Wire) -> Self;
}

macro_rules! identity_wire {
    ($($t:ty),*) => {
        $(impl PatchWire for $t {
            type Wire = $t;
            #[inline]
            fn to_wire(&self) -> $t {
                *self
            }
            #[inline]
            fn from_wire(wire: $t) -> $t {
                wire
            }
        })*
    };
}

identity_wire!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);
