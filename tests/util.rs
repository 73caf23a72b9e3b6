//! Shared fixtures for the integration suites: reference kernels, their
//! initializers, a sequential reference evolver, and a fault-injecting
//! communicator.
#![allow(dead_code)]

use grid_halo::comm::communicator::{CommError, Communicator, ThreadComm};
use grid_halo::comm::wire::{self, PatchHeader, KIND_PATCH};
use grid_halo::prelude::*;

/// 1-D three-point heat diffusion.
#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct HeatCell(pub f64);

impl StencilCell<1> for HeatCell {
    fn topology() -> Topology<1> {
        Topology::cube()
    }

    fn update<H: Neighborhood<Self, 1>>(hood: &H, _nano_step: u32) -> Self {
        let left = hood.at(Coord::new([-1])).0;
        let center = hood.at(Coord::zero()).0;
        let right = hood.at(Coord::new([1])).0;
        HeatCell(0.25 * left + 0.5 * center + 0.25 * right)
    }
}

impl PatchWire for HeatCell {
    type Wire = f64;
    fn to_wire(&self) -> f64 {
        self.0
    }
    fn from_wire(wire: f64) -> Self {
        HeatCell(wire)
    }
}

/// Seeds a single hot cell at the left end of the line.
pub struct HeatInitializer {
    pub bounds: CoordBox<1>,
    pub steps: u64,
}

impl Initializer<HeatCell, 1> for HeatInitializer {
    fn grid_box(&self) -> CoordBox<1> {
        self.bounds
    }

    fn max_steps(&self) -> u64 {
        self.steps
    }

    fn populate(&self, grid: &mut Grid<HeatCell, 1>) {
        let bounds = *grid.bounding_box();
        for c in bounds.coords() {
            let value = if c == Coord::new([0]) { 1.0 } else { 0.0 };
            grid.set(c, HeatCell(value));
        }
        grid.set_edge_cell(HeatCell(0.0));
    }
}

/// Conway's life on a torus.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct LifeCell(pub bool);

impl StencilCell<2> for LifeCell {
    fn topology() -> Topology<2> {
        Topology::torus()
    }

    fn update<H: Neighborhood<Self, 2>>(hood: &H, _nano_step: u32) -> Self {
        let mut live_neighbors = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if hood.at(Coord::new([dx, dy])).0 {
                    live_neighbors += 1;
                }
            }
        }
        let alive = hood.at(Coord::zero()).0;
        LifeCell(live_neighbors == 3 || (alive && live_neighbors == 2))
    }
}

impl PatchWire for LifeCell {
    type Wire = u8;
    fn to_wire(&self) -> u8 {
        self.0 as u8
    }
    fn from_wire(wire: u8) -> Self {
        LifeCell(wire != 0)
    }
}

/// Seeds an explicit set of live cells.
pub struct LifeInitializer {
    pub bounds: CoordBox<2>,
    pub live: Vec<Coord<2>>,
    pub steps: u64,
}

impl Initializer<LifeCell, 2> for LifeInitializer {
    fn grid_box(&self) -> CoordBox<2> {
        self.bounds
    }

    fn max_steps(&self) -> u64 {
        self.steps
    }

    fn populate(&self, grid: &mut Grid<LifeCell, 2>) {
        let bounds = *grid.bounding_box();
        for c in bounds.coords() {
            grid.set(c, LifeCell(false));
        }
        for &c in &self.live {
            if bounds.contains(c) {
                grid.set(c, LifeCell(true));
            }
        }
        grid.set_edge_cell(LifeCell(false));
    }
}

/// The standard glider, offset by `(x, y)`.
pub fn glider(x: i32, y: i32) -> Vec<Coord<2>> {
    [[1, 0], [2, 1], [0, 2], [1, 2], [2, 2]]
        .into_iter()
        .map(|[dx, dy]| Coord::new([x + dx, y + dy]))
        .collect()
}

/// Single-process double-buffer reference: the ground truth the distributed
/// runs must match bit-for-bit.
pub fn evolve_reference<C: StencilCell<D> + PatchWire, const D: usize>(
    initializer: &dyn Initializer<C, D>,
    cell_steps: u64,
) -> Grid<C, D> {
    let bounds = initializer.grid_box();
    let mut current = Grid::new(bounds, bounds, C::topology(), C::default());
    initializer.populate(&mut current);
    let mut next = current.clone();
    let everything = Region::from_box(bounds);
    for _ in 0..cell_steps {
        for nano_step in 0..C::NANO_STEPS {
            update_region(&everything, &current, &mut next, nano_step);
            std::mem::swap(&mut current, &mut next);
        }
    }
    current
}

/// Wraps a [`ThreadComm`] and fails the patch send addressed to
/// `fail_to_peer` stamped with `fail_at_step`.
#[derive(Clone)]
pub struct FaultyComm {
    pub inner: ThreadComm,
    pub fail_to_peer: usize,
    pub fail_at_step: u64,
}

impl Communicator for FaultyComm {
    type SendHandle = <ThreadComm as Communicator>::SendHandle;
    type RecvHandle = <ThreadComm as Communicator>::RecvHandle;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Result<Self::SendHandle, CommError> {
        if peer == self.fail_to_peer && buf.len() >= std::mem::size_of::<PatchHeader>() {
            let header: PatchHeader =
                wire::read_unaligned(&buf[..std::mem::size_of::<PatchHeader>()]);
            if header.kind() == KIND_PATCH && header.step() == self.fail_at_step {
                return Err(CommError::SendFailed {
                    peer,
                    reason: "injected transport failure".into(),
                });
            }
        }
        self.inner.isend(peer, tag, buf)
    }

    fn irecv(&self, peer: usize, tag: u16, max_len: usize) -> Result<Self::RecvHandle, CommError> {
        self.inner.irecv(peer, tag, max_len)
    }

    fn rank(&self) -> usize {
        self.inner.rank()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }
}

/// Gather `(x, value)` pairs for a 1-D region of a grid.
pub fn collect_line<C: Clone, F: Fn(&C) -> f64>(
    grid: &Grid<C, 1>,
    region: &Region<1>,
    value: F,
) -> Vec<(i32, f64)> {
    region
        .coords()
        .map(|c| (c[0], value(grid.get(c))))
        .collect()
}
