//! Fixed, versioned, little-endian wire types for patch exchange.
//!
//! All multi-byte integers are stored pre-LE with `.to_le()` and decoded with
//! `from_le`. Structs are `#[repr(C)]` and `bytemuck::Pod`-safe; payloads are
//! decoded with unaligned reads so receive buffers need no particular
//! alignment.

use bytemuck::{Pod, Zeroable};

use crate::geometry::coord::{Coord, CoordBox};

/// Bump when the layout or semantics change in incompatible ways.
pub const WIRE_VERSION: u16 = 1;

/// Message kinds carried in [`PatchHeader::kind_le`].
pub const KIND_PATCH: u16 = 1;
/// A peer tore down after a fatal error; receivers fail fast instead of
/// waiting for data that will never come.
pub const KIND_ABORT: u16 = 2;

/// Header preceding every patch payload.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct PatchHeader {
    pub version_le: u16,
    pub kind_le: u16,
    pub rank_le: u32,
    pub step_le: u64,
    pub fingerprint_le: u64,
    pub n_cells_le: u32,
    pub reserved_le: u32, // future use; keep zero
}

impl PatchHeader {
    pub fn new_patch(rank: usize, step: u64, fingerprint: u64, n_cells: usize) -> Self {
        Self {
            version_le: WIRE_VERSION.to_le(),
            kind_le: KIND_PATCH.to_le(),
            rank_le: (rank as u32).to_le(),
            step_le: step.to_le(),
            fingerprint_le: fingerprint.to_le(),
            n_cells_le: (n_cells as u32).to_le(),
            reserved_le: 0,
        }
    }

    pub fn new_abort(rank: usize, step: u64) -> Self {
        Self {
            version_le: WIRE_VERSION.to_le(),
            kind_le: KIND_ABORT.to_le(),
            rank_le: (rank as u32).to_le(),
            step_le: step.to_le(),
            fingerprint_le: 0,
            n_cells_le: 0,
            reserved_le: 0,
        }
    }

    #[inline]
    pub fn version(&self) -> u16 {
        u16::from_le(self.version_le)
    }

    #[inline]
    pub fn kind(&self) -> u16 {
        u16::from_le(self.kind_le)
    }

    #[inline]
    pub fn rank(&self) -> usize {
        u32::from_le(self.rank_le) as usize
    }

    #[inline]
    pub fn step(&self) -> u64 {
        u64::from_le(self.step_le)
    }

    #[inline]
    pub fn fingerprint(&self) -> u64 {
        u64::from_le(self.fingerprint_le)
    }

    #[inline]
    pub fn n_cells(&self) -> usize {
        u32::from_le(self.n_cells_le) as usize
    }
}

/// On-wire coordinate box for the bounding-box all-gather.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct WireCoordBox<const D: usize> {
    pub origin_le: [i32; D],
    pub extents_le: [i32; D],
}

// SAFETY: two i32 arrays back to back, #[repr(C)], no padding for any D
unsafe impl<const D: usize> Zeroable for WireCoordBox<D> {}
unsafe impl<const D: usize> Pod for WireCoordBox<D> {}

impl<const D: usize> WireCoordBox<D> {
    pub fn encode(bounds: &CoordBox<D>) -> Self {
        let mut origin_le = [0i32; D];
        let mut extents_le = [0i32; D];
        for axis in 0..D {
            origin_le[axis] = bounds.origin[axis].to_le();
            extents_le[axis] = bounds.dimensions[axis].to_le();
        }
        Self {
            origin_le,
            extents_le,
        }
    }

    pub fn decode(&self) -> CoordBox<D> {
        let mut origin = Coord::zero();
        let mut dimensions = Coord::zero();
        for axis in 0..D {
            origin[axis] = i32::from_le(self.origin_le[axis]);
            dimensions[axis] = i32::from_le(self.extents_le[axis]);
        }
        CoordBox::new(origin, dimensions)
    }
}

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

/// Decode a Pod value from a possibly unaligned byte slice.
pub fn read_unaligned<T: Pod>(bytes: &[u8]) -> T {
    bytemuck::pod_read_unaligned(bytes)
}
