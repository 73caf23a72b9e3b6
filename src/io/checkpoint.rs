//! Checkpoint snapshots: bit-exact persisted grid state.
//!
//! A snapshot is a header (global box, step, max steps, cell wire size)
//! followed by one block per region, each a length-prefixed streak list plus
//! the raw cell payload in canonical streak order. Everything is
//! little-endian fixed width; round-trips are bit-exact.

use crate::cell::PatchWire;
use crate::geometry::coord::{Coord, CoordBox};
use crate::geometry::region::Region;
use crate::geometry::streak::Streak;
use crate::sim_error::GridHaloError;
use crate::storage::grid::Grid;
use std::io::{Read, Write};

const MAGIC: u32 = 0x4748_414c; // "GHAL"
const FORMAT_VERSION: u16 = 1;

/// A decoded snapshot: one block of cells per persisted region.
#[derive(Debug)]
pub struct Snapshot<C, const D: usize> {
    pub global_box: CoordBox<D>,
    pub step: u64,
    pub max_steps: u64,
    pub blocks: Vec<(Region<D>, Vec<C>)>,
}

/// Persist `regions` of `grid` at `step`.
pub fn write_snapshot<C, const D: usize, W>(
    out: &mut W,
    grid: &Grid<C, D>,
    regions: &[Region<D>],
    step: u64,
    max_steps: u64,
) -> Result<(), GridHaloError>
where
    C: PatchWire + Clone,
    W: Write,
{
    out.write_all(&MAGIC.to_le_bytes())?;
    out.write_all(&FORMAT_VERSION.to_le_bytes())?;
    out.write_all(&(D as u16).to_le_bytes())?;
    write_box(out, grid.global_box())?;
    out.write_all(&step.to_le_bytes())?;
    out.write_all(&max_steps.to_le_bytes())?;
    out.write_all(&(std::mem::size_of::<C::Wire>() as u32).to_le_bytes())?;
    out.write_all(&(regions.len() as u32).to_le_bytes())?;

    for region in regions {
        out.write_all(&(region.num_streaks() as u32).to_le_bytes())?;
        for streak in region.streaks() {
            for axis in 0..D {
                out.write_all(&streak.origin[axis].to_le_bytes())?;
            }
            out.write_all(&streak.end_x.to_le_bytes())?;
        }
        out.write_all(&(region.size() as u64).to_le_bytes())?;
        for streak in region.streaks() {
            for cell in grid.streak(&streak) {
                out.write_all(bytemuck::bytes_of(&cell.to_wire()))?;
            }
        }
    }
    Ok(())
}

/// Decode a snapshot written by [`write_snapshot`] with the same cell type.
pub fn read_snapshot<C, const D: usize, R>(input: &mut R) -> Result<Snapshot<C, D>, GridHaloError>
where
    C: PatchWire + Clone,
    R: Read,
{
    if read_u32(input)? != MAGIC {
        return Err(GridHaloError::CheckpointCorrupt("bad magic".into()));
    }
    let version = read_u16(input)?;
    if version != FORMAT_VERSION {
        return Err(GridHaloError::CheckpointCorrupt(format!(
            "format version {version}, expected {FORMAT_VERSION}"
        )));
    }
    let dim = read_u16(input)? as usize;
    if dim != D {
        return Err(GridHaloError::CheckpointCorrupt(format!(
            "dimension {dim}, expected {D}"
        )));
    }
    let global_box = read_box::<D, R>(input)?;
    let step = read_u64(input)?;
    let max_steps = read_u64(input)?;
    let wire_size = read_u32(input)? as usize;
    if wire_size != std::mem::size_of::<C::Wire>() {
        return Err(GridHaloError::CheckpointCellFormat {
            expected: std::mem::size_of::<C::Wire>() as u32,
            got: wire_size as u32,
        });
    }
    let n_blocks = read_u32(input)? as usize;

    let mut blocks = Vec::with_capacity(n_blocks);
    for _ in 0..n_blocks {
        let n_streaks = read_u32(input)? as usize;
        let mut region = Region::new();
        for _ in 0..n_streaks {
            let mut origin = Coord::<D>::zero();
            for axis in 0..D {
                origin[axis] = read_i32(input)?;
            }
            let end_x = read_i32(input)?;
            if end_x <= origin.x() {
                return Err(GridHaloError::CheckpointCorrupt("empty streak".into()));
            }
            region.insert(Streak::new(origin, end_x));
        }
        let n_cells = read_u64(input)? as usize;
        if n_cells != region.size() {
            return Err(GridHaloError::CheckpointCorrupt(format!(
                "block claims {n_cells} cells but its streaks hold {}",
                region.size()
            )));
        }
        let mut payload = vec![0u8; n_cells * wire_size];
        input.read_exact(&mut payload)?;
        let cells = payload
            .chunks_exact(wire_size)
            .map(|chunk| C::from_wire(crate::comm::wire::read_unaligned(chunk)))
            .collect();
        blocks.push((region, cells));
    }
    Ok(Snapshot {
        global_box,
        step,
        max_steps,
        blocks,
    })
}

impl<C: Clone, const D: usize> Snapshot<C, D> {
    /// Scatter every block into `grid`.
    pub fn apply_to(&self, grid: &mut Grid<C, D>) {
        for (region, cells) in &self.blocks {
            let mut cursor = 0usize;
            for streak in region.streaks() {
                let next = cursor + streak.length();
                grid.write_streak(&streak, &cells[cursor..next]);
                cursor = next;
            }
        }
    }
}

fn write_box<W: Write, const D: usize>(
    out: &mut W,
    bounds: &CoordBox<D>,
) -> Result<(), GridHaloError> {
    for axis in 0..D {
        out.write_all(&bounds.origin[axis].to_le_bytes())?;
    }
    for axis in 0..D {
        out.write_all(&bounds.dimensions[axis].to_le_bytes())?;
    }
    Ok(())
}

fn read_box<const D: usize, R: Read>(input: &mut R) -> Result<CoordBox<D>, GridHaloError> {
    let mut origin = Coord::<D>::zero();
    let mut dimensions = Coord::<D>::zero();
    for axis in 0..D {
        origin[axis] = read_i32(input)?;
    }
    for axis in 0..D {
        dimensions[axis] = read_i32(input)?;
    }
    Ok(CoordBox::new(origin, dimensions))
}

fn read_u16<R: Read>(input: &mut R) -> Result<u16, GridHaloError> {
    let mut buf = [0u8; 2];
    input.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(input: &mut R) -> Result<u32, GridHaloError> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i32<R: Read>(input: &mut R) -> Result<i32, GridHaloError> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_u64<R: Read>(input: &mut R) -> Result<u64, GridHaloError> {
    let mut buf = [0u8; 8];
    input.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}
