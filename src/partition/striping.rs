//! Striping partition: contiguous spans of the row-major linearization.

use crate::geometry::coord::{Coord, CoordBox};
use crate::geometry::region::Region;
use crate::geometry::streak::Streak;
use crate::partition::{Partition, PartitionError};

/// Assigns node `i` the cells whose row-major linear index (x innermost) lies
/// in `[offset + w[0] + … + w[i-1], offset + w[0] + … + w[i])`.
///
/// The `offset` lets a striping cover only the tail of a box, which is how a
/// hierarchical decomposition hands a sub-range of cells to one cluster while
/// a sibling covers the head. Offset plus the weight sum must equal the box
/// size exactly.
#[derive(Clone, Debug)]
pub struct StripingPartition<const D: usize> {
    bounds: CoordBox<D>,
    weights: Vec<usize>,
    /// Prefix sums including the offset; `starts[i]..starts[i+1]` is node i's
    /// linear index span.
    starts: Vec<usize>,
}

impl<const D: usize> StripingPartition<D> {
    pub fn new(
        bounds: CoordBox<D>,
        offset: usize,
        weights: Vec<usize>,
    ) -> Result<Self, PartitionError> {
        if bounds.is_empty() {
            return Err(PartitionError::EmptyBox);
        }
        if weights.is_empty() {
            return Err(PartitionError::NoWeights);
        }
        let covered = offset + weights.iter().sum::<usize>();
        if covered != bounds.size() {
            return Err(PartitionError::WeightsDontCoverBox {
                expected: bounds.size(),
                found: covered,
            });
        }
        let mut starts = Vec::with_capacity(weights.len() + 1);
        let mut acc = offset;
        starts.push(acc);
        for &w in &weights {
            acc += w;
            starts.push(acc);
        }
        Ok(Self {
            bounds,
            weights,
            starts,
        })
    }

    /// Translate a linear index into the coordinate of its cell.
    fn coord_of(&self, mut linear: usize) -> Coord<D> {
        let mut c = self.bounds.origin;
        for axis in 0..D {
            let extent = self.bounds.dimensions[axis] as usize;
            c[axis] += (linear % extent) as i32;
            linear /= extent;
        }
        c
    }

    /// Build the streaks covering the linear index span `[from, to)`.
    fn span_region(&self, from: usize, to: usize) -> Region<D> {
        let row_len = self.bounds.dimensions[0] as usize;
        let x_origin = self.bounds.origin[0];
        let mut region = Region::new();
        let mut cursor = from;
        while cursor < to {
            let origin = self.coord_of(cursor);
            let x_offset = (origin[0] - x_origin) as usize;
            let run = (row_len - x_offset).min(to - cursor);
            region.insert(Streak::new(origin, origin.x() + run as i32));
            cursor += run;
        }
        region
    }
}

impl<const D: usize> Partition<D> for StripingPartition<D> {
    fn region(&self, node: usize) -> Result<Region<D>, PartitionError> {
        if node >= self.weights.len() {
            return Err(PartitionError::NodeOutOfRange {
                node,
                nodes: self.weights.len(),
            });
        }
        Ok(self.span_region(self.starts[node], self.starts[node + 1]))
    }

    fn weights(&self) -> &[usize] {
        &self.weights
    }
}
