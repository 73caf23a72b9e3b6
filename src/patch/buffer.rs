//! `PatchBuffer`: an in-memory FIFO of patches for one fixed region.
//!
//! The stepper uses two of these to interleave the ghost replay with the
//! kernel: the rim buffer carries the rim across syncs, and the kernel buffer
//! shields the volatile kernel from being clobbered by the replay. The same
//! type serves as a plain accepter/provider pair for tests and for replaying
//! saved state.

use crate::geometry::coord::Coord;
use crate::geometry::region::Region;
use crate::patch::{gather_region, scatter_region, NanoStepCalendar, PatchAccepter, PatchProvider};
use crate::sim_error::GridHaloError;
use crate::storage::grid::Grid;
use std::collections::VecDeque;

pub struct PatchBuffer<C, const D: usize> {
    region: Region<D>,
    stored: VecDeque<(u64, Vec<C>)>,
    calendar: NanoStepCalendar,
}

impl<C: Clone, const D: usize> PatchBuffer<C, D> {
    pub fn new(region: Region<D>) -> Self {
        Self {
            region,
            stored: VecDeque::new(),
            calendar: NanoStepCalendar::new(),
        }
    }

    pub fn region(&self) -> &Region<D> {
        &self.region
    }

    pub fn len(&self) -> usize {
        self.stored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stored.is_empty()
    }

    /// Snapshot the region out of `grid`, tagged with `nano_step`.
    pub fn save(&mut self, grid: &Grid<C, D>, nano_step: u64) {
        self.stored.push_back((nano_step, gather_region(grid, &self.region)));
    }

    /// Write the oldest stored patch back into `grid`; pop it if `remove`.
    pub fn restore_into(&mut self, grid: &mut Grid<C, D>, remove: bool) -> Result<(), GridHaloError> {
        let (_, cells) = self
            .stored
            .front()
            .ok_or(GridHaloError::PatchBufferMiss { requested: 0 })?;
        scatter_region(grid, &self.region, cells);
        if remove {
            self.stored.pop_front();
        }
        Ok(())
    }

    /// Nano step of the oldest stored patch.
    pub fn oldest_stored_nano_step(&self) -> Option<u64> {
        self.stored.front().map(|(step, _)| *step)
    }

    pub fn charge(&mut self, first: u64, last: u64, stride: u64) {
        self.calendar.charge(first, last, stride);
    }
}

impl<C: Clone + Send, const D: usize> PatchAccepter<C, D> for PatchBuffer<C, D> {
    fn next_required_nano_step(&self) -> Option<u64> {
        self.calendar.next()
    }

    fn push_request(&mut self, nano_step: u64) -> Result<(), GridHaloError> {
        self.calendar.push_request(nano_step)
    }

    fn put(
        &mut self,
        grid: &Grid<C, D>,
        valid_region: &Region<D>,
        _global_dimensions: Coord<D>,
        nano_step: u64,
    ) -> Result<(), GridHaloError> {
        if !self.calendar.is_due(nano_step) {
            return Ok(());
        }
        debug_assert_eq!(
            (&self.region - valid_region).size(),
            0,
            "patch region escapes the valid region"
        );
        self.save(grid, nano_step);
        self.calendar.advance(nano_step);
        Ok(())
    }
}

impl<C: Clone + Send, const D: usize> PatchProvider<C, D> for PatchBuffer<C, D> {
    fn next_available_nano_step(&self) -> Option<u64> {
        self.oldest_stored_nano_step()
    }

    fn get(
        &mut self,
        grid: &mut Grid<C, D>,
        _valid_region: &Region<D>,
        _global_dimensions: Coord<D>,
        nano_step: u64,
        _wait: bool,
    ) -> Result<(), GridHaloError> {
        match self.stored.front() {
            Some((stored_step, _)) if *stored_step == nano_step => {}
            _ => return Err(GridHaloError::PatchBufferMiss { requested: nano_step }),
        }
        self.restore_into(grid, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::coord::CoordBox;
    use crate::geometry::topology::Topology;

    fn grid_with(values: &[i32]) -> Grid<i32, 1> {
        let bounds = CoordBox::new(Coord::new([0]), Coord::new([values.len() as i32]));
        let mut g = Grid::new(bounds, bounds, Topology::cube(), 0);
        for (x, &v) in values.iter().enumerate() {
            g.set(Coord::new([x as i32]), v);
        }
        g
    }

    #[test]
    fn save_restore_is_fifo() {
        let region = Region::from_box(CoordBox::new(Coord::new([1]), Coord::new([2])));
        let mut buffer = PatchBuffer::new(region);
        let g1 = grid_with(&[0, 1, 2, 0]);
        let g2 = grid_with(&[0, 5, 6, 0]);
        buffer.save(&g1, 10);
        buffer.save(&g2, 20);

        let mut target = grid_with(&[9, 9, 9, 9]);
        buffer.restore_into(&mut target, false).unwrap();
        assert_eq!(*target.get(Coord::new([1])), 1, "peek restores the oldest");
        buffer.restore_into(&mut target, true).unwrap();
        assert_eq!(buffer.oldest_stored_nano_step(), Some(20));
        buffer.restore_into(&mut target, true).unwrap();
        assert_eq!(*target.get(Coord::new([1])), 5);
        assert!(buffer.is_empty());
    }

    #[test]
    fn provider_demands_matching_step() {
        let region = Region::from_box(CoordBox::new(Coord::new([0]), Coord::new([1])));
        let mut buffer = PatchBuffer::new(region.clone());
        let g = grid_with(&[7]);
        buffer.save(&g, 4);
        let mut target = grid_with(&[0]);
        let err = buffer
            .get(&mut target, &region, Coord::new([1]), 5, true)
            .unwrap_err();
        assert!(matches!(err, GridHaloError::PatchBufferMiss { requested: 5 }));
        buffer.get(&mut target, &region, Coord::new([1]), 4, true).unwrap();
        assert_eq!(*target.get(Coord::new([0])), 7);
    }

    #[test]
    fn accepter_fires_on_calendar() {
        let region = Region::from_box(CoordBox::new(Coord::new([0]), Coord::new([2])));
        let mut buffer = PatchBuffer::new(region.clone());
        buffer.charge(2, 4, 2);
        let g = grid_with(&[3, 4]);
        // not due: ignored
        buffer.put(&g, &region, Coord::new([2]), 1).unwrap();
        assert!(buffer.is_empty());
        buffer.put(&g, &region, Coord::new([2]), 2).unwrap();
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.next_required_nano_step(), Some(4));
    }
}
