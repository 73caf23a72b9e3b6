//! Patches: scheduled movement of a region's cells in and out of grids.
//!
//! A *patch* is the cells of one region at one nano step. [`PatchAccepter`]s
//! consume patches out of a grid (senders, writers, save buffers);
//! [`PatchProvider`]s produce them into a grid (receivers, restore buffers,
//! replayed checkpoints). Both fire on a per-instance [`NanoStepCalendar`]:
//! either one-shot requests or a charged `(first, last, stride)` schedule.

pub mod buffer;
pub mod link;
pub mod writer;

pub use buffer::PatchBuffer;
pub use link::{PatchLinkAccepter, PatchLinkProvider};
pub use writer::{SimEvent, Writer, WriterAdapter};

use crate::geometry::coord::Coord;
use crate::geometry::region::Region;
use crate::sim_error::GridHaloError;
use crate::storage::grid::Grid;
use std::collections::BTreeSet;

/// Marks the slot a patch accepter/provider is registered for.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PatchType {
    /// Ghost-zone exchange, fired by the sync replay every G nano steps.
    Ghost,
    /// Observer slot, fired after every kernel nano step.
    InnerSet,
}

/// Charged schedules run to this last step.
pub const ENDLESS: u64 = u64::MAX;

/// The set of nano steps an accepter or provider fires at: explicit one-shot
/// requests plus an optional endless strided charge. Requests for steps that
/// already fired are programming errors and are rejected.
#[derive(Clone, Debug, Default)]
pub struct NanoStepCalendar {
    requested: BTreeSet<u64>,
    charge: Option<(u64, u64)>, // (last, stride)
    last_served: Option<u64>,
}

impl NanoStepCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the strided schedule `{first + k·stride | k ∈ ℕ} ∩ [0, last]`.
    pub fn charge(&mut self, first: u64, last: u64, stride: u64) {
        debug_assert!(stride > 0, "charge stride must be positive");
        self.charge = Some((last, stride));
        self.requested.insert(first);
    }

    /// Request a single firing at `nano_step`.
    pub fn push_request(&mut self, nano_step: u64) -> Result<(), GridHaloError> {
        if let Some(served) = self.last_served {
            if nano_step <= served {
                return Err(GridHaloError::ScheduleInPast {
                    requested: nano_step,
                    current: served,
                });
            }
        }
        self.requested.insert(nano_step);
        Ok(())
    }

    /// The next step this calendar fires at.
    pub fn next(&self) -> Option<u64> {
        self.requested.iter().next().copied()
    }

    /// True if the calendar fires exactly at `nano_step`.
    pub fn is_due(&self, nano_step: u64) -> bool {
        self.next() == Some(nano_step)
    }

    /// Consume the firing at `nano_step` and schedule the next strided one.
    pub fn advance(&mut self, nano_step: u64) {
        self.requested.remove(&nano_step);
        self.last_served = Some(nano_step);
        if let Some((last, stride)) = self.charge {
            let next = nano_step.saturating_add(stride);
            if next <= last {
                self.requested.insert(next);
            }
        }
    }

    /// Drop all pending firings (used when detaching an observer).
    pub fn clear(&mut self) {
        self.requested.clear();
        self.charge = None;
    }
}

/// Consumes patches: copies or ships its region's cells *out of* a grid after
/// the stepper has updated them to the given nano step.
pub trait PatchAccepter<C, const D: usize>: Send {
    /// The next nano step at which the stepper must call [`put`](Self::put).
    fn next_required_nano_step(&self) -> Option<u64>;

    /// Request a one-shot firing.
    fn push_request(&mut self, nano_step: u64) -> Result<(), GridHaloError>;

    /// Consume the patch. `valid_region` is the part of `grid` updated to
    /// `nano_step`; the accepter's configured region must lie inside it.
    fn put(
        &mut self,
        grid: &Grid<C, D>,
        valid_region: &Region<D>,
        global_dimensions: Coord<D>,
        nano_step: u64,
    ) -> Result<(), GridHaloError>;

    /// Best-effort abort signal on fatal teardown; transport-backed accepters
    /// forward it to their peer.
    fn poison(&mut self, nano_step: u64) {
        let _ = nano_step;
    }
}

/// Produces patches: fills its region's cells *into* a grid.
pub trait PatchProvider<C, const D: usize>: Send {
    /// The next nano step this provider has (or will have) data for.
    fn next_available_nano_step(&self) -> Option<u64>;

    /// Produce the patch for `nano_step` into `grid`, blocking for data if
    /// `wait` is set.
    fn get(
        &mut self,
        grid: &mut Grid<C, D>,
        valid_region: &Region<D>,
        global_dimensions: Coord<D>,
        nano_step: u64,
        wait: bool,
    ) -> Result<(), GridHaloError>;
}

/// Collect a region's cells from a grid in canonical streak order.
pub(crate) fn gather_region<C: Clone, const D: usize>(
    grid: &Grid<C, D>,
    region: &Region<D>,
) -> Vec<C> {
    let mut cells = Vec::with_capacity(region.size());
    for streak in region.streaks() {
        cells.extend_from_slice(grid.streak(&streak));
    }
    cells
}

/// Write cells gathered by [`gather_region`] back into a grid.
pub(crate) fn scatter_region<C: Clone, const D: usize>(
    grid: &mut Grid<C, D>,
    region: &Region<D>,
    cells: &[C],
) {
    debug_assert_eq!(cells.len(), region.size());
    let mut cursor = 0;
    for streak in region.streaks() {
        let next = cursor + streak.length();
        grid.write_streak(&streak, &cells[cursor..next]);
        cursor = next;
    }
}
