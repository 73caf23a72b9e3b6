//! Writers: observers attached to the stepper's inner-set slot.
//!
//! A writer fires every `period` cell steps and receives the grid, the region
//! valid at that nano step, and a lifecycle event. Non-critical writers that
//! fail are detached with a warning and the simulation continues; critical
//! writers propagate their failure as a fatal error.

use crate::geometry::coord::Coord;
use crate::geometry::region::Region;
use crate::patch::{NanoStepCalendar, PatchAccepter};
use crate::sim_error::GridHaloError;
use crate::storage::grid::Grid;

/// Where in the run a writer callback happens.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SimEvent {
    /// The grid was just initialized; nothing has stepped yet.
    Initialized,
    /// A periodic callback mid-run.
    StepFinished,
    /// The final step completed.
    AllDone,
}

/// An output observer.
pub trait Writer<C, const D: usize>: Send {
    fn name(&self) -> &str {
        "writer"
    }

    /// Firing period in cell steps.
    fn period(&self) -> u64 {
        1
    }

    /// Critical writers abort the run when they fail; others are detached
    /// with a logged warning.
    fn critical(&self) -> bool {
        false
    }

    #[allow(clippy::too_many_arguments)]
    fn step_finished(
        &mut self,
        grid: &Grid<C, D>,
        valid_region: &Region<D>,
        global_dimensions: Coord<D>,
        step: u64,
        event: SimEvent,
        last_call: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Adapts a [`Writer`] into an inner-set [`PatchAccepter`].
pub struct WriterAdapter<C, const D: usize> {
    writer: Box<dyn Writer<C, D>>,
    calendar: NanoStepCalendar,
    nano_steps: u32,
    start_step: u64,
    max_steps: u64,
    detached: bool,
}

impl<C, const D: usize> WriterAdapter<C, D> {
    /// Schedule `writer` against a run of `[start_step, max_steps]` cell
    /// steps with `nano_steps` nano steps each.
    pub fn new(
        writer: Box<dyn Writer<C, D>>,
        nano_steps: u32,
        start_step: u64,
        max_steps: u64,
    ) -> Self {
        let mut calendar = NanoStepCalendar::new();
        let stride = writer.period().max(1) * nano_steps as u64;
        let first = start_step * nano_steps as u64;
        let last = max_steps * nano_steps as u64;
        calendar.charge(first, last, stride);
        // the final step fires even when the period does not land on it
        calendar.push_request(last).ok();
        Self {
            writer,
            calendar,
            nano_steps,
            start_step,
            max_steps,
            detached: false,
        }
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }
}

impl<C: Clone + Send, const D: usize> PatchAccepter<C, D> for WriterAdapter<C, D> {
    fn next_required_nano_step(&self) -> Option<u64> {
        if self.detached {
            None
        } else {
            self.calendar.next()
        }
    }

    fn push_request(&mut self, nano_step: u64) -> Result<(), GridHaloError> {
        self.calendar.push_request(nano_step)
    }

    fn put(
        &mut self,
        grid: &Grid<C, D>,
        valid_region: &Region<D>,
        global_dimensions: Coord<D>,
        nano_step: u64,
    ) -> Result<(), GridHaloError> {
        if self.detached || !self.calendar.is_due(nano_step) {
            return Ok(());
        }
        let step = nano_step / self.nano_steps as u64;
        let last_call = step == self.max_steps && nano_step % self.nano_steps as u64 == 0;
        let event = if step == self.start_step {
            SimEvent::Initialized
        } else if last_call {
            SimEvent::AllDone
        } else {
            SimEvent::StepFinished
        };
        let outcome = self.writer.step_finished(
            grid,
            valid_region,
            global_dimensions,
            step,
            event,
            last_call,
        );
        self.calendar.advance(nano_step);
        if let Err(source) = outcome {
            if self.writer.critical() {
                return Err(GridHaloError::ObserverFailed {
                    name: self.writer.name().to_string(),
                    source,
                });
            }
            log::warn!(
                "detaching writer `{}` after failure: {source}",
                self.writer.name()
            );
            self.detached = true;
            self.calendar.clear();
        }
        Ok(())
    }
}
