//! The vanilla stepper: synchronous kernel passes with a pipelined ghost
//! replay.
//!
//! Between halo syncs the kernel advances `G` nano steps purely locally over
//! the shrinking inner sets. At every sync the replay walks the rims one nano
//! step at a time, `G` steps *ahead* of the kernel, draining ghost providers
//! and feeding ghost accepters as it goes — this is what overlaps
//! communication with the next kernel burst. Two patch buffers make the
//! replay invisible to the kernel:
//!
//! - the *rim buffer* carries the rim at kernel time across the replay (the
//!   replay leaves the rim `G` steps in the future; the saved copy is
//!   restored before the kernel continues, and the future copy is saved for
//!   the *next* sync's entry state),
//! - the *kernel buffer* shields the volatile kernel, the band of the kernel
//!   the replay's writes clobber.
//!
//! The buffers are FIFO: each sync pushes one rim snapshot and pops the one
//! the previous sync left behind.

use crate::cell::{PatchWire, StencilCell};
use crate::geometry::partition_manager::PartitionManager;
use crate::initializer::Initializer;
use crate::patch::{PatchAccepter, PatchBuffer, PatchProvider, PatchType};
use crate::sim_error::GridHaloError;
use crate::stepper::{update_region, Stepper};
use crate::storage::grid::Grid;
use std::sync::Arc;

pub struct VanillaStepper<C: StencilCell<D> + PatchWire, const D: usize> {
    partition_manager: Arc<PartitionManager<D>>,
    old_grid: Grid<C, D>,
    new_grid: Grid<C, D>,
    cur_step: u64,
    cur_nano_step: u32,
    valid_ghost_zone_width: u32,
    ghost_accepters: Vec<Box<dyn PatchAccepter<C, D>>>,
    inner_set_accepters: Vec<Box<dyn PatchAccepter<C, D>>>,
    ghost_providers: Vec<Box<dyn PatchProvider<C, D>>>,
    inner_set_providers: Vec<Box<dyn PatchProvider<C, D>>>,
    rim_buffer: PatchBuffer<C, D>,
    kernel_buffer: PatchBuffer<C, D>,
}

impl<C: StencilCell<D> + PatchWire, const D: usize> VanillaStepper<C, D> {
    /// Build the grids, seed them from the initializer, ship the initial
    /// inner ghost and run the priming replay. Ghost senders must already be
    /// in `ghost_accepters`: the priming replay ships the first halo
    /// generation to the neighbors.
    pub fn new(
        partition_manager: Arc<PartitionManager<D>>,
        initializer: &dyn Initializer<C, D>,
        ghost_accepters: Vec<Box<dyn PatchAccepter<C, D>>>,
        inner_set_accepters: Vec<Box<dyn PatchAccepter<C, D>>>,
    ) -> Result<Self, GridHaloError> {
        let caps = C::caps();
        let g = partition_manager.ghost_zone_width();
        if g < caps.stencil_radius {
            return Err(GridHaloError::GhostZoneTooNarrow {
                ghost_zone_width: g,
                stencil_radius: caps.stencil_radius,
            });
        }

        let bounds = partition_manager.own_expanded_region().bounding_box();
        let global_box = initializer.grid_box();
        let topology = caps.topology;
        let mut old_grid = Grid::new(bounds, global_box, topology, C::default());
        initializer.populate(&mut old_grid);
        let mut new_grid = Grid::new(bounds, global_box, topology, C::default());
        new_grid.set_edge_cell(old_grid.edge_cell().clone());

        let rim_buffer = PatchBuffer::new(partition_manager.rim(g).clone());
        let kernel_buffer = PatchBuffer::new(partition_manager.volatile_kernel().clone());

        let mut stepper = Self {
            partition_manager,
            old_grid,
            new_grid,
            cur_step: initializer.start_step(),
            cur_nano_step: 0,
            valid_ghost_zone_width: g,
            ghost_accepters,
            inner_set_accepters,
            ghost_providers: Vec::new(),
            inner_set_providers: Vec::new(),
            rim_buffer,
            kernel_buffer,
        };

        match stepper.init_grids() {
            Ok(()) => Ok(stepper),
            Err(e) => {
                stepper.poison_links();
                Err(e)
            }
        }
    }

    fn init_grids(&mut self) -> Result<(), GridHaloError> {
        let pm = Arc::clone(&self.partition_manager);
        let g = pm.ghost_zone_width();
        let nano = self.global_nano_step();
        self.notify_accepters(PatchType::Ghost, pm.rim(g), nano)?;
        self.notify_accepters(PatchType::InnerSet, pm.inner_set(0), nano)?;
        self.rim_buffer.save(&self.old_grid, nano);
        self.update_ghost()
    }

    #[inline]
    fn global_nano_step(&self) -> u64 {
        self.cur_step * C::NANO_STEPS as u64 + self.cur_nano_step as u64
    }

    fn advance_nano_step(&mut self) {
        self.cur_nano_step += 1;
        if self.cur_nano_step == C::NANO_STEPS {
            self.cur_nano_step = 0;
            self.cur_step += 1;
        }
    }

    fn try_update(&mut self, nano_steps: u32) -> Result<(), GridHaloError> {
        for _ in 0..nano_steps {
            self.step()?;
        }
        Ok(())
    }

    /// One kernel nano step over the current inner set, then a sync once the
    /// ghost validity is used up.
    fn step(&mut self) -> Result<(), GridHaloError> {
        let pm = Arc::clone(&self.partition_manager);
        let g = pm.ghost_zone_width();
        self.valid_ghost_zone_width -= 1;
        let index = g - self.valid_ghost_zone_width;
        let region = pm.inner_set(index);
        update_region(region, &self.old_grid, &mut self.new_grid, self.cur_nano_step);
        std::mem::swap(&mut self.old_grid, &mut self.new_grid);
        self.advance_nano_step();
        let nano = self.global_nano_step();
        self.notify_accepters(PatchType::InnerSet, region, nano)?;
        if self.valid_ghost_zone_width == 0 {
            self.update_ghost()?;
            self.valid_ghost_zone_width = g;
        }
        Ok(())
    }

    /// The sync: restore the rim to kernel time, replay the rims `G` nano
    /// steps ahead while exchanging ghost patches, then put the grid back
    /// together for the next kernel burst.
    fn update_ghost(&mut self) -> Result<(), GridHaloError> {
        let pm = Arc::clone(&self.partition_manager);
        let g = pm.ghost_zone_width();

        // the replay will clobber the volatile kernel; the kernel burst has
        // clobbered the rim
        let entry_nano = self.global_nano_step();
        self.kernel_buffer.save(&self.old_grid, entry_nano);
        self.rim_buffer.restore_into(&mut self.old_grid, false)?;

        let entry_nano_step = self.cur_nano_step;
        let entry_step = self.cur_step;
        let mut replay_nano = entry_nano;

        for t in 0..g {
            self.notify_providers(PatchType::Ghost, pm.rim(t), self.global_nano_step())?;
            let region = pm.rim(t + 1);
            update_region(region, &self.old_grid, &mut self.new_grid, self.cur_nano_step);
            self.advance_nano_step();
            std::mem::swap(&mut self.old_grid, &mut self.new_grid);
            replay_nano += 1;
            self.notify_accepters(PatchType::Ghost, pm.rim(g), replay_nano)?;
        }
        self.cur_nano_step = entry_nano_step;
        self.cur_step = entry_step;

        // future rim for the next sync's entry state, then back to kernel time
        self.rim_buffer.save(&self.old_grid, replay_nano);
        if g % 2 == 1 {
            std::mem::swap(&mut self.old_grid, &mut self.new_grid);
        }
        self.rim_buffer.restore_into(&mut self.old_grid, true)?;
        self.kernel_buffer.restore_into(&mut self.old_grid, true)?;
        Ok(())
    }

    fn notify_accepters(
        &mut self,
        slot: PatchType,
        valid_region: &crate::geometry::region::Region<D>,
        nano_step: u64,
    ) -> Result<(), GridHaloError> {
        let global_dimensions = self.old_grid.global_dimensions();
        let accepters = match slot {
            PatchType::Ghost => &mut self.ghost_accepters,
            PatchType::InnerSet => &mut self.inner_set_accepters,
        };
        for accepter in accepters.iter_mut() {
            if accepter.next_required_nano_step() == Some(nano_step) {
                accepter.put(&self.old_grid, valid_region, global_dimensions, nano_step)?;
            }
        }
        Ok(())
    }

    fn notify_providers(
        &mut self,
        slot: PatchType,
        valid_region: &crate::geometry::region::Region<D>,
        nano_step: u64,
    ) -> Result<(), GridHaloError> {
        let global_dimensions = self.old_grid.global_dimensions();
        let providers = match slot {
            PatchType::Ghost => &mut self.ghost_providers,
            PatchType::InnerSet => &mut self.inner_set_providers,
        };
        for provider in providers.iter_mut() {
            if provider.next_available_nano_step() == Some(nano_step) {
                provider.get(
                    &mut self.old_grid,
                    valid_region,
                    global_dimensions,
                    nano_step,
                    true,
                )?;
            }
        }
        Ok(())
    }

    /// Fatal teardown: tell every ghost peer this rank is gone so their
    /// blocking receives fail fast instead of deadlocking.
    fn poison_links(&mut self) {
        let nano_step = self.global_nano_step();
        for accepter in self.ghost_accepters.iter_mut() {
            accepter.poison(nano_step);
        }
    }

    /// The partition manager this stepper was built against.
    pub fn partition_manager(&self) -> &PartitionManager<D> {
        &self.partition_manager
    }
}

impl<C: StencilCell<D> + PatchWire, const D: usize> Stepper<C, D> for VanillaStepper<C, D> {
    fn update(&mut self, nano_steps: u32) -> Result<(), GridHaloError> {
        match self.try_update(nano_steps) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.poison_links();
                Err(e)
            }
        }
    }

    fn current_step(&self) -> (u64, u32) {
        (self.cur_step, self.cur_nano_step)
    }

    fn grid(&self) -> &Grid<C, D> {
        &self.old_grid
    }

    fn add_patch_accepter(&mut self, accepter: Box<dyn PatchAccepter<C, D>>, slot: PatchType) {
        match slot {
            PatchType::Ghost => self.ghost_accepters.push(accepter),
            PatchType::InnerSet => self.inner_set_accepters.push(accepter),
        }
    }

    fn add_patch_provider(&mut self, provider: Box<dyn PatchProvider<C, D>>, slot: PatchType) {
        match slot {
            PatchType::Ghost => self.ghost_providers.push(provider),
            PatchType::InnerSet => self.inner_set_providers.push(provider),
        }
    }
}
