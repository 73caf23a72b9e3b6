//! The update group: one rank's stepper, partition manager and patch links,
//! wired together.
//!
//! Construction order matters and is part of the contract:
//!
//! 1. Build the partition manager, all-gather bounding boxes, reset ghost
//!    zones.
//! 2. Create a *sender* link for every non-empty inner ghost fragment and
//!    hand them to the stepper up front — the stepper's priming replay ships
//!    the first halo generation during construction.
//! 3. Construct the stepper.
//! 4. Create a *receiver* link for every non-empty outer ghost fragment and
//!    register it afterwards; receivers only matter at the next sync.
//! 5. Register externally supplied providers last so they can override the
//!    link providers for the same region (replaying saved state relies on
//!    this).

use crate::cell::{PatchWire, StencilCell};
use crate::comm::{all_gather_bounding_boxes, Communicator, PATCH_LINK_TAG};
use crate::geometry::coord::CoordBox;
use crate::geometry::partition_manager::{PartitionManager, PeerId};
use crate::initializer::Initializer;
use crate::patch::{
    PatchAccepter, PatchLinkAccepter, PatchLinkProvider, PatchProvider, PatchType, ENDLESS,
};
use crate::partition::Partition;
use crate::sim_error::GridHaloError;
use crate::stepper::{Stepper, VanillaStepper};
use crate::storage::grid::Grid;
use std::sync::Arc;

pub struct UpdateGroup<C, const D: usize, T>
where
    C: StencilCell<D> + PatchWire,
    T: Communicator,
{
    stepper: VanillaStepper<C, D>,
    partition_manager: Arc<PartitionManager<D>>,
    comm: Arc<T>,
    max_steps: u64,
}

impl<C, const D: usize, T> UpdateGroup<C, D, T>
where
    C: StencilCell<D> + PatchWire,
    T: Communicator,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        partition: Arc<dyn Partition<D>>,
        sim_box: CoordBox<D>,
        ghost_zone_width: u32,
        initializer: &dyn Initializer<C, D>,
        mut patch_accepters_ghost: Vec<Box<dyn PatchAccepter<C, D>>>,
        patch_accepters_inner: Vec<Box<dyn PatchAccepter<C, D>>>,
        patch_providers_ghost: Vec<Box<dyn PatchProvider<C, D>>>,
        patch_providers_inner: Vec<Box<dyn PatchProvider<C, D>>>,
        comm: Arc<T>,
    ) -> Result<Self, GridHaloError> {
        let caps = C::caps();
        let mut partition_manager = PartitionManager::new(
            sim_box,
            partition,
            caps.topology,
            comm.rank(),
            ghost_zone_width,
        )?;
        let own_bounding_box = partition_manager.own_region(0).bounding_box();
        let bounding_boxes = all_gather_bounding_boxes(&*comm, own_bounding_box)?;
        partition_manager.reset_ghost_zones(&bounding_boxes)?;

        let first_sync =
            initializer.start_step() * C::NANO_STEPS as u64 + ghost_zone_width as u64;
        let stride = ghost_zone_width as u64;

        // ghost senders go in before the stepper: its priming replay already
        // ships the first halo generation
        for (peer, stack) in partition_manager.inner_fragments() {
            let PeerId::Rank(rank) = *peer else { continue };
            let fragment = stack.last().expect("fragment stacks span 0..=G");
            if fragment.is_empty() {
                continue;
            }
            let mut link: PatchLinkAccepter<C, D, T> =
                PatchLinkAccepter::new(fragment.clone(), rank, PATCH_LINK_TAG, comm.clone());
            link.charge(first_sync, ENDLESS, stride);
            patch_accepters_ghost.push(Box::new(link));
        }

        let partition_manager = Arc::new(partition_manager);
        let mut stepper = VanillaStepper::new(
            partition_manager.clone(),
            initializer,
            patch_accepters_ghost,
            patch_accepters_inner,
        )?;

        // receivers are safe to add after initialization: they are only
        // drained at the next sync
        for (peer, stack) in partition_manager.outer_fragments() {
            let PeerId::Rank(rank) = *peer else { continue };
            let fragment = stack.last().expect("fragment stacks span 0..=G");
            if fragment.is_empty() {
                continue;
            }
            let mut link: PatchLinkProvider<C, D, T> =
                PatchLinkProvider::new(fragment.clone(), rank, PATCH_LINK_TAG, comm.clone());
            link.charge(first_sync, ENDLESS, stride);
            stepper.add_patch_provider(Box::new(link), PatchType::Ghost);
        }

        // external providers last, so they override the link providers
        for provider in patch_providers_ghost {
            stepper.add_patch_provider(provider, PatchType::Ghost);
        }
        for provider in patch_providers_inner {
            stepper.add_patch_provider(provider, PatchType::InnerSet);
        }

        Ok(Self {
            stepper,
            partition_manager,
            comm,
            max_steps: initializer.max_steps(),
        })
    }

    /// Advance by `nano_steps` nano steps.
    pub fn update(&mut self, nano_steps: u32) -> Result<(), GridHaloError> {
        self.stepper.update(nano_steps)
    }

    /// Run to the initializer's `max_steps`, surfacing the first fatal error.
    pub fn run(&mut self) -> Result<(), GridHaloError> {
        while self.current_step().0 < self.max_steps {
            self.stepper.update(C::NANO_STEPS)?;
        }
        Ok(())
    }

    pub fn current_step(&self) -> (u64, u32) {
        self.stepper.current_step()
    }

    pub fn grid(&self) -> &Grid<C, D> {
        self.stepper.grid()
    }

    pub fn partition_manager(&self) -> &PartitionManager<D> {
        &self.partition_manager
    }

    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    pub fn add_patch_accepter(
        &mut self,
        accepter: Box<dyn PatchAccepter<C, D>>,
        slot: PatchType,
    ) {
        self.stepper.add_patch_accepter(accepter, slot);
    }

    pub fn add_patch_provider(
        &mut self,
        provider: Box<dyn PatchProvider<C, D>>,
        slot: PatchType,
    ) {
        self.stepper.add_patch_provider(provider, slot);
    }
}
