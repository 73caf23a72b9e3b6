//! The partition manager: every region a node's stepper needs.
//!
//! Given a partition and the local rank, derives the owned region at all
//! expansion widths `0..=G`, the rims and inner sets that drive the nano-step
//! state machine, and the per-peer inner/outer ghost-zone fragments exchanged
//! over patch links. Pure geometry: no I/O happens here.
//!
//! Fragments for halo cells that no identified peer owns (e.g. across a
//! refinement boundary, or the band at an unwrapped grid edge) collect under
//! the [`PeerId::Outgroup`] pseudo-peer; a higher-level loader is responsible
//! for those.

use crate::geometry::coord::CoordBox;
use crate::geometry::region::Region;
use crate::geometry::topology::Topology;
use crate::partition::Partition;
use crate::sim_error::GridHaloError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A ghost-zone exchange partner: a concrete rank, or the outgroup pseudo-peer
/// for halo with no identified owner at this decomposition level.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum PeerId {
    Outgroup,
    Rank(usize),
}

/// Regions indexed by expansion width `0..=G`.
pub type RegionStack<const D: usize> = Vec<Region<D>>;

pub struct PartitionManager<const D: usize> {
    partition: Arc<dyn Partition<D>>,
    sim_area: CoordBox<D>,
    topology: Topology<D>,
    my_rank: usize,
    ghost_zone_width: u32,
    /// node -> region at expansions 0..=G, filled on demand
    regions: BTreeMap<usize, RegionStack<D>>,
    outer_fragments: BTreeMap<PeerId, RegionStack<D>>,
    inner_fragments: BTreeMap<PeerId, RegionStack<D>>,
    own_rims: Vec<Region<D>>,
    own_inner_sets: Vec<Region<D>>,
    outer_rim: Region<D>,
    volatile_kernel: Region<D>,
    inner_rim: Region<D>,
    bounding_boxes: Vec<CoordBox<D>>,
}

impl<const D: usize> PartitionManager<D> {
    /// Install a decomposition. `ghost_zone_width` decides how many nano-steps
    /// pass between halo synchronizations: wider halos sync less often but
    /// ship more cells per sync.
    pub fn new(
        sim_area: CoordBox<D>,
        partition: Arc<dyn Partition<D>>,
        topology: Topology<D>,
        my_rank: usize,
        ghost_zone_width: u32,
    ) -> Result<Self, GridHaloError> {
        if sim_area.is_empty() {
            return Err(GridHaloError::EmptySimulationArea);
        }
        if ghost_zone_width == 0 {
            return Err(GridHaloError::InvalidGhostZoneWidth);
        }
        let mut manager = Self {
            partition,
            sim_area,
            topology,
            my_rank,
            ghost_zone_width,
            regions: BTreeMap::new(),
            outer_fragments: BTreeMap::new(),
            inner_fragments: BTreeMap::new(),
            own_rims: Vec::new(),
            own_inner_sets: Vec::new(),
            outer_rim: Region::new(),
            volatile_kernel: Region::new(),
            inner_rim: Region::new(),
            bounding_boxes: Vec::new(),
        };
        manager.fill_own_region()?;
        Ok(manager)
    }

    /// Recompute the ghost-zone fragments from the bounding boxes gathered
    /// from all ranks. Peers are materialized on demand: only ranks whose box
    /// intersects the local expanded region *and* that actually share a
    /// fragment are kept. Idempotent for identical inputs.
    pub fn reset_ghost_zones(
        &mut self,
        bounding_boxes: &[CoordBox<D>],
    ) -> Result<(), GridHaloError> {
        self.bounding_boxes = bounding_boxes.to_vec();
        self.outer_fragments.clear();
        self.inner_fragments.clear();
        let own_bounding_box = self.own_expanded_region().bounding_box();
        let g = self.ghost_zone_width as usize;

        for rank in 0..self.bounding_boxes.len() {
            if rank == self.my_rank || !self.bounding_boxes[rank].intersects(&own_bounding_box) {
                continue;
            }
            self.ensure_region(rank)?;
            let shares_halo = {
                let mine = &self.regions[&self.my_rank];
                let theirs = &self.regions[&rank];
                !(&mine[g] & &theirs[0]).is_empty() || !(&theirs[g] & &mine[0]).is_empty()
            };
            if shares_halo {
                self.intersect(rank);
            } else {
                // bounding boxes over-approximate regions, so this is legal;
                // it still merits a note when diagnosing decompositions
                log::warn!(
                    "rank {rank} bounding box intersects rank {} but shares no ghost fragment; dropping peer",
                    self.my_rank
                );
            }
        }

        // Outgroup fragments are what remains of the rims once every
        // identified peer's share is subtracted. Computed a tad generous; an
        // exact greedy calculation would be more complicated.
        let mut outer = self.outer_rim.clone();
        let mut inner = self.own_rims[g].clone();
        for (peer, stack) in &self.outer_fragments {
            if *peer != PeerId::Outgroup {
                outer = &outer - &stack[g];
            }
        }
        for (peer, stack) in &self.inner_fragments {
            if *peer != PeerId::Outgroup {
                inner = &inner - &stack[g];
            }
        }
        self.outer_fragments
            .insert(PeerId::Outgroup, vec![outer; g + 1]);
        self.inner_fragments
            .insert(PeerId::Outgroup, vec![inner; g + 1]);
        Ok(())
    }

    /// Region of `node` at `expansion_width`, materializing the node's stack
    /// on first use.
    pub fn region(
        &mut self,
        node: usize,
        expansion_width: u32,
    ) -> Result<&Region<D>, GridHaloError> {
        self.ensure_region(node)?;
        Ok(&self.regions[&node][expansion_width as usize])
    }

    /// This node's owned region at `expansion_width`.
    pub fn own_region(&self, expansion_width: u32) -> &Region<D> {
        &self.regions[&self.my_rank][expansion_width as usize]
    }

    /// Owned region expanded by the full ghost zone width.
    pub fn own_expanded_region(&self) -> &Region<D> {
        self.regions[&self.my_rank]
            .last()
            .expect("own region stack is filled at construction")
    }

    /// The node's inner ghost zone plus the surrounding cells required to
    /// update it, at distance `dist`.
    pub fn rim(&self, dist: u32) -> &Region<D> {
        &self.own_rims[dist as usize]
    }

    /// The part of the domain whose `dist`-step update depends on owned cells
    /// only.
    pub fn inner_set(&self, dist: u32) -> &Region<D> {
        &self.own_inner_sets[dist as usize]
    }

    /// Union of all outer ghost-zone fragments.
    pub fn outer_rim(&self) -> &Region<D> {
        &self.outer_rim
    }

    /// The part of the kernel the ghost replay overwrites; saved and restored
    /// around each sync.
    pub fn volatile_kernel(&self) -> &Region<D> {
        &self.volatile_kernel
    }

    /// The part of the kernel the ghost replay reads to update the own rims;
    /// one stencil diameter wider than the volatile kernel.
    pub fn inner_rim(&self) -> &Region<D> {
        &self.inner_rim
    }

    pub fn outer_fragments(&self) -> &BTreeMap<PeerId, RegionStack<D>> {
        &self.outer_fragments
    }

    pub fn inner_fragments(&self) -> &BTreeMap<PeerId, RegionStack<D>> {
        &self.inner_fragments
    }

    /// Halo this node reads but no identified peer provides.
    pub fn outer_outgroup_fragment(&self) -> &Region<D> {
        self.outer_fragments
            .get(&PeerId::Outgroup)
            .and_then(|stack| stack.last())
            .expect("reset_ghost_zones installs the outgroup fragment")
    }

    /// Cells this node owns that belong to no identified peer's halo.
    pub fn inner_outgroup_fragment(&self) -> &Region<D> {
        self.inner_fragments
            .get(&PeerId::Outgroup)
            .and_then(|stack| stack.last())
            .expect("reset_ghost_zones installs the outgroup fragment")
    }

    pub fn ghost_zone_width(&self) -> u32 {
        self.ghost_zone_width
    }

    pub fn rank(&self) -> usize {
        self.my_rank
    }

    pub fn sim_area(&self) -> &CoordBox<D> {
        &self.sim_area
    }

    pub fn topology(&self) -> Topology<D> {
        self.topology
    }

    pub fn weights(&self) -> &[usize] {
        self.partition.weights()
    }

    pub fn bounding_boxes(&self) -> &[CoordBox<D>] {
        &self.bounding_boxes
    }

    fn ensure_region(&mut self, node: usize) -> Result<(), GridHaloError> {
        if self.regions.contains_key(&node) {
            return Ok(());
        }
        let g = self.ghost_zone_width as usize;
        let mut stack = Vec::with_capacity(g + 1);
        stack.push(self.partition.region(node)?);
        for i in 1..=g {
            let expanded = stack[i - 1].expand_with_topology(
                1,
                &self.sim_area,
                self.topology,
                self.partition.adjacency(),
            );
            stack.push(expanded);
        }
        self.regions.insert(node, stack);
        Ok(())
    }

    fn fill_own_region(&mut self) -> Result<(), GridHaloError> {
        self.ensure_region(self.my_rank)?;
        let g = self.ghost_zone_width;
        let own = self.own_region(0).clone();

        // The surface is the unclipped one-step shell of the owned region:
        // the simulation edge counts as a boundary like any other, so the
        // bands along it are rim and land in the inner outgroup fragment.
        let surface =
            &own.expand_wrapping_unclipped(1, &self.sim_area, self.topology) - &own;
        let kernel = &own - &surface.expand_wrapping_unclipped(g, &self.sim_area, self.topology);
        self.outer_rim = self.own_expanded_region() - &own;

        let mut rims = vec![Region::new(); g as usize + 1];
        rims[g as usize] = &own - &kernel;
        for i in (0..g as usize).rev() {
            rims[i] = rims[i + 1].expand_with_topology(
                1,
                &self.sim_area,
                self.topology,
                self.partition.adjacency(),
            );
        }
        self.own_rims = rims;

        let mut inner_sets = Vec::with_capacity(g as usize + 1);
        inner_sets.push(own.clone());
        let mut minuend = surface.expand_wrapping_unclipped(1, &self.sim_area, self.topology);
        for i in 1..=g as usize {
            inner_sets.push(&inner_sets[i - 1] - &minuend);
            minuend = minuend.expand_wrapping_unclipped(1, &self.sim_area, self.topology);
        }
        self.own_inner_sets = inner_sets;

        self.volatile_kernel = self.inner_set(g) & self.rim(0);
        self.inner_rim = self.inner_set(g - 1) & self.rim(0);
        Ok(())
    }

    /// Record both fragment stacks against `node`.
    fn intersect(&mut self, node: usize) {
        let g = self.ghost_zone_width as usize;
        let mine = &self.regions[&self.my_rank];
        let theirs = &self.regions[&node];
        let mut outer = Vec::with_capacity(g + 1);
        let mut inner = Vec::with_capacity(g + 1);
        for i in 0..=g {
            outer.push(&mine[i] & &theirs[0]);
            inner.push(&mine[0] & &theirs[i]);
        }
        self.outer_fragments.insert(PeerId::Rank(node), outer);
        self.inner_fragments.insert(PeerId::Rank(node), inner);
    }
}
