//! Steppers: the nano-step state machines that advance a subdomain.

pub mod vanilla;

pub use vanilla::VanillaStepper;

use crate::cell::{RowHood, StencilCell};
use crate::geometry::region::Region;
use crate::patch::{PatchAccepter, PatchProvider, PatchType};
use crate::sim_error::GridHaloError;
use crate::storage::grid::Grid;

/// Contract between the update group and a stepper implementation.
pub trait Stepper<C: StencilCell<D>, const D: usize> {
    /// Advance by `nano_steps` nano steps.
    fn update(&mut self, nano_steps: u32) -> Result<(), GridHaloError>;

    /// `(cell_step, nano_step_within_cell_step)`.
    fn current_step(&self) -> (u64, u32);

    /// The grid holding the current state.
    fn grid(&self) -> &Grid<C, D>;

    fn add_patch_accepter(&mut self, accepter: Box<dyn PatchAccepter<C, D>>, slot: PatchType);

    fn add_patch_provider(&mut self, provider: Box<dyn PatchProvider<C, D>>, slot: PatchType);
}

/// Apply the cell's update rule over `region`, reading `src` and writing
/// `dst`. Streaks go through the whole-streak path; iteration follows the
/// region's canonical order, which is what keeps runs bit-reproducible.
pub fn update_region<C: StencilCell<D>, const D: usize>(
    region: &Region<D>,
    src: &Grid<C, D>,
    dst: &mut Grid<C, D>,
    nano_step: u32,
) {
    for streak in region.streaks() {
        let row = RowHood::new(src, streak.origin);
        let out = dst.streak_mut(&streak);
        C::update_streak(&row, out, nano_step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Neighborhood;
    use crate::geometry::coord::{Coord, CoordBox};
    use crate::geometry::topology::Topology;

    #[derive(Clone, Default, PartialEq, Debug)]
    struct Count(u32);

    impl StencilCell<1> for Count {
        fn topology() -> Topology<1> {
            Topology::cube()
        }

        fn update<H: Neighborhood<Self, 1>>(hood: &H, _nano_step: u32) -> Self {
            Count(hood.at(Coord::zero()).0 + hood.at(Coord::new([1])).0)
        }
    }

    #[test]
    fn update_region_writes_only_the_region() {
        let bounds = CoordBox::new(Coord::new([0]), Coord::new([5]));
        let mut src = Grid::new(bounds, bounds, Topology::cube(), Count(0));
        for x in 0..5 {
            src.set(Coord::new([x]), Count(x as u32 + 1));
        }
        let mut dst = Grid::new(bounds, bounds, Topology::cube(), Count(0));
        let region = Region::from_box(CoordBox::new(Coord::new([1]), Coord::new([2])));
        update_region(&region, &src, &mut dst, 0);
        assert_eq!(*dst.get(Coord::new([0])), Count(0), "untouched");
        assert_eq!(*dst.get(Coord::new([1])), Count(2 + 3));
        assert_eq!(*dst.get(Coord::new([2])), Count(3 + 4));
        assert_eq!(*dst.get(Coord::new([3])), Count(0), "untouched");
    }
}
