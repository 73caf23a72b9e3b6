//! Conway's life on a 30×30 torus across 9 ranks.
//!
//! A glider travels one diagonal cell every four generations, so after 120
//! generations it has moved (30, 30) — exactly once around the torus. The
//! distributed run must reproduce the sequential reference cell-for-cell,
//! and both must equal the initial pattern.

mod util;

use grid_halo::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use util::*;

const STEPS: u64 = 120;

fn live_set(grid: &Grid<LifeCell, 2>, region: &Region<2>) -> BTreeSet<(i32, i32)> {
    region
        .coords()
        .filter(|&c| grid.get(c).0)
        .map(|c| (c[0], c[1]))
        .collect()
}

#[test]
fn glider_returns_home_after_one_lap() {
    let bounds = CoordBox::new(Coord::new([0, 0]), Coord::new([30, 30]));
    let live = glider(1, 1);
    let initializer = LifeInitializer {
        bounds,
        live: live.clone(),
        steps: STEPS,
    };

    let reference = evolve_reference(&initializer, STEPS);
    let reference_live = live_set(&reference, &Region::from_box(bounds));
    let initial: BTreeSet<(i32, i32)> = live.iter().map(|c| (c[0], c[1])).collect();
    assert_eq!(
        reference_live, initial,
        "reference glider should lap the torus exactly"
    );

    let universe = grid_halo::comm::ThreadComm::universe(9);
    let handles: Vec<_> = universe
        .into_iter()
        .map(|comm| {
            let live = live.clone();
            std::thread::spawn(move || {
                let initializer = LifeInitializer {
                    bounds,
                    live,
                    steps: STEPS,
                };
                let partition =
                    Arc::new(StripingPartition::new(bounds, 0, vec![100; 9]).unwrap());
                let mut group: UpdateGroup<LifeCell, 2, _> = UpdateGroup::new(
                    partition,
                    bounds,
                    3,
                    &initializer,
                    Vec::new(),
                    Vec::new(),
                    Vec::new(),
                    Vec::new(),
                    Arc::new(comm),
                )
                .unwrap();
                group.run().unwrap();
                let own = group.partition_manager().own_region(0).clone();
                live_set(group.grid(), &own)
            })
        })
        .collect();

    let mut assembled = BTreeSet::new();
    for handle in handles {
        for cell in handle.join().expect("rank panicked") {
            assert!(assembled.insert(cell), "live cell {cell:?} reported twice");
        }
    }
    assert_eq!(assembled, reference_live);
    assert_eq!(assembled, initial);
}

#[test]
fn blinker_oscillates_across_a_rank_boundary() {
    // 10×10 torus, two ranks split at row 5; a vertical blinker straddles the
    // boundary so every generation crosses the halo
    let bounds = CoordBox::new(Coord::new([0, 0]), Coord::new([10, 10]));
    let live = vec![
        Coord::new([4, 4]),
        Coord::new([4, 5]),
        Coord::new([4, 6]),
    ];
    for steps in [1u64, 2, 7] {
        let initializer = LifeInitializer {
            bounds,
            live: live.clone(),
            steps,
        };
        let reference = evolve_reference(&initializer, steps);
        let reference_live = live_set(&reference, &Region::from_box(bounds));

        let universe = grid_halo::comm::ThreadComm::universe(2);
        let handles: Vec<_> = universe
            .into_iter()
            .map(|comm| {
                let live = live.clone();
                std::thread::spawn(move || {
                    let initializer = LifeInitializer {
                        bounds,
                        live,
                        steps,
                    };
                    let partition =
                        Arc::new(StripingPartition::new(bounds, 0, vec![50, 50]).unwrap());
                    let mut group: UpdateGroup<LifeCell, 2, _> = UpdateGroup::new(
                        partition,
                        bounds,
                        1,
                        &initializer,
                        Vec::new(),
                        Vec::new(),
                        Vec::new(),
                        Vec::new(),
                        Arc::new(comm),
                    )
                    .unwrap();
                    group.run().unwrap();
                    let own = group.partition_manager().own_region(0).clone();
                    live_set(group.grid(), &own)
                })
            })
            .collect();

        let mut assembled = BTreeSet::new();
        for handle in handles {
            assembled.extend(handle.join().expect("rank panicked"));
        }
        assert_eq!(assembled, reference_live, "after {steps} generations");
    }
}
