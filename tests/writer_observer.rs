//! Writers ride the inner-set patch slot on their own period.

mod util;

use grid_halo::prelude::*;
use std::sync::{Arc, Mutex};
use util::*;

struct StepLog {
    calls: Arc<Mutex<Vec<(u64, SimEvent, bool)>>>,
    period: u64,
}

impl Writer<HeatCell, 1> for StepLog {
    fn name(&self) -> &str {
        "step-log"
    }

    fn period(&self) -> u64 {
        self.period
    }

    fn step_finished(
        &mut self,
        grid: &Grid<HeatCell, 1>,
        valid_region: &Region<1>,
        _global_dimensions: Coord<1>,
        step: u64,
        event: SimEvent,
        last_call: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // the declared valid region must actually lie inside the grid
        for streak in valid_region.streaks() {
            assert!(grid.bounding_box().contains(streak.origin));
        }
        self.calls.lock().unwrap().push((step, event, last_call));
        Ok(())
    }
}

#[test]
fn period_ten_writer_sees_begin_middle_end() {
    let bounds = CoordBox::new(Coord::new([0]), Coord::new([20]));
    let steps = 20u64;
    let initializer = HeatInitializer { bounds, steps };
    let calls = Arc::new(Mutex::new(Vec::new()));
    let writer = StepLog {
        calls: calls.clone(),
        period: 10,
    };
    let adapter = WriterAdapter::new(Box::new(writer), 1, 0, steps);

    let partition = Arc::new(StripingPartition::new(bounds, 0, vec![20]).unwrap());
    let mut group: UpdateGroup<HeatCell, 1, _> = UpdateGroup::new(
        partition,
        bounds,
        2,
        &initializer,
        Vec::new(),
        vec![Box::new(adapter)],
        Vec::new(),
        Vec::new(),
        Arc::new(NoComm),
    )
    .unwrap();
    group.run().unwrap();

    let recorded = calls.lock().unwrap();
    assert_eq!(
        *recorded,
        vec![
            (0, SimEvent::Initialized, false),
            (10, SimEvent::StepFinished, false),
            (20, SimEvent::AllDone, true),
        ]
    );
    let last_calls = recorded.iter().filter(|(_, _, last)| *last).count();
    assert_eq!(last_calls, 1, "last_call fires exactly once");
}

#[test]
fn writers_fire_on_every_rank_of_a_distributed_run() {
    let bounds = CoordBox::new(Coord::new([0]), Coord::new([100]));
    let steps = 10u64;
    let universe = grid_halo::comm::ThreadComm::universe(2);
    let handles: Vec<_> = universe
        .into_iter()
        .map(|comm| {
            std::thread::spawn(move || {
                let initializer = HeatInitializer { bounds, steps };
                let calls = Arc::new(Mutex::new(Vec::new()));
                let writer = StepLog {
                    calls: calls.clone(),
                    period: 5,
                };
                let adapter = WriterAdapter::new(Box::new(writer), 1, 0, steps);
                let partition =
                    Arc::new(StripingPartition::new(bounds, 0, vec![50, 50]).unwrap());
                let mut group: UpdateGroup<HeatCell, 1, _> = UpdateGroup::new(
                    partition,
                    bounds,
                    2,
                    &initializer,
                    Vec::new(),
                    vec![Box::new(adapter)],
                    Vec::new(),
                    Vec::new(),
                    Arc::new(comm),
                )
                .unwrap();
                group.run().unwrap();
                let recorded = calls.lock().unwrap();
                recorded
                    .iter()
                    .map(|(step, _, last)| (*step, *last))
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    for handle in handles {
        let recorded = handle.join().expect("rank panicked");
        assert_eq!(
            recorded,
            vec![(0, false), (5, false), (10, true)],
            "every rank drives its writer on the shared schedule"
        );
    }
}
