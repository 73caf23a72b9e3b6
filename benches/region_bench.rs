use criterion::{black_box, criterion_group, criterion_main, Criterion};
use grid_halo::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn checkerboard(extent: i32, tile: i32) -> Region<2> {
    let mut region = Region::new();
    for y in 0..extent {
        for x in (0..extent).step_by((2 * tile) as usize) {
            let offset = if (y / tile) % 2 == 0 { 0 } else { tile };
            let x0 = x + offset;
            if x0 < extent {
                region.insert(Streak::new(
                    Coord::new([x0, y]),
                    (x0 + tile).min(extent),
                ));
            }
        }
    }
    region
}

fn scattered(extent: i32, streaks: usize, seed: u64) -> Region<2> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut region = Region::new();
    for _ in 0..streaks {
        let x = rng.gen_range(0..extent - 8);
        let y = rng.gen_range(0..extent);
        let len = rng.gen_range(1..8);
        region.insert(Streak::new(Coord::new([x, y]), x + len));
    }
    region
}

fn bench_region_ops(c: &mut Criterion) {
    let a = checkerboard(256, 8);
    let b = checkerboard(256, 16);
    let bounds = CoordBox::new(Coord::new([0, 0]), Coord::new([256, 256]));

    c.bench_function("region_union_checkerboard", |bench| {
        bench.iter(|| black_box(&a) | black_box(&b))
    });
    c.bench_function("region_intersection_checkerboard", |bench| {
        bench.iter(|| black_box(&a) & black_box(&b))
    });
    c.bench_function("region_difference_checkerboard", |bench| {
        bench.iter(|| black_box(&a) - black_box(&b))
    });
    c.bench_function("region_expand_3", |bench| {
        bench.iter(|| black_box(&a).expand(3))
    });
    c.bench_function("region_expand_with_topology_torus", |bench| {
        bench.iter(|| black_box(&a).expand_with_topology(3, &bounds, Topology::torus(), None))
    });

    let scatter_a = scattered(512, 4096, 1);
    let scatter_b = scattered(512, 4096, 2);
    c.bench_function("region_union_scattered", |bench| {
        bench.iter(|| black_box(&scatter_a) | black_box(&scatter_b))
    });
    c.bench_function("region_insert_scattered", |bench| {
        bench.iter(|| scattered(512, 4096, 3))
    });
}

fn bench_partition(c: &mut Criterion) {
    let bounds = CoordBox::new(Coord::new([0, 0]), Coord::new([512, 512]));
    c.bench_function("striping_partition_64_nodes", |bench| {
        let partition = StripingPartition::new(bounds, 0, vec![4096; 64]).unwrap();
        bench.iter(|| {
            for node in 0..64 {
                black_box(partition.region(node).unwrap());
            }
        })
    });
    c.bench_function("recursive_bisection_64_nodes", |bench| {
        bench.iter(|| {
            black_box(RecursiveBisectionPartition::new(bounds, vec![1; 64]).unwrap())
        })
    });
}

criterion_group!(benches, bench_region_ops, bench_partition);
criterion_main!(benches);
