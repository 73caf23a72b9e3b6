//! Region algebra acceptance scenarios.

use grid_halo::prelude::*;

fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Region<2> {
    Region::from_box(CoordBox::new(
        Coord::new([x0, y0]),
        Coord::new([x1 - x0, y1 - y0]),
    ))
}

#[test]
fn two_rectangles() {
    let r = rect(0, 0, 10, 10);
    let s = rect(5, 5, 15, 15);
    assert_eq!((&r & &s).size(), 25);
    assert_eq!((&r | &s).size(), 175);
    let l_shape = &r - &(&r & &s);
    assert_eq!(l_shape.size(), 75);
    assert_eq!(l_shape, &r - &s);
    l_shape.validate_invariants().unwrap();
}

#[test]
fn canonical_iteration_order_is_row_major() {
    let mut region = Region::<2>::new();
    // insert in scrambled order
    region.insert(Streak::new(Coord::new([4, 2]), 6));
    region.insert(Streak::new(Coord::new([0, 0]), 2));
    region.insert(Streak::new(Coord::new([7, 0]), 9));
    region.insert(Streak::new(Coord::new([1, 1]), 3));
    let order: Vec<_> = region.streaks().map(|s| s.origin).collect();
    assert_eq!(
        order,
        vec![
            Coord::new([0, 0]),
            Coord::new([7, 0]),
            Coord::new([1, 1]),
            Coord::new([4, 2]),
        ]
    );
    let mut coords = region.coords();
    assert_eq!(coords.next(), Some(Coord::new([0, 0])));
    assert_eq!(coords.next(), Some(Coord::new([1, 0])));
    assert_eq!(coords.next(), Some(Coord::new([7, 0])));
}

#[test]
fn expansion_against_simulation_box() {
    let bounds = CoordBox::new(Coord::new([0, 0]), Coord::new([30, 30]));
    let block = rect(0, 0, 30, 5);
    let cube = block.expand_with_topology(3, &bounds, Topology::cube(), None);
    assert_eq!(cube, rect(0, 0, 30, 8), "clipped at the low edge");
    let torus = block.expand_with_topology(3, &bounds, Topology::torus(), None);
    assert_eq!(torus.size(), 30 * 11);
    assert!(torus.contains(Coord::new([0, 27])), "wrapped to the far side");
}

#[test]
fn three_dimensional_regions() {
    let a = Region::from_box(CoordBox::new(Coord::new([0, 0, 0]), Coord::new([4, 4, 4])));
    let b = Region::from_box(CoordBox::new(Coord::new([2, 2, 2]), Coord::new([4, 4, 4])));
    assert_eq!((&a & &b).size(), 8);
    assert_eq!((&a | &b).size(), 64 + 64 - 8);
    let e = a.expand(1);
    assert_eq!(e.bounding_box().size(), 6 * 6 * 6);
    assert_eq!(e.size(), 216);
}

#[test]
fn size_tracks_operations() {
    let a = rect(0, 0, 8, 8);
    let b = rect(4, 0, 12, 8);
    let union = &a | &b;
    let inter = &a & &b;
    assert_eq!(union.size() + inter.size(), a.size() + b.size());
    assert_eq!((&a - &b).size(), a.size() - inter.size());
}
