//! Property tests for the region algebra laws.

use grid_halo::prelude::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn arb_streak() -> impl Strategy<Value = Streak<2>> {
    (-8i32..8, -8i32..8, 1i32..6)
        .prop_map(|(x, y, len)| Streak::new(Coord::new([x, y]), x + len))
}

fn arb_region() -> impl Strategy<Value = Region<2>> {
    proptest::collection::vec(arb_streak(), 0..12).prop_map(|streaks| {
        let mut region = Region::new();
        for s in streaks {
            region.insert(s);
        }
        region
    })
}

fn point_set(region: &Region<2>) -> BTreeSet<(i32, i32)> {
    region.coords().map(|c| (c[0], c[1])).collect()
}

proptest! {
    #[test]
    fn inclusion_exclusion(a in arb_region(), b in arb_region()) {
        prop_assert_eq!(
            (&a | &b).size() + (&a & &b).size(),
            a.size() + b.size()
        );
    }

    #[test]
    fn difference_factors_through_intersection(a in arb_region(), b in arb_region()) {
        prop_assert_eq!(&a - &b, &a - &(&a & &b));
    }

    #[test]
    fn operations_match_point_sets(a in arb_region(), b in arb_region()) {
        let (pa, pb) = (point_set(&a), point_set(&b));
        prop_assert_eq!(
            point_set(&(&a | &b)),
            pa.union(&pb).copied().collect::<BTreeSet<_>>()
        );
        prop_assert_eq!(
            point_set(&(&a & &b)),
            pa.intersection(&pb).copied().collect::<BTreeSet<_>>()
        );
        prop_assert_eq!(
            point_set(&(&a - &b)),
            pa.difference(&pb).copied().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn results_stay_canonical(a in arb_region(), b in arb_region()) {
        prop_assert!((&a | &b).validate_invariants().is_ok());
        prop_assert!((&a & &b).validate_invariants().is_ok());
        prop_assert!((&a - &b).validate_invariants().is_ok());
    }

    #[test]
    fn canonical_form_is_insertion_order_free(streaks in proptest::collection::vec(arb_streak(), 0..10)) {
        let mut forward = Region::new();
        for s in &streaks {
            forward.insert(*s);
        }
        let mut backward = Region::new();
        for s in streaks.iter().rev() {
            backward.insert(*s);
        }
        prop_assert_eq!(&forward, &backward);
        let collected: Region<2> = streaks.iter().copied().collect();
        prop_assert_eq!(&forward, &collected);
    }

    #[test]
    fn expansion_composes(a in arb_region(), i in 0u32..3, j in 0u32..3) {
        prop_assert_eq!(a.expand(0), a.clone());
        prop_assert_eq!(a.expand(i).expand(j), a.expand(i + j));
    }

    #[test]
    fn expansion_contains_the_original(a in arb_region(), k in 1u32..3) {
        let expanded = a.expand(k);
        prop_assert_eq!(&(&a - &expanded), &Region::new());
        if !a.is_empty() {
            prop_assert!(expanded.size() > a.size());
        }
    }

    #[test]
    fn fingerprint_agrees_with_equality(a in arb_region(), b in arb_region()) {
        if a == b {
            prop_assert_eq!(a.fingerprint(), b.fingerprint());
        }
        if a.fingerprint() != b.fingerprint() {
            prop_assert_ne!(a, b);
        }
    }
}
