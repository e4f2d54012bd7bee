use hyperpile::prelude::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Random deposits near the center of an 11x11 grid: mass is conserved,
    /// every node ends below its degree, spills are non-negative, and the
    /// height identity `pile_out = pile_in + L·spills` holds exactly.
    #[test]
    fn stabilization_invariants_hold(
        center_extra in 0i64..40,
        seeds in proptest::collection::vec(0i64..4, 9),
    ) {
        let g = Grid::new(11, 2).unwrap();
        let side = g.side() as i64;
        let center = g.node_count() as i64 / 2;
        let mut pile = vec![0i64; g.node_count()];
        for (k, &h) in seeds.iter().enumerate() {
            let (di, dj) = (k as i64 / 3 - 1, k as i64 % 3 - 1);
            pile[(center + di * side + dj) as usize] = h;
        }
        pile[center as usize] += center_extra;
        let total: i64 = pile.iter().sum();

        let out = stabilize(pile.clone(), g.laplacian(), g.degree(), None, 1).unwrap();
        prop_assert_eq!(out.pile.iter().sum::<i64>(), total);
        prop_assert!(out.pile.iter().zip(g.degree()).all(|(&h, &d)| 0 <= h && h < d));
        prop_assert!(out.spills.iter().all(|&s| s >= 0));
        let flow = g.laplacian().mul_vec(&out.spills).unwrap();
        for v in 0..g.node_count() {
            prop_assert_eq!(out.pile[v], pile[v] + flow[v]);
        }
    }

    /// Any assignment of values to fundamental-domain representatives
    /// expands to an orbit-constant field that collapses back unchanged.
    #[test]
    fn expansion_collapses_back(vals in proptest::collection::vec(-100i64..100, 10)) {
        let g = Grid::new(7, 2).unwrap();
        let ec = expand_collapse(&g, true);
        prop_assert_eq!(ec.expand.cols(), vals.len());
        let field = ec.expand.mul_vec(&vals).unwrap();
        prop_assert_eq!(collapse_vector(&ec.mask, &field).unwrap(), vals);
    }
}
