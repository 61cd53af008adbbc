use binvis::gilbert;
use proptest::prelude::*;
use std::collections::HashSet;

proptest! {
    // Every cell is visited exactly once
    #[test]
    fn curve_is_bijection(width in 1usize..80, height in 1usize..80) {
        let curve = gilbert(width, height);
        prop_assert_eq!(curve.len(), width * height);
        let unique: HashSet<_> = curve.iter().collect();
        prop_assert_eq!(unique.len(), width * height);
        prop_assert!(curve.iter().all(|(x, y)| x < width && y < height));
        prop_assert_eq!(curve.points()[0], (0, 0));
    }

    // Even-sided grids never need a diagonal step
    #[test]
    fn even_grid_steps_are_adjacent(half_width in 1usize..40, half_height in 1usize..40) {
        let curve = gilbert(half_width * 2, half_height * 2);
        for pair in curve.points().windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            prop_assert_eq!(x0.abs_diff(x1) + y0.abs_diff(y1), 1);
        }
    }

    // Any grid moves at most one cell per axis per step
    #[test]
    fn steps_stay_local(width in 1usize..60, height in 1usize..60) {
        let curve = gilbert(width, height);
        for pair in curve.points().windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            prop_assert!(x0.abs_diff(x1) <= 1 && y0.abs_diff(y1) <= 1);
        }
    }
}
