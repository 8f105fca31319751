//! Removes single-cell noise along straight runs.

use crate::gather::NeighborMode;
use crate::padded::{PaddedCell, PaddedRule};
use biomegen_core::CellRng;

/// Takes the value of matching opposite sides; a tie between the x and z
/// pairs is broken at random.
#[derive(Debug, Clone, Copy, Default)]
pub struct Smooth;

impl PaddedRule for Smooth {
    const MODE: NeighborMode = NeighborMode::SidesRotated;

    fn eval(&self, seed: i64, c: &PaddedCell) -> i32 {
        let [west, north, east, south] = c.neighbors;
        let along_x = west == east;
        let along_z = north == south;
        match (along_x, along_z) {
            (true, true) => {
                if CellRng::new(seed, c.x, c.z).next_int_const::<2>() == 0 {
                    west
                } else {
                    north
                }
            }
            (true, false) => west,
            (false, true) => north,
            (false, false) => c.center,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::cell;

    #[test]
    fn test_smooth_pairs() {
        assert_eq!(Smooth.eval(0, &cell(0, 0, 9, [1, 2, 1, 3])), 1);
        assert_eq!(Smooth.eval(0, &cell(0, 0, 9, [1, 2, 4, 2])), 2);
        assert_eq!(Smooth.eval(0, &cell(0, 0, 9, [1, 2, 3, 4])), 9);

        let mut seen = [false; 2];
        for x in 0..64 {
            match Smooth.eval(11, &cell(x, 0, 9, [1, 2, 1, 2])) {
                1 => seen[0] = true,
                2 => seen[1] = true,
                other => panic!("unexpected {other}"),
            }
        }
        assert_eq!(seen, [true, true]);
    }
}
