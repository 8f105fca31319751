//! Neighbour gathering for padded layers.
//!
//! Every padded rule reads its centre cell plus four neighbours at fixed
//! offsets. Gathering is expressed over an index set so the per-row loop can
//! collect several consecutive cells at once; [`gather`] is the scalar
//! reference the lane version must agree with.

use serde::{Deserialize, Serialize};
use std::array;

/// Cells gathered per step in the padded row loop.
pub const DEFAULT_LANES: usize = 4;

/// Which four neighbours a padded rule sees, and in what order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborMode {
    /// Diagonals: `(-1,-1), (1,-1), (-1,1), (1,1)`.
    Corners,
    /// Orthogonals: `(-1,0), (0,-1), (0,1), (1,0)`.
    Sides,
    /// Orthogonals with the last two swapped: `(-1,0), (0,-1), (1,0), (0,1)`,
    /// so the x pair is `[0], [2]` and the z pair is `[1], [3]`.
    SidesRotated,
}

impl NeighborMode {
    /// `(dx, dz)` of each neighbour, in rule order.
    pub const fn deltas(self) -> [(isize, isize); 4] {
        match self {
            Self::Corners => [(-1, -1), (1, -1), (-1, 1), (1, 1)],
            Self::Sides => [(-1, 0), (0, -1), (0, 1), (1, 0)],
            Self::SidesRotated => [(-1, 0), (0, -1), (1, 0), (0, 1)],
        }
    }

    /// Flat offsets relative to the centre in a buffer whose rows are `stride`
    /// cells long.
    pub fn offsets(self, stride: usize) -> [isize; 4] {
        self.deltas().map(|(dx, dz)| dx * stride as isize + dz)
    }
}

/// Read `buf[base + offsets[i]]` for every offset.
#[inline(always)]
pub fn gather<const N: usize>(buf: &[i32], base: usize, offsets: &[isize; N]) -> [i32; N] {
    array::from_fn(|i| buf[base.wrapping_add_signed(offsets[i])])
}

/// Gather the neighbours of `LANES` consecutive centres starting at `base`.
#[inline(always)]
pub fn gather_lanes<const LANES: usize>(
    buf: &[i32],
    base: usize,
    offsets: &[isize; 4],
) -> [[i32; 4]; LANES] {
    array::from_fn(|lane| gather(buf, base + lane, offsets))
}
