//! River noise, river outlines and the final river merge.

use super::BiomeContext;
use crate::gather::NeighborMode;
use crate::padded::{PaddedCell, PaddedRule};
use crate::translation::TranslationRule;
use biomegen_core::{CellRng, FastModI64};

const NOISE_RANGE: FastModI64 = FastModI64::new(299_999);

/// Seeds land cells with noise in `2..300001`; ocean stays `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiverInit;

impl TranslationRule for RiverInit {
    fn eval(&self, seed: i64, x: i32, z: i32, value: i32, _side: i32) -> i32 {
        if value > 0 {
            CellRng::new(seed, x, z).next_int_fast(&NOISE_RANGE) + 2
        } else {
            0
        }
    }
}

/// Marks cells whose noise parity differs from a side neighbour as river.
#[derive(Debug, Clone, Copy)]
pub struct River {
    river: i32,
}

impl River {
    /// Rule writing `river` on boundaries.
    pub fn new(river: i32) -> Self {
        Self { river }
    }
}

#[inline]
fn parity(v: i32) -> i32 {
    if v >= 2 {
        2 + (v & 1)
    } else {
        v
    }
}

impl PaddedRule for River {
    const MODE: NeighborMode = NeighborMode::Sides;

    fn eval(&self, _seed: i64, c: &PaddedCell) -> i32 {
        let center = parity(c.center);
        if c.neighbors.iter().all(|&n| parity(n) == center) {
            -1
        } else {
            self.river
        }
    }
}

/// Overlays the river grid (side input) onto the biome grid.
#[derive(Debug, Clone, Copy)]
pub struct RiverMix<'a> {
    ctx: BiomeContext<'a>,
}

impl<'a> RiverMix<'a> {
    /// Rule over `ctx`.
    pub fn new(ctx: BiomeContext<'a>) -> Self {
        Self { ctx }
    }
}

impl TranslationRule for RiverMix<'_> {
    const SIDE_INPUT: bool = true;

    fn eval(&self, _seed: i64, _x: i32, _z: i32, value: i32, river: i32) -> i32 {
        let ids = self.ctx.ids;
        if self.ctx.table.is_oceanic(value) || river != ids.river {
            return value;
        }
        if value == ids.ice_plains {
            ids.frozen_river
        } else if value == ids.mushroom_island || value == ids.mushroom_island_shore {
            ids.mushroom_island_shore
        } else {
            river & 0xFF
        }
    }
}
