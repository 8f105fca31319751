//! Hill and mutated variants, keyed off the river noise.

use super::BiomeContext;
use crate::gather::NeighborMode;
use crate::padded::{PaddedCell, PaddedRule};
use biomegen_core::CellRng;

/// Period of the river noise sub-value that selects hills and mutations.
const RIVER_PERIOD: i32 = 29;

/// Replaces biomes with their hill variant, or their mutated variant where the
/// river noise says so, when enough sides agree.
///
/// The side input is the zoomed river-init noise laid out like the output.
#[derive(Debug, Clone, Copy)]
pub struct Hills<'a> {
    ctx: BiomeContext<'a>,
}

impl<'a> Hills<'a> {
    /// Rule over `ctx`.
    pub fn new(ctx: BiomeContext<'a>) -> Self {
        Self { ctx }
    }

    /// The hill variant of `center`, `center` itself when it has none.
    fn hill_for(&self, center: i32, rng: &mut CellRng) -> i32 {
        let ids = self.ctx.ids;
        let table = self.ctx.table;
        let hill = if center == ids.desert {
            ids.desert_hills
        } else if center == ids.forest {
            ids.forest_hills
        } else if center == ids.birch_forest {
            ids.birch_forest_hills
        } else if center == ids.roofed_forest {
            ids.plains
        } else if center == ids.taiga {
            ids.taiga_hills
        } else if center == ids.redwood_taiga {
            ids.redwood_taiga_hills
        } else if center == ids.cold_taiga {
            ids.cold_taiga_hills
        } else if center == ids.plains {
            if rng.next_int_const::<3>() == 0 {
                ids.forest_hills
            } else {
                ids.forest
            }
        } else if center == ids.ice_plains {
            ids.ice_mountains
        } else if center == ids.jungle {
            ids.jungle_hills
        } else if center == ids.ocean {
            ids.deep_ocean
        } else if center == ids.extreme_hills {
            ids.extreme_hills_with_trees
        } else if center == ids.savanna {
            ids.savanna_plateau
        } else if table.equal_or_mesa_plateau(center, ids.mesa_rock) {
            ids.mesa
        } else if center == ids.deep_ocean && rng.next_int_const::<3>() == 0 {
            if rng.next_int_const::<2>() == 0 {
                ids.plains
            } else {
                ids.forest
            }
        } else {
            center
        };
        if table.is_valid(hill) {
            hill
        } else {
            -1
        }
    }
}

impl PaddedRule for Hills<'_> {
    const MODE: NeighborMode = NeighborMode::Sides;
    const SIDE_INPUT: bool = true;

    fn eval(&self, seed: i64, c: &PaddedCell) -> i32 {
        let table = self.ctx.table;
        let center = c.center;
        let river = c.side;
        let sub = (river - 2) % RIVER_PERIOD;

        if center != 0 && river >= 2 && sub == 1 && !table.is_mutation(center) {
            let mutated = table.mutation_for(center);
            return if mutated < 0 { center } else { mutated };
        }

        let mut rng = CellRng::new(seed, c.x, c.z);
        if sub == 0 {
            rng.skip::<1>();
        } else if rng.next_int_const::<3>() != 0 {
            return center;
        }

        let mut hill = self.hill_for(center, &mut rng);
        if sub == 0 && hill != center {
            hill = table.mutation_for(hill);
            if hill < 0 {
                hill = center;
            }
        }
        // an unregistered substitute still replaces the centre as -1
        if hill == center {
            return center;
        }

        let agreeing = c
            .neighbors
            .iter()
            .filter(|&&n| table.equal_or_mesa_plateau(n, center))
            .count();
        if agreeing >= 3 {
            hill
        } else {
            center
        }
    }
}
