//! Beaches and shores where land meets ocean.

use super::BiomeContext;
use crate::gather::NeighborMode;
use crate::padded::{PaddedCell, PaddedRule};

/// Inserts beaches, stone and cold beaches, mushroom shores and jungle edges.
#[derive(Debug, Clone, Copy)]
pub struct Shore<'a> {
    ctx: BiomeContext<'a>,
}

impl<'a> Shore<'a> {
    /// Rule over `ctx`.
    pub fn new(ctx: BiomeContext<'a>) -> Self {
        Self { ctx }
    }

    fn near_ocean(&self, v: &[i32; 4]) -> bool {
        v.iter().any(|&n| self.ctx.table.is_oceanic(n))
    }

    fn beach_if_near_ocean(&self, center: i32, v: &[i32; 4], beach: i32) -> i32 {
        if !self.ctx.table.is_oceanic(center) && self.near_ocean(v) {
            beach
        } else {
            center
        }
    }
}

impl PaddedRule for Shore<'_> {
    const MODE: NeighborMode = NeighborMode::Sides;

    fn eval(&self, _seed: i64, c: &PaddedCell) -> i32 {
        let table = self.ctx.table;
        let ids = self.ctx.ids;
        let (center, v) = (c.center, &c.neighbors);

        if center == ids.mushroom_island {
            return if v.contains(&ids.ocean) {
                ids.mushroom_island_shore
            } else {
                center
            };
        }

        if table.is_jungle(center) {
            return if !v.iter().all(|&n| table.is_jungle_compatible(n)) {
                ids.jungle_edge
            } else if self.near_ocean(v) {
                ids.beach
            } else {
                center
            };
        }

        if center == ids.extreme_hills
            || center == ids.extreme_hills_with_trees
            || center == ids.extreme_hills_edge
        {
            return self.beach_if_near_ocean(center, v, ids.stone_beach);
        }

        if table.is_snowy(center) {
            return self.beach_if_near_ocean(center, v, ids.cold_beach);
        }

        if center == ids.mesa || center == ids.mesa_rock {
            if self.near_ocean(v) {
                return center;
            }
            return if v.iter().all(|&n| table.is_mesa(n)) {
                center
            } else {
                ids.desert
            };
        }

        if center != ids.ocean
            && center != ids.deep_ocean
            && center != ids.river
            && center != ids.swampland
            && self.near_ocean(v)
        {
            return ids.beach;
        }
        center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome_ids::BiomeIds;
    use crate::rules::test_support::cell;
    use crate::vanilla::vanilla_table;

    #[test]
    fn test_shore_cases() {
        let table = vanilla_table().unwrap();
        let ids = BiomeIds::default();
        let rule = Shore::new(BiomeContext::new(&table, &ids));
        let eval = |center, v| rule.eval(0, &cell(0, 0, center, v));
        let (f, o) = (ids.forest, ids.ocean);

        assert_eq!(eval(f, [f, f, o, f]), ids.beach);
        assert_eq!(eval(f, [f, f, f, f]), f);
        assert_eq!(eval(ids.swampland, [o, o, o, o]), ids.swampland);
        assert_eq!(eval(ids.mushroom_island, [14, 14, o, 14]), ids.mushroom_island_shore);
        assert_eq!(eval(ids.mushroom_island, [14, 14, 24, 14]), ids.mushroom_island);
        assert_eq!(eval(ids.extreme_hills, [3, 3, 24, 3]), ids.stone_beach);
        assert_eq!(eval(ids.ice_plains, [12, 10, 12, 12]), ids.cold_beach);
        assert_eq!(eval(ids.frozen_ocean, [10, 0, 10, 10]), ids.frozen_ocean);
        assert_eq!(eval(ids.jungle, [21, 21, ids.plains, 21]), ids.jungle_edge);
        assert_eq!(eval(ids.jungle, [21, 21, o, 21]), ids.beach);
        assert_eq!(eval(ids.jungle, [21, f, 23, 22]), ids.jungle);
        assert_eq!(eval(ids.mesa, [37, 38, 37, ids.plains]), ids.desert);
        assert_eq!(eval(ids.mesa, [37, 38, 37, 39]), ids.mesa);
        assert_eq!(eval(ids.mesa, [37, 37, o, 1]), ids.mesa);
        assert_eq!(eval(ids.mesa_clear_rock, [37, 37, o, 37]), ids.beach);
    }
}
