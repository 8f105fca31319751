//! Land/ocean rules of the continental stage.

use super::BiomeContext;
use crate::gather::NeighborMode;
use crate::padded::{PaddedCell, PaddedRule};
use crate::source::SourceRule;
use biomegen_core::{CellRng, FastModI64};

/// Seeds the world: the origin is always land, elsewhere one cell in ten.
#[derive(Debug, Clone, Copy, Default)]
pub struct Island;

impl SourceRule for Island {
    fn eval(&self, seed: i64, x: i32, z: i32) -> i32 {
        if x == 0 && z == 0 {
            return 1;
        }
        (CellRng::new(seed, x, z).next_int_const::<10>() == 0) as i32
    }
}

/// Divisors for the shrinking-probability pick among land corners.
const PICK_BOUNDS: [FastModI64; 4] = [
    FastModI64::new(1),
    FastModI64::new(2),
    FastModI64::new(3),
    FastModI64::new(4),
];

/// Grows land into ocean next to land corners and erodes coasts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddIsland;

impl PaddedRule for AddIsland {
    const MODE: NeighborMode = NeighborMode::Corners;

    fn eval(&self, seed: i64, c: &PaddedCell) -> i32 {
        let center = c.center;
        let v = c.neighbors;
        let mut rng = CellRng::new(seed, c.x, c.z);

        if center != 0 || v.iter().all(|&n| n == 0) {
            if center > 0 && v.contains(&0) && rng.next_int_const::<5>() == 0 {
                return if center == 4 { 4 } else { 0 };
            }
            return center;
        }

        // Every land corner replaces the pick with probability 1/n.
        let mut bound = 0;
        let mut picked = 1;
        for &n in &v {
            if n != 0 {
                if rng.next_int_fast(&PICK_BOUNDS[bound]) == 0 {
                    picked = n;
                }
                bound += 1;
            }
        }

        if rng.next_int_const::<3>() == 0 {
            picked
        } else if picked == 4 {
            4
        } else {
            0
        }
    }
}

/// Turns half of the ocean cells fully enclosed by ocean into land.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveTooMuchOcean;

impl PaddedRule for RemoveTooMuchOcean {
    const MODE: NeighborMode = NeighborMode::Sides;

    fn eval(&self, seed: i64, c: &PaddedCell) -> i32 {
        if c.center == 0
            && c.neighbors.iter().all(|&n| n == 0)
            && CellRng::new(seed, c.x, c.z).next_int_const::<2>() == 0
        {
            return 1;
        }
        c.center
    }
}

/// Places rare mushroom islands in open ocean.
#[derive(Debug, Clone, Copy)]
pub struct AddMushroomIsland<'a> {
    ctx: BiomeContext<'a>,
}

impl<'a> AddMushroomIsland<'a> {
    /// Rule writing `ctx.ids.mushroom_island`.
    pub fn new(ctx: BiomeContext<'a>) -> Self {
        Self { ctx }
    }
}

impl PaddedRule for AddMushroomIsland<'_> {
    const MODE: NeighborMode = NeighborMode::Corners;

    fn eval(&self, seed: i64, c: &PaddedCell) -> i32 {
        if c.center == 0
            && c.neighbors.iter().all(|&n| n == 0)
            && CellRng::new(seed, c.x, c.z).next_int_const::<100>() == 0
        {
            return self.ctx.ids.mushroom_island;
        }
        c.center
    }
}

/// Marks ocean cells with ocean on all four sides as deep ocean.
#[derive(Debug, Clone, Copy)]
pub struct DeepOcean<'a> {
    ctx: BiomeContext<'a>,
}

impl<'a> DeepOcean<'a> {
    /// Rule writing `ctx.ids.deep_ocean`.
    pub fn new(ctx: BiomeContext<'a>) -> Self {
        Self { ctx }
    }
}

impl PaddedRule for DeepOcean<'_> {
    const MODE: NeighborMode = NeighborMode::Sides;

    fn eval(&self, _seed: i64, c: &PaddedCell) -> i32 {
        if c.center == 0 && c.neighbors.iter().all(|&n| n == 0) {
            self.ctx.ids.deep_ocean
        } else {
            c.center
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome_ids::BiomeIds;
    use crate::biome_table::BiomeTable;
    use crate::rules::test_support::cell;

    #[test]
    fn test_island_origin_is_land() {
        for seed in [0, 1, -1, 12345, i64::MAX, i64::MIN] {
            assert_eq!(Island.eval(seed, 0, 0), 1);
        }
    }

    #[test]
    fn test_island_pinned_scenario() {
        let cells: Vec<i32> = [(0, 0), (0, 1), (1, 0), (1, 1)]
            .iter()
            .map(|&(x, z)| Island.eval(12345, x, z))
            .collect();
        assert_eq!(cells, vec![1, 0, 0, 0]);
        assert!(cells.iter().all(|v| *v == 0 || *v == 1));
    }

    #[test]
    fn test_add_island_keeps_inland_cells() {
        for x in -10..10 {
            assert_eq!(AddIsland.eval(99, &cell(x, 3, 2, [1, 2, 3, 3])), 2);
            assert_eq!(AddIsland.eval(99, &cell(x, 3, 0, [0, 0, 0, 0])), 0);
        }
    }

    #[test]
    fn test_add_island_coast_outcomes() {
        for x in -50..50 {
            let coast = AddIsland.eval(7, &cell(x, 0, 3, [0, 1, 1, 1]));
            assert!(coast == 3 || coast == 0);
            let frozen = AddIsland.eval(7, &cell(x, 0, 4, [0, 0, 0, 0]));
            assert_eq!(frozen, 4);
            let grown = AddIsland.eval(7, &cell(x, 0, 0, [0, 2, 0, 0]));
            assert!(grown == 0 || grown == 2);
        }
    }

    #[test]
    fn test_remove_too_much_ocean_only_touches_open_ocean() {
        let mut flipped = 0;
        for x in 0..200 {
            let v = RemoveTooMuchOcean.eval(5, &cell(x, 0, 0, [0, 0, 0, 0]));
            flipped += v;
            assert_eq!(RemoveTooMuchOcean.eval(5, &cell(x, 0, 0, [0, 1, 0, 0])), 0);
            assert_eq!(RemoveTooMuchOcean.eval(5, &cell(x, 0, 3, [0, 0, 0, 0])), 3);
        }
        assert!(flipped > 50 && flipped < 150, "flipped {flipped}");
    }

    #[test]
    fn test_deep_ocean_and_mushroom() {
        let table = BiomeTable::empty();
        let ids = BiomeIds::default();
        let ctx = BiomeContext::new(&table, &ids);

        let deep = DeepOcean::new(ctx);
        assert_eq!(deep.eval(0, &cell(0, 0, 0, [0, 0, 0, 0])), ids.deep_ocean);
        assert_eq!(deep.eval(0, &cell(0, 0, 0, [0, 0, 1, 0])), 0);

        let mushroom = AddMushroomIsland::new(ctx);
        let placed = (0..2000)
            .filter(|&x| mushroom.eval(3, &cell(x, 7, 0, [0, 0, 0, 0])) == ids.mushroom_island)
            .count();
        assert!(placed > 0 && placed < 60, "placed {placed}");
        assert_eq!(mushroom.eval(3, &cell(0, 0, 2, [0, 0, 0, 0])), 2);
    }
}
