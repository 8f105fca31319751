//! Climate classes to concrete biomes, and the edge fix-ups that follow.

use super::climate::SPECIAL_MASK;
use super::BiomeContext;
use crate::gather::NeighborMode;
use crate::padded::{PaddedCell, PaddedRule};
use crate::translation::TranslationRule;
use biomegen_core::{CellRng, FastModI64, LayerError};
use serde::{Deserialize, Serialize};

/// One weighted candidate of a climate's biome list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiomeEntry {
    /// Biome id.
    pub biome: i32,
    /// Relative weight.
    pub weight: i32,
}

const fn entry(biome: i32, weight: i32) -> BiomeEntry {
    BiomeEntry { biome, weight }
}

/// Weighted biome list for one climate class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiomeList {
    /// A modded list draws over its exact total weight; an unmodded one draws
    /// in steps of ten.
    #[serde(default)]
    pub modded: bool,
    /// Candidates, consumed in order.
    pub entries: Vec<BiomeEntry>,
}

impl BiomeList {
    fn vanilla(entries: &[BiomeEntry]) -> Self {
        Self {
            modded: false,
            entries: entries.to_vec(),
        }
    }
}

/// Biome lists and overrides for [`SelectBiome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeSettings {
    /// Every land cell becomes this biome when non-negative.
    pub fixed_biome: i32,
    /// Candidates for warm land.
    pub desert: BiomeList,
    /// Candidates for medium land.
    pub warm: BiomeList,
    /// Candidates for cold land.
    pub cool: BiomeList,
    /// Candidates for frozen land.
    pub icy: BiomeList,
}

impl Default for BiomeSettings {
    fn default() -> Self {
        Self {
            fixed_biome: -1,
            desert: BiomeList::vanilla(&[entry(2, 30), entry(35, 20), entry(1, 10)]),
            warm: BiomeList::vanilla(&[
                entry(4, 10),
                entry(29, 10),
                entry(3, 10),
                entry(1, 10),
                entry(27, 10),
                entry(6, 10),
            ]),
            cool: BiomeList::vanilla(&[entry(4, 10), entry(3, 10), entry(5, 10), entry(1, 10)]),
            icy: BiomeList::vanilla(&[entry(12, 30), entry(30, 10)]),
        }
    }
}

impl BiomeSettings {
    /// Validate the lists and precompute their draw bounds.
    pub fn prepare(&self) -> Result<BiomePicker, LayerError> {
        Ok(BiomePicker {
            fixed_biome: self.fixed_biome,
            desert: WeightedList::new("desert", &self.desert)?,
            warm: WeightedList::new("warm", &self.warm)?,
            cool: WeightedList::new("cool", &self.cool)?,
            icy: WeightedList::new("icy", &self.icy)?,
        })
    }
}

#[derive(Debug, Clone)]
struct WeightedList {
    entries: Vec<BiomeEntry>,
    draw: FastModI64,
    step: i32,
}

impl WeightedList {
    fn new(name: &str, list: &BiomeList) -> Result<Self, LayerError> {
        if list.entries.iter().any(|e| e.weight <= 0) {
            return Err(LayerError::InvalidConfig(format!(
                "{name} biome list has a non-positive weight"
            )));
        }
        let total: i32 = list.entries.iter().map(|e| e.weight).sum();
        let (bound, step) = if list.modded {
            (total, 1)
        } else {
            (total / 10, 10)
        };
        if bound <= 0 {
            return Err(LayerError::InvalidConfig(format!(
                "{name} biome list total weight {total} is too small"
            )));
        }
        Ok(Self {
            entries: list.entries.clone(),
            draw: FastModI64::new(bound as i64),
            step,
        })
    }

    fn pick(&self, rng: &mut CellRng) -> i32 {
        let mut weight = rng.next_int_fast(&self.draw) * self.step;
        for e in &self.entries {
            weight -= e.weight;
            if weight < 0 {
                return e.biome;
            }
        }
        // weight < total always holds, so the loop returns
        self.entries[self.entries.len() - 1].biome
    }
}

/// Prepared [`BiomeSettings`].
#[derive(Debug, Clone)]
pub struct BiomePicker {
    fixed_biome: i32,
    desert: WeightedList,
    warm: WeightedList,
    cool: WeightedList,
    icy: WeightedList,
}

/// Replaces climate classes with biomes drawn from the weighted lists.
///
/// Special-tagged warm, medium and cold cells become mesa plateaus, jungle and
/// redwood taiga respectively.
#[derive(Debug, Clone, Copy)]
pub struct SelectBiome<'a> {
    ctx: BiomeContext<'a>,
    picker: &'a BiomePicker,
}

impl<'a> SelectBiome<'a> {
    /// Rule drawing from `picker`.
    pub fn new(ctx: BiomeContext<'a>, picker: &'a BiomePicker) -> Self {
        Self { ctx, picker }
    }
}

impl TranslationRule for SelectBiome<'_> {
    fn eval(&self, seed: i64, x: i32, z: i32, value: i32, _side: i32) -> i32 {
        let ids = self.ctx.ids;
        let special = (value & SPECIAL_MASK) >> 8;
        let class = value & !SPECIAL_MASK;

        if self.picker.fixed_biome >= 0 {
            return self.picker.fixed_biome;
        }
        if self.ctx.table.is_oceanic(class) || class == ids.mushroom_island {
            return class;
        }

        let mut rng = CellRng::new(seed, x, z);
        match class {
            1 if special > 0 => {
                if rng.next_int_const::<3>() == 0 {
                    ids.mesa_clear_rock
                } else {
                    ids.mesa_rock
                }
            }
            1 => self.picker.desert.pick(&mut rng),
            2 if special > 0 => ids.jungle,
            2 => self.picker.warm.pick(&mut rng),
            3 if special > 0 => ids.redwood_taiga,
            3 => self.picker.cool.pick(&mut rng),
            4 => self.picker.icy.pick(&mut rng),
            _ => ids.mushroom_island,
        }
    }
}

/// Inserts edge biomes where incompatible biomes meet.
#[derive(Debug, Clone, Copy)]
pub struct BiomeEdge<'a> {
    ctx: BiomeContext<'a>,
}

impl<'a> BiomeEdge<'a> {
    /// Rule over `ctx`.
    pub fn new(ctx: BiomeContext<'a>) -> Self {
        Self { ctx }
    }

    /// `to` unless every neighbour matches `from` under `related`.
    fn edge(
        &self,
        center: i32,
        v: &[i32; 4],
        from: i32,
        to: i32,
        related: impl Fn(i32, i32) -> bool,
    ) -> i32 {
        if v.iter().all(|&n| related(n, from)) {
            center
        } else {
            to
        }
    }
}

impl PaddedRule for BiomeEdge<'_> {
    const MODE: NeighborMode = NeighborMode::Sides;

    fn eval(&self, _seed: i64, c: &PaddedCell) -> i32 {
        let table = self.ctx.table;
        let ids = self.ctx.ids;
        let (center, v) = (c.center, &c.neighbors);
        let equal = |a, b| table.equal_or_mesa_plateau(a, b);

        if equal(center, ids.extreme_hills) {
            return self.edge(center, v, ids.extreme_hills, ids.extreme_hills_edge, |a, b| {
                table.can_be_neighbors(a, b)
            });
        }
        if center == ids.mesa_rock {
            return self.edge(center, v, ids.mesa_rock, ids.mesa, equal);
        }
        if center == ids.mesa_clear_rock {
            return self.edge(center, v, ids.mesa_clear_rock, ids.mesa, equal);
        }
        if center == ids.redwood_taiga {
            return self.edge(center, v, ids.redwood_taiga, ids.taiga, equal);
        }

        if center == ids.desert {
            if v.contains(&ids.ice_plains) {
                return ids.extreme_hills_with_trees;
            }
        } else if center == ids.swampland {
            if v
                .iter()
                .any(|&n| n == ids.desert || n == ids.cold_taiga || n == ids.ice_plains)
            {
                return ids.plains;
            }
            if v.contains(&ids.jungle) {
                return ids.jungle_edge;
            }
        }
        center
    }
}

/// Turns one plains cell in fifty-seven into sunflower plains.
#[derive(Debug, Clone, Copy)]
pub struct RareBiome<'a> {
    ctx: BiomeContext<'a>,
}

impl<'a> RareBiome<'a> {
    /// Rule over `ctx`.
    pub fn new(ctx: BiomeContext<'a>) -> Self {
        Self { ctx }
    }
}

impl TranslationRule for RareBiome<'_> {
    fn eval(&self, seed: i64, x: i32, z: i32, value: i32, _side: i32) -> i32 {
        if CellRng::new(seed, x, z).next_int_const::<57>() == 0 && value == self.ctx.ids.plains {
            self.ctx.ids.mutated_plains
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome_ids::BiomeIds;
    use crate::rules::test_support::cell;
    use crate::vanilla::vanilla_table;

    #[test]
    fn test_select_biome_draws_from_class_lists() {
        let table = vanilla_table().unwrap();
        let ids = BiomeIds::default();
        let ctx = BiomeContext::new(&table, &ids);
        let picker = BiomeSettings::default().prepare().unwrap();
        let rule = SelectBiome::new(ctx, &picker);

        for x in 0..300 {
            assert_eq!(rule.eval(1, x, 0, 0, 0), 0);
            assert_eq!(rule.eval(1, x, 0, ids.mushroom_island, 0), ids.mushroom_island);
            assert!([2, 35, 1].contains(&rule.eval(1, x, 0, 1, 0)));
            assert!([4, 29, 3, 1, 27, 6].contains(&rule.eval(1, x, 0, 2, 0)));
            assert!([4, 3, 5, 1].contains(&rule.eval(1, x, 0, 3, 0)));
            assert!([12, 30].contains(&rule.eval(1, x, 0, 4, 0)));
            assert!([38, 39].contains(&rule.eval(1, x, 0, 1 | 0x300, 0)));
            assert_eq!(rule.eval(1, x, 0, 2 | 0x100, 0), ids.jungle);
            assert_eq!(rule.eval(1, x, 0, 3 | 0xF00, 0), ids.redwood_taiga);
            assert_eq!(rule.eval(1, x, 0, 9, 0), ids.mushroom_island);
        }
    }

    #[test]
    fn test_fixed_biome_overrides_everything() {
        let table = vanilla_table().unwrap();
        let ids = BiomeIds::default();
        let settings = BiomeSettings {
            fixed_biome: 6,
            ..BiomeSettings::default()
        };
        let picker = settings.prepare().unwrap();
        let rule = SelectBiome::new(BiomeContext::new(&table, &ids), &picker);
        assert_eq!(rule.eval(0, 0, 0, 0, 0), 6);
        assert_eq!(rule.eval(0, 5, 5, 3, 0), 6);
    }

    #[test]
    fn test_prepare_rejects_unusable_lists() {
        let mut settings = BiomeSettings::default();
        settings.icy.entries = vec![entry(12, 5)];
        assert!(settings.prepare().is_err());
        settings.icy.modded = true;
        assert!(settings.prepare().is_ok());
        settings.cool.entries[0].weight = 0;
        assert!(settings.prepare().is_err());
    }

    #[test]
    fn test_biome_edge_rules() {
        let table = vanilla_table().unwrap();
        let ids = BiomeIds::default();
        let rule = BiomeEdge::new(BiomeContext::new(&table, &ids));
        let eh = ids.extreme_hills;

        // medium hills tolerate any registered neighbour
        assert_eq!(rule.eval(0, &cell(0, 0, eh, [eh, eh, 200, eh])), ids.extreme_hills_edge);
        assert_eq!(rule.eval(0, &cell(0, 0, eh, [eh, ids.ice_plains, ids.desert, eh])), eh);
        assert_eq!(
            rule.eval(0, &cell(0, 0, ids.mesa_rock, [ids.mesa_rock, ids.mesa_clear_rock, 38, 38])),
            ids.mesa_rock
        );
        assert_eq!(rule.eval(0, &cell(0, 0, ids.mesa_rock, [38, 38, ids.desert, 38])), ids.mesa);
        assert_eq!(
            rule.eval(0, &cell(0, 0, ids.redwood_taiga, [32, 32, ids.plains, 32])),
            ids.taiga
        );
        assert_eq!(
            rule.eval(0, &cell(0, 0, ids.desert, [2, ids.ice_plains, 2, 2])),
            ids.extreme_hills_with_trees
        );
        assert_eq!(
            rule.eval(0, &cell(0, 0, ids.swampland, [6, 6, ids.jungle, 6])),
            ids.jungle_edge
        );
        assert_eq!(
            rule.eval(0, &cell(0, 0, ids.swampland, [ids.jungle, 6, ids.cold_taiga, 6])),
            ids.plains
        );
        assert_eq!(rule.eval(0, &cell(0, 0, ids.forest, [2, 12, 21, 0])), ids.forest);
    }

    #[test]
    fn test_rare_biome_only_touches_plains() {
        let table = vanilla_table().unwrap();
        let ids = BiomeIds::default();
        let rule = RareBiome::new(BiomeContext::new(&table, &ids));
        let mut rare = 0;
        for x in 0..570 {
            let v = rule.eval(4, x, 2, ids.plains, 0);
            assert!(v == ids.plains || v == ids.mutated_plains);
            rare += (v == ids.mutated_plains) as i32;
            assert_eq!(rule.eval(4, x, 2, ids.desert, 0), ids.desert);
        }
        assert!(rare > 0 && rare < 30, "rare {rare}");
    }
}
