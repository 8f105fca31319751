//! Numeric ids of the biomes the generation rules refer to by name.

use serde::{Deserialize, Serialize};

/// Biome ids consulted by the concrete rules.
///
/// Defaults are the 1.12 overworld registry. A host with a remapped registry
/// overrides individual fields in its pipeline config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeIds {
    pub ocean: i32,
    pub plains: i32,
    pub desert: i32,
    pub extreme_hills: i32,
    pub forest: i32,
    pub taiga: i32,
    pub swampland: i32,
    pub river: i32,
    pub frozen_ocean: i32,
    pub frozen_river: i32,
    pub ice_plains: i32,
    pub ice_mountains: i32,
    pub mushroom_island: i32,
    pub mushroom_island_shore: i32,
    pub beach: i32,
    pub desert_hills: i32,
    pub forest_hills: i32,
    pub taiga_hills: i32,
    pub extreme_hills_edge: i32,
    pub jungle: i32,
    pub jungle_hills: i32,
    pub jungle_edge: i32,
    pub deep_ocean: i32,
    pub stone_beach: i32,
    pub cold_beach: i32,
    pub birch_forest: i32,
    pub birch_forest_hills: i32,
    pub roofed_forest: i32,
    pub cold_taiga: i32,
    pub cold_taiga_hills: i32,
    pub redwood_taiga: i32,
    pub redwood_taiga_hills: i32,
    pub extreme_hills_with_trees: i32,
    pub savanna: i32,
    pub savanna_plateau: i32,
    pub mesa: i32,
    pub mesa_rock: i32,
    pub mesa_clear_rock: i32,
    pub mutated_plains: i32,
}

impl Default for BiomeIds {
    fn default() -> Self {
        Self {
            ocean: 0,
            plains: 1,
            desert: 2,
            extreme_hills: 3,
            forest: 4,
            taiga: 5,
            swampland: 6,
            river: 7,
            frozen_ocean: 10,
            frozen_river: 11,
            ice_plains: 12,
            ice_mountains: 13,
            mushroom_island: 14,
            mushroom_island_shore: 15,
            beach: 16,
            desert_hills: 17,
            forest_hills: 18,
            taiga_hills: 19,
            extreme_hills_edge: 20,
            jungle: 21,
            jungle_hills: 22,
            jungle_edge: 23,
            deep_ocean: 24,
            stone_beach: 25,
            cold_beach: 26,
            birch_forest: 27,
            birch_forest_hills: 28,
            roofed_forest: 29,
            cold_taiga: 30,
            cold_taiga_hills: 31,
            redwood_taiga: 32,
            redwood_taiga_hills: 33,
            extreme_hills_with_trees: 34,
            savanna: 35,
            savanna_plateau: 36,
            mesa: 37,
            mesa_rock: 38,
            mesa_clear_rock: 39,
            mutated_plains: 129,
        }
    }
}
