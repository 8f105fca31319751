//! Built-in descriptors for the 1.12 overworld biome registry.
//!
//! Hosts normally push their own registry through the reload interface. The
//! CLI and the tests use these descriptors to produce the same arrays.

use crate::biome_table::{BiomeFlags, BiomeRelation, BiomeTable, BIOME_COUNT};
use crate::rules::BiomeSettings;
use crate::stack::{LayerKind, LayerSpec, StackConfig};
use biomegen_core::LayerError;

/// Implementation family of a biome. Members of a family compare equal in
/// [`BiomeTable::equal_or_mesa_plateau`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiomeFamily {
    /// Oceans of every depth and temperature.
    Ocean,
    /// Plains and sunflower plains.
    Plains,
    /// Deserts.
    Desert,
    /// Extreme hills and their edges.
    Hills,
    /// Forests, birch and roofed forests.
    Forest,
    /// Tall birch forests.
    ForestMutated,
    /// Every taiga variant.
    Taiga,
    /// Swamps.
    Swamp,
    /// Rivers.
    River,
    /// Nether.
    Hell,
    /// End.
    End,
    /// Ice plains and mountains.
    Snow,
    /// Mushroom islands and their shores.
    MushroomIsland,
    /// Sand and snowy beaches.
    Beach,
    /// Jungles.
    Jungle,
    /// Stone beaches.
    StoneBeach,
    /// Savannas.
    Savanna,
    /// Shattered savannas.
    SavannaMutated,
    /// Mesas.
    Mesa,
    /// The void.
    Void,
}

/// Climate bucket used by [`BiomeTable::can_be_neighbors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempCategory {
    /// Oceans.
    Ocean,
    /// Below 0.2.
    Cold,
    /// Neighbours everything.
    Medium,
    /// 1.0 and above.
    Warm,
}

/// Static description of one registered biome.
#[derive(Debug, Clone, Copy)]
pub struct VanillaBiome {
    /// Registry id.
    pub id: i32,
    /// Registry name.
    pub name: &'static str,
    /// Implementation family.
    pub family: BiomeFamily,
    /// Climate bucket.
    pub temp: TempCategory,
    /// Snow-covered.
    pub snowy: bool,
}

const fn biome(
    id: i32,
    name: &'static str,
    family: BiomeFamily,
    temp: TempCategory,
    snowy: bool,
) -> VanillaBiome {
    VanillaBiome {
        id,
        name,
        family,
        temp,
        snowy,
    }
}

use BiomeFamily as F;
use TempCategory as T;

/// Every biome of the 1.12 overworld registry.
pub const VANILLA_BIOMES: &[VanillaBiome] = &[
    biome(0, "ocean", F::Ocean, T::Ocean, false),
    biome(1, "plains", F::Plains, T::Medium, false),
    biome(2, "desert", F::Desert, T::Warm, false),
    biome(3, "extreme_hills", F::Hills, T::Medium, false),
    biome(4, "forest", F::Forest, T::Medium, false),
    biome(5, "taiga", F::Taiga, T::Medium, false),
    biome(6, "swampland", F::Swamp, T::Medium, false),
    biome(7, "river", F::River, T::Medium, false),
    biome(8, "hell", F::Hell, T::Warm, false),
    biome(9, "sky", F::End, T::Medium, false),
    biome(10, "frozen_ocean", F::Ocean, T::Ocean, true),
    biome(11, "frozen_river", F::River, T::Cold, true),
    biome(12, "ice_plains", F::Snow, T::Cold, true),
    biome(13, "ice_mountains", F::Snow, T::Cold, true),
    biome(14, "mushroom_island", F::MushroomIsland, T::Medium, false),
    biome(15, "mushroom_island_shore", F::MushroomIsland, T::Medium, false),
    biome(16, "beach", F::Beach, T::Medium, false),
    biome(17, "desert_hills", F::Desert, T::Warm, false),
    biome(18, "forest_hills", F::Forest, T::Medium, false),
    biome(19, "taiga_hills", F::Taiga, T::Medium, false),
    biome(20, "extreme_hills_edge", F::Hills, T::Medium, false),
    biome(21, "jungle", F::Jungle, T::Medium, false),
    biome(22, "jungle_hills", F::Jungle, T::Medium, false),
    biome(23, "jungle_edge", F::Jungle, T::Medium, false),
    biome(24, "deep_ocean", F::Ocean, T::Ocean, false),
    biome(25, "stone_beach", F::StoneBeach, T::Medium, false),
    biome(26, "cold_beach", F::Beach, T::Cold, true),
    biome(27, "birch_forest", F::Forest, T::Medium, false),
    biome(28, "birch_forest_hills", F::Forest, T::Medium, false),
    biome(29, "roofed_forest", F::Forest, T::Medium, false),
    biome(30, "cold_taiga", F::Taiga, T::Cold, true),
    biome(31, "cold_taiga_hills", F::Taiga, T::Cold, true),
    biome(32, "redwood_taiga", F::Taiga, T::Medium, false),
    biome(33, "redwood_taiga_hills", F::Taiga, T::Medium, false),
    biome(34, "extreme_hills_with_trees", F::Hills, T::Medium, false),
    biome(35, "savanna", F::Savanna, T::Warm, false),
    biome(36, "savanna_plateau", F::Savanna, T::Warm, false),
    biome(37, "mesa", F::Mesa, T::Warm, false),
    biome(38, "mesa_rock", F::Mesa, T::Warm, false),
    biome(39, "mesa_clear_rock", F::Mesa, T::Warm, false),
    biome(127, "void", F::Void, T::Medium, false),
    biome(129, "mutated_plains", F::Plains, T::Medium, false),
    biome(130, "mutated_desert", F::Desert, T::Warm, false),
    biome(131, "mutated_extreme_hills", F::Hills, T::Medium, false),
    biome(132, "mutated_forest", F::Forest, T::Medium, false),
    biome(133, "mutated_taiga", F::Taiga, T::Medium, false),
    biome(134, "mutated_swampland", F::Swamp, T::Medium, false),
    biome(140, "mutated_ice_flats", F::Snow, T::Cold, true),
    biome(149, "mutated_jungle", F::Jungle, T::Medium, false),
    biome(151, "mutated_jungle_edge", F::Jungle, T::Medium, false),
    biome(155, "mutated_birch_forest", F::ForestMutated, T::Medium, false),
    biome(156, "mutated_birch_forest_hills", F::ForestMutated, T::Medium, false),
    biome(157, "mutated_roofed_forest", F::Forest, T::Medium, false),
    biome(158, "mutated_taiga_cold", F::Taiga, T::Cold, true),
    biome(160, "mutated_redwood_taiga", F::Taiga, T::Medium, false),
    biome(161, "mutated_redwood_taiga_hills", F::Taiga, T::Medium, false),
    biome(162, "mutated_extreme_hills_with_trees", F::Hills, T::Medium, false),
    biome(163, "mutated_savanna", F::SavannaMutated, T::Warm, false),
    biome(164, "mutated_savanna_rock", F::SavannaMutated, T::Warm, false),
    biome(165, "mutated_mesa", F::Mesa, T::Warm, false),
    biome(166, "mutated_mesa_rock", F::Mesa, T::Warm, false),
    biome(167, "mutated_mesa_clear_rock", F::Mesa, T::Warm, false),
];

/// Mutated variants sit this far above their base id.
const MUTATION_OFFSET: i32 = 128;

const OCEAN_IDS: [i32; 3] = [0, 10, 24];
const JUNGLE_NEIGHBOUR_IDS: [i32; 5] = [4, 5, 21, 22, 23];
const MESA_PLATEAU_IDS: [i32; 2] = [38, 39];

/// Look up a descriptor by id.
pub fn vanilla_biome(id: i32) -> Option<&'static VanillaBiome> {
    VANILLA_BIOMES.iter().find(|b| b.id == id)
}

/// Look up a descriptor by registry name.
pub fn vanilla_biome_named(name: &str) -> Option<&'static VanillaBiome> {
    VANILLA_BIOMES.iter().find(|b| b.name == name)
}

fn flags_of(b: &VanillaBiome) -> BiomeFlags {
    let mut flags = BiomeFlags::VALID;
    let oceanic = OCEAN_IDS.contains(&b.id);
    flags.set(BiomeFlags::OCEANIC, oceanic);
    flags.set(BiomeFlags::MESA, b.family == F::Mesa);
    flags.set(BiomeFlags::MUTATION, b.id > MUTATION_OFFSET);
    flags.set(BiomeFlags::JUNGLE, b.family == F::Jungle);
    flags.set(BiomeFlags::SNOWY, b.snowy);
    flags.set(
        BiomeFlags::JUNGLE_COMPATIBLE,
        b.family == F::Jungle || JUNGLE_NEIGHBOUR_IDS.contains(&b.id) || oceanic,
    );
    flags
}

fn equal_or_mesa_plateau(a: i32, b: i32) -> bool {
    if a == b {
        return true;
    }
    match (vanilla_biome(a), vanilla_biome(b)) {
        (Some(ba), Some(bb)) => {
            if MESA_PLATEAU_IDS.contains(&a) {
                MESA_PLATEAU_IDS.contains(&b)
            } else {
                ba.family == bb.family
            }
        }
        _ => false,
    }
}

fn can_be_neighbors(a: i32, b: i32) -> bool {
    if equal_or_mesa_plateau(a, b) {
        return true;
    }
    match (vanilla_biome(a), vanilla_biome(b)) {
        (Some(ba), Some(bb)) => {
            ba.temp == bb.temp || ba.temp == T::Medium || bb.temp == T::Medium
        }
        _ => false,
    }
}

/// Raw reload arrays for the built-in registry.
#[derive(Debug, Clone)]
pub struct RelationArrays {
    /// One flags byte per id.
    pub flags: Vec<u8>,
    /// Mutated variant per id, `-1` if none.
    pub mutations: Vec<i32>,
    /// Relation bits, indexed `b * BIOME_COUNT + a`.
    pub equals: Vec<u8>,
}

/// Compute the reload arrays describing [`VANILLA_BIOMES`].
pub fn relation_arrays() -> RelationArrays {
    let mut flags = vec![0u8; BIOME_COUNT];
    let mut mutations = vec![-1; BIOME_COUNT];
    for b in VANILLA_BIOMES {
        let slot = b.id as usize;
        flags[slot] = flags_of(b).bits();
        let mutated = b.id + MUTATION_OFFSET;
        if b.id < MUTATION_OFFSET && vanilla_biome(mutated).is_some() {
            mutations[slot] = mutated;
        }
    }

    let mut equals = vec![0u8; BIOME_COUNT * BIOME_COUNT];
    for a in 0..BIOME_COUNT as i32 {
        for b in 0..BIOME_COUNT as i32 {
            let mut rel = BiomeRelation::empty();
            rel.set(BiomeRelation::EQUAL_OR_MESA_PLATEAU, equal_or_mesa_plateau(a, b));
            rel.set(BiomeRelation::CAN_BE_NEIGHBORS, can_be_neighbors(a, b));
            equals[b as usize * BIOME_COUNT + a as usize] = rel.bits();
        }
    }

    RelationArrays {
        flags,
        mutations,
        equals,
    }
}

/// A table populated with the built-in registry.
pub fn vanilla_table() -> Result<BiomeTable, LayerError> {
    let arrays = relation_arrays();
    BiomeTable::from_arrays(
        BIOME_COUNT,
        &arrays.flags,
        &arrays.mutations,
        &arrays.equals,
    )
}

fn layer(name: &str, kind: LayerKind, base_seed: i64, input: Option<&str>) -> LayerSpec {
    LayerSpec {
        name: name.to_string(),
        kind,
        base_seed,
        input: input.map(str::to_string),
        side: None,
    }
}

/// The 1.12 overworld layer graph with default biome and river sizes.
pub fn vanilla_stack() -> StackConfig {
    use LayerKind as K;

    let mut layers = vec![
        layer("island", K::Island, 1, None),
        layer("fuzzy_zoom", K::FuzzyZoom, 2000, Some("island")),
        layer("add_island_1", K::AddIsland, 1, Some("fuzzy_zoom")),
        layer("zoom_2001", K::Zoom, 2001, Some("add_island_1")),
        layer("add_island_2", K::AddIsland, 2, Some("zoom_2001")),
        layer("add_island_50", K::AddIsland, 50, Some("add_island_2")),
        layer("add_island_70", K::AddIsland, 70, Some("add_island_50")),
        layer("remove_ocean", K::RemoveTooMuchOcean, 2, Some("add_island_70")),
        layer("add_snow", K::AddSnow, 2, Some("remove_ocean")),
        layer("add_island_3", K::AddIsland, 3, Some("add_snow")),
        layer("edge_cool_warm", K::EdgeCoolWarm, 2, Some("add_island_3")),
        layer("edge_heat_ice", K::EdgeHeatIce, 2, Some("edge_cool_warm")),
        layer("edge_special", K::EdgeSpecial, 3, Some("edge_heat_ice")),
        layer("zoom_2002", K::Zoom, 2002, Some("edge_special")),
        layer("zoom_2003", K::Zoom, 2003, Some("zoom_2002")),
        layer("add_island_4", K::AddIsland, 4, Some("zoom_2003")),
        layer("mushroom", K::AddMushroomIsland, 5, Some("add_island_4")),
        layer("deep_ocean", K::DeepOcean, 4, Some("mushroom")),
        // river noise, zoomed twice for hills and again for outlines
        layer("river_init", K::RiverInit, 100, Some("deep_ocean")),
        layer("river_zoom_0", K::Zoom, 1000, Some("river_init")),
        layer("river_zoom_1", K::Zoom, 1001, Some("river_zoom_0")),
        layer("river_zoom_2", K::Zoom, 1000, Some("river_zoom_1")),
        layer("river_zoom_3", K::Zoom, 1001, Some("river_zoom_2")),
        layer("river_zoom_4", K::Zoom, 1002, Some("river_zoom_3")),
        layer("river_zoom_5", K::Zoom, 1003, Some("river_zoom_4")),
        layer("river", K::River, 1, Some("river_zoom_5")),
        layer("river_smooth", K::Smooth, 1000, Some("river")),
        // biomes
        layer("biome", K::Biome(BiomeSettings::default()), 200, Some("deep_ocean")),
        layer("biome_zoom_0", K::Zoom, 1000, Some("biome")),
        layer("biome_zoom_1", K::Zoom, 1001, Some("biome_zoom_0")),
        layer("biome_edge", K::BiomeEdge, 1000, Some("biome_zoom_1")),
    ];

    let mut hills = layer("hills", K::Hills, 1000, Some("biome_edge"));
    hills.side = Some("river_zoom_1".to_string());
    layers.push(hills);

    layers.extend([
        layer("rare_biome", K::RareBiome, 1001, Some("hills")),
        layer("zoom_1000", K::Zoom, 1000, Some("rare_biome")),
        layer("add_island_hills", K::AddIsland, 3, Some("zoom_1000")),
        layer("zoom_1001", K::Zoom, 1001, Some("add_island_hills")),
        layer("shore", K::Shore, 1000, Some("zoom_1001")),
        layer("zoom_1002", K::Zoom, 1002, Some("shore")),
        layer("zoom_1003", K::Zoom, 1003, Some("zoom_1002")),
        layer("biome_smooth", K::Smooth, 1000, Some("zoom_1003")),
    ]);

    let mut mix = layer("river_mix", K::RiverMix, 100, Some("biome_smooth"));
    mix.side = Some("river_smooth".to_string());
    layers.push(mix);
    layers.push(layer("voronoi", K::VoronoiZoom, 10, Some("river_mix")));

    StackConfig {
        layers,
        output: "voronoi".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::LayerStack;

    #[test]
    fn test_vanilla_stack_builds() {
        let stack = LayerStack::build(&vanilla_stack(), 0).unwrap();
        assert_eq!(stack.len(), vanilla_stack().layers.len());
        assert_eq!(stack.seed_of("voronoi"), Some(biomegen_core::layer_seed(0, 10)));
    }

    #[test]
    fn test_flags() {
        let t = vanilla_table().unwrap();
        assert!(t.is_oceanic(0) && t.is_oceanic(10) && t.is_oceanic(24));
        assert!(!t.is_oceanic(7));
        assert!(t.is_jungle(149) && !t.is_jungle(4));
        assert!(t.is_jungle_compatible(4) && t.is_jungle_compatible(0));
        assert!(!t.is_jungle_compatible(1));
        assert!(t.is_mesa(37) && t.is_mesa(167) && !t.is_mesa(2));
        assert!(t.is_mutation(129) && !t.is_mutation(1) && !t.is_mutation(127));
        assert!(t.is_snowy(12) && t.is_snowy(26) && !t.is_snowy(5));
        assert!(!t.is_valid(40) && t.is_valid(127));
    }

    #[test]
    fn test_mutations() {
        let t = vanilla_table().unwrap();
        assert_eq!(t.mutation_for(1), 129);
        assert_eq!(t.mutation_for(39), 167);
        assert_eq!(t.mutation_for(7), -1);
        assert_eq!(t.mutation_for(129), -1);
    }

    #[test]
    fn test_relations() {
        let t = vanilla_table().unwrap();
        // family equality
        assert!(t.equal_or_mesa_plateau(4, 27));
        assert!(!t.equal_or_mesa_plateau(4, 155));
        // mesa plateaus only match each other
        assert!(t.equal_or_mesa_plateau(38, 39));
        assert!(!t.equal_or_mesa_plateau(38, 37));
        assert!(t.equal_or_mesa_plateau(37, 38));
        // unregistered ids still equal themselves
        assert!(t.equal_or_mesa_plateau(200, 200));
        assert!(!t.equal_or_mesa_plateau(200, 201));

        assert!(t.can_be_neighbors(2, 35));
        assert!(t.can_be_neighbors(12, 1));
        assert!(!t.can_be_neighbors(12, 2));
        assert!(!t.can_be_neighbors(0, 2));
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(vanilla_biome_named("mutated_plains").map(|b| b.id), Some(129));
        assert!(vanilla_biome_named("nether_wastes").is_none());
    }
}
