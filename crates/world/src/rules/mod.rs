//! Concrete generation rules, grouped by the stage of the pipeline they serve.
//!
//! Each rule is plain data implementing one shape trait. Rules that consult
//! biome traits borrow a [`BiomeContext`] for the duration of an evaluation.

mod biome;
mod climate;
mod hills;
mod island;
mod random;
mod river;
mod shore;
mod smooth;
mod zoom;

pub use biome::{
    BiomeEdge, BiomeEntry, BiomeList, BiomePicker, BiomeSettings, RareBiome, SelectBiome,
};
pub use climate::{AddSnow, EdgeCoolWarm, EdgeHeatIce, EdgeSpecial};
pub use hills::Hills;
pub use island::{AddIsland, AddMushroomIsland, DeepOcean, Island, RemoveTooMuchOcean};
pub use random::{FixedBiome, RandomValues};
pub use river::{River, RiverInit, RiverMix};
pub use shore::Shore;
pub use smooth::Smooth;
pub use zoom::{FuzzyZoom, VoronoiZoom, Zoom};

use crate::biome_ids::BiomeIds;
use crate::biome_table::BiomeTable;

/// Biome traits and well-known ids borrowed by the biome-aware rules.
#[derive(Debug, Clone, Copy)]
pub struct BiomeContext<'a> {
    /// Relation table snapshot.
    pub table: &'a BiomeTable,
    /// Ids the rules refer to by name.
    pub ids: &'a BiomeIds,
}

impl<'a> BiomeContext<'a> {
    /// Borrow a table and an id set.
    pub fn new(table: &'a BiomeTable, ids: &'a BiomeIds) -> Self {
        Self { table, ids }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::padded::PaddedCell;

    pub fn cell(x: i32, z: i32, center: i32, neighbors: [i32; 4]) -> PaddedCell {
        PaddedCell {
            x,
            z,
            center,
            neighbors,
            side: 0,
        }
    }
}
