//! Biome layers: the four layer shapes, the concrete generation rules, the
//! biome relation table they consult, and a stack evaluator tying them
//! together.

mod biome_ids;
mod biome_table;
mod gather;
mod grid;
mod padded;
pub mod rules;
mod source;
mod stack;
mod translation;
pub mod vanilla;
mod zoom;

pub use biome_ids::*;
pub use biome_table::*;
pub use gather::*;
pub use grid::*;
pub use padded::*;
pub use rules::BiomeContext;
pub use source::*;
pub use stack::*;
pub use translation::*;
pub use zoom::*;

pub use biomegen_core::{layer_seed, CellRng, LayerError};
