#![warn(missing_docs)]
//! Deterministic primitives shared by every biome layer.

mod error;
mod fastmod;
mod rng;

pub use error::LayerError;
pub use fastmod::{FastModI32, FastModI64, FastModU32, FastModU64};
pub use rng::{start, update, CellRng, INCREMENT, MULTIPLIER};

/// `((a * b + c) >> shift)` evaluated in 64 bits, truncated back to `i32`.
///
/// Used to place batch tiles: `mul_add_shift(grid_x, dist, x, depth)`.
#[inline(always)]
pub const fn mul_add_shift(a: i32, b: i32, c: i32, shift: u32) -> i32 {
    ((a as i64 * b as i64 + c as i64) >> shift) as i32
}

/// Pre-mix a layer's base seed.
pub const fn base_seed_mix(base: i64) -> i64 {
    let mut mixed = base;
    let mut i = 0;
    while i < 3 {
        mixed = update(mixed, base);
        i += 1;
    }
    mixed
}

/// Seed a layer receives when generating world `world_seed`.
pub const fn layer_seed(world_seed: i64, base_seed: i64) -> i64 {
    let base = base_seed_mix(base_seed);
    let mut seed = world_seed;
    let mut i = 0;
    while i < 3 {
        seed = update(seed, base);
        i += 1;
    }
    seed
}
