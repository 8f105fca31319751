//! Climate classification: snow bands, temperature edges and special tags.
//!
//! Land cells carry a climate class: 1 warm, 2 medium, 3 cold, 4 frozen.

use crate::gather::NeighborMode;
use crate::padded::{PaddedCell, PaddedRule};
use crate::translation::TranslationRule;
use biomegen_core::CellRng;

/// Bits carrying the special-variant tag.
pub const SPECIAL_MASK: i32 = 0xF00;

/// Assigns a climate class to every land cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddSnow;

impl TranslationRule for AddSnow {
    fn eval(&self, seed: i64, x: i32, z: i32, value: i32, _side: i32) -> i32 {
        if value == 0 {
            return 0;
        }
        match CellRng::new(seed, x, z).next_int_const::<6>() {
            0 => 4,
            1 => 3,
            _ => 1,
        }
    }
}

/// Warm land touching cold or frozen land becomes medium.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeCoolWarm;

impl PaddedRule for EdgeCoolWarm {
    const MODE: NeighborMode = NeighborMode::Sides;

    fn eval(&self, _seed: i64, c: &PaddedCell) -> i32 {
        if c.center == 1 && c.neighbors.iter().any(|&n| n == 3 || n == 4) {
            2
        } else {
            c.center
        }
    }
}

/// Frozen land touching medium or warm land becomes cold.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeHeatIce;

impl PaddedRule for EdgeHeatIce {
    const MODE: NeighborMode = NeighborMode::Sides;

    fn eval(&self, _seed: i64, c: &PaddedCell) -> i32 {
        if c.center == 4 && c.neighbors.iter().any(|&n| n == 2 || n == 1) {
            3
        } else {
            c.center
        }
    }
}

/// Tags one land cell in thirteen with a special-variant number in bits 8..12.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeSpecial;

impl TranslationRule for EdgeSpecial {
    fn eval(&self, seed: i64, x: i32, z: i32, value: i32, _side: i32) -> i32 {
        if value == 0 {
            return 0;
        }
        let mut rng = CellRng::new(seed, x, z);
        if rng.next_int_const::<13>() == 0 {
            value | (((1 + rng.next_int_const::<15>()) << 8) & SPECIAL_MASK)
        } else {
            value
        }
    }
}
