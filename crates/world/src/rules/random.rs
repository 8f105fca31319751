//! Synthetic sources for tests and debugging pipelines.

use crate::source::SourceRule;
use biomegen_core::{CellRng, FastModI64, LayerError};

/// Uniform values in `0..limit` per cell.
#[derive(Debug, Clone, Copy)]
pub struct RandomValues {
    limit: FastModI64,
}

impl RandomValues {
    /// Limit used when a pipeline does not name one.
    pub const DEFAULT_LIMIT: i32 = 256;

    /// Values in `0..limit`.
    pub fn new(limit: i32) -> Result<Self, LayerError> {
        if limit <= 0 {
            return Err(LayerError::InvalidConfig(format!(
                "random value limit must be positive, got {limit}"
            )));
        }
        Ok(Self {
            limit: FastModI64::new(limit as i64),
        })
    }
}

impl Default for RandomValues {
    fn default() -> Self {
        Self {
            limit: FastModI64::new(Self::DEFAULT_LIMIT as i64),
        }
    }
}

impl SourceRule for RandomValues {
    fn eval(&self, seed: i64, x: i32, z: i32) -> i32 {
        CellRng::new(seed, x, z).next_int_fast(&self.limit)
    }
}

/// The same biome everywhere.
#[derive(Debug, Clone, Copy)]
pub struct FixedBiome(pub i32);

impl SourceRule for FixedBiome {
    fn eval(&self, _seed: i64, _x: i32, _z: i32) -> i32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_values_in_range() {
        let rule = RandomValues::new(7).unwrap();
        let mut seen = [false; 7];
        for x in 0..200 {
            let v = rule.eval(42, x, -x);
            assert!((0..7).contains(&v));
            seen[v as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
        assert!(RandomValues::new(0).is_err());
        assert_eq!(rule.eval(42, 3, 4), CellRng::new(42, 3, 4).next_int(7));
    }

    #[test]
    fn test_fixed_biome() {
        assert_eq!(FixedBiome(21).eval(0, -5, 9), 21);
    }
}
