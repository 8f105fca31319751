//! Layers that map each cell independently, in place.

use crate::grid::TileBatch;
use biomegen_core::LayerError;

/// Per-cell logic of a translation layer.
pub trait TranslationRule {
    /// Whether the rule needs a secondary input grid laid out like the values.
    const SIDE_INPUT: bool = false;

    /// Map the value at `(x, z)`. `side` is `0` when the rule takes none.
    fn eval(&self, seed: i64, x: i32, z: i32, value: i32, side: i32) -> i32;
}

/// A seeded translation rule.
#[derive(Debug, Clone)]
pub struct TranslationLayer<R> {
    seed: i64,
    rule: R,
}

impl<R: TranslationRule> TranslationLayer<R> {
    /// Bind `rule` to a layer seed.
    pub fn new(seed: i64, rule: R) -> Self {
        Self { seed, rule }
    }

    /// Layer seed.
    pub fn seed(&self) -> i64 {
        self.seed
    }

    fn check(len: usize, inout: &[i32], side: Option<&[i32]>) -> Result<(), LayerError> {
        LayerError::check_len("inout", len, inout.len())?;
        if R::SIDE_INPUT {
            LayerError::check_len("side", len, side.map_or(0, <[i32]>::len))?;
        }
        Ok(())
    }

    #[inline]
    #[allow(clippy::too_many_arguments)]
    fn run(
        &self,
        x: i32,
        z: i32,
        size_x: usize,
        size_z: usize,
        base: usize,
        inout: &mut [i32],
        side: Option<&[i32]>,
    ) {
        for dx in 0..size_x {
            for dz in 0..size_z {
                let i = base + dx * size_z + dz;
                let side = match side {
                    Some(side) if R::SIDE_INPUT => side[i],
                    _ => 0,
                };
                inout[i] = self
                    .rule
                    .eval(self.seed, x + dx as i32, z + dz as i32, inout[i], side);
            }
        }
    }

    /// Rewrite the region `(x, z, size_x, size_z)` held in `inout`.
    pub fn grid(
        &self,
        x: i32,
        z: i32,
        size_x: usize,
        size_z: usize,
        inout: &mut [i32],
        side: Option<&[i32]>,
    ) -> Result<(), LayerError> {
        Self::check(size_x * size_z, inout, side)?;
        self.run(x, z, size_x, size_z, 0, inout, side);
        Ok(())
    }

    /// Rewrite every tile of a batch held in `inout`.
    pub fn grid_multi(
        &self,
        batch: &TileBatch,
        inout: &mut [i32],
        side: Option<&[i32]>,
    ) -> Result<(), LayerError> {
        Self::check(batch.output_len(), inout, side)?;
        for (i, gx, gz) in batch.tiles() {
            let (x, z) = batch.tile_origin(gx, gz);
            self.run(x, z, batch.size, batch.size, i * batch.tile_len(), inout, side);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AddCoords;

    impl TranslationRule for AddCoords {
        fn eval(&self, _seed: i64, x: i32, z: i32, value: i32, _side: i32) -> i32 {
            value + x * 1000 + z
        }
    }

    struct TakeSide;

    impl TranslationRule for TakeSide {
        const SIDE_INPUT: bool = true;

        fn eval(&self, _seed: i64, _x: i32, _z: i32, value: i32, side: i32) -> i32 {
            value * side
        }
    }

    #[test]
    fn test_grid_passes_absolute_coordinates() {
        let layer = TranslationLayer::new(1, AddCoords);
        let mut cells = vec![5; 6];
        layer.grid(-1, 10, 2, 3, &mut cells, None).unwrap();
        assert_eq!(cells, vec![-985, -984, -983, 15, 16, 17]);
    }

    #[test]
    fn test_grid_multi_uses_tile_origins() {
        let layer = TranslationLayer::new(1, AddCoords);
        let batch = TileBatch {
            x: 0,
            z: 0,
            size: 1,
            dist: 8,
            depth: 1,
            count: 2,
        };
        let mut cells = vec![0; 4];
        layer.grid_multi(&batch, &mut cells, None).unwrap();
        assert_eq!(cells, vec![0, 4, 4000, 4004]);
    }

    #[test]
    fn test_side_input_required() {
        let layer = TranslationLayer::new(1, TakeSide);
        let mut cells = vec![2, 3];
        assert!(layer.grid(0, 0, 1, 2, &mut cells, Some(&[7])).is_err());
        assert_eq!(cells, vec![2, 3]);
        layer.grid(0, 0, 1, 2, &mut cells, Some(&[7, 11])).unwrap();
        assert_eq!(cells, vec![14, 33]);
    }
}
