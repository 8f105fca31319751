//! Layers with no input: every cell is a function of its coordinates.

use crate::grid::TileBatch;
use biomegen_core::LayerError;

/// Per-cell logic of a source layer.
pub trait SourceRule {
    /// Value of the cell at `(x, z)`.
    fn eval(&self, seed: i64, x: i32, z: i32) -> i32;
}

/// A seeded source rule.
#[derive(Debug, Clone)]
pub struct SourceLayer<R> {
    seed: i64,
    rule: R,
}

impl<R: SourceRule> SourceLayer<R> {
    /// Bind `rule` to a layer seed.
    pub fn new(seed: i64, rule: R) -> Self {
        Self { seed, rule }
    }

    /// Layer seed.
    pub fn seed(&self) -> i64 {
        self.seed
    }

    fn run(&self, x: i32, z: i32, size_x: usize, size_z: usize, out: &mut [i32]) {
        for dx in 0..size_x {
            let row = &mut out[dx * size_z..(dx + 1) * size_z];
            for (dz, cell) in row.iter_mut().enumerate() {
                *cell = self.rule.eval(self.seed, x + dx as i32, z + dz as i32);
            }
        }
    }

    /// Fill the region `(x, z, size_x, size_z)`.
    pub fn grid(
        &self,
        x: i32,
        z: i32,
        size_x: usize,
        size_z: usize,
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        LayerError::check_len("output", size_x * size_z, out.len())?;
        self.run(x, z, size_x, size_z, out);
        Ok(())
    }

    /// Fill every tile of a batch.
    pub fn grid_multi(&self, batch: &TileBatch, out: &mut [i32]) -> Result<(), LayerError> {
        LayerError::check_len("output", batch.output_len(), out.len())?;
        let tile_len = batch.tile_len();
        for (i, gx, gz) in batch.tiles() {
            let (x, z) = batch.tile_origin(gx, gz);
            let tile = &mut out[i * tile_len..(i + 1) * tile_len];
            self.run(x, z, batch.size, batch.size, tile);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Coords;

    impl SourceRule for Coords {
        fn eval(&self, seed: i64, x: i32, z: i32) -> i32 {
            seed as i32 + x * 100 + z
        }
    }

    #[test]
    fn test_grid_is_x_major() {
        let layer = SourceLayer::new(7, Coords);
        let mut out = vec![0; 6];
        layer.grid(2, -1, 3, 2, &mut out).unwrap();
        assert_eq!(out, vec![206, 207, 306, 307, 406, 407]);
    }

    #[test]
    fn test_grid_multi_matches_per_tile_grid() {
        let layer = SourceLayer::new(0, Coords);
        let batch = TileBatch {
            x: -8,
            z: 4,
            size: 3,
            dist: 5,
            depth: 0,
            count: 2,
        };
        let mut out = vec![0; batch.output_len()];
        layer.grid_multi(&batch, &mut out).unwrap();

        for (i, gx, gz) in batch.tiles() {
            let b = batch.tile_bounds(gx, gz);
            let mut tile = vec![0; b.len()];
            layer.grid(b.x, b.z, b.size_x, b.size_z, &mut tile).unwrap();
            assert_eq!(&out[i * 9..(i + 1) * 9], tile.as_slice());
        }
    }
}
