//! Layers whose output cell depends on the same cell of the input plus four
//! neighbours.
//!
//! For an output region at `(x, z)` of extents `(size_x, size_z)` the input
//! covers `(x - 1, z - 1)` with extents `(size_x + 2, size_z + 2)`.

use crate::gather::{gather, gather_lanes, NeighborMode, DEFAULT_LANES};
use crate::grid::{GridBounds, TileBatch};
use biomegen_core::{mul_add_shift, LayerError};

/// Everything a padded rule sees for one output cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddedCell {
    /// Absolute x of the output cell.
    pub x: i32,
    /// Absolute z of the output cell.
    pub z: i32,
    /// Input value at the same position.
    pub center: i32,
    /// Input values at the rule's [`NeighborMode`] offsets.
    pub neighbors: [i32; 4],
    /// Secondary input at the same position, `0` when the rule takes none.
    pub side: i32,
}

/// Per-cell logic of a padded layer.
pub trait PaddedRule {
    /// Neighbour set the rule reads.
    const MODE: NeighborMode;
    /// Whether the rule needs a secondary input grid in output layout.
    const SIDE_INPUT: bool = false;

    /// Compute one output cell.
    fn eval(&self, seed: i64, cell: &PaddedCell) -> i32;
}

/// A seeded padded rule.
#[derive(Debug, Clone)]
pub struct PaddedLayer<R> {
    seed: i64,
    rule: R,
}

/// Where one output tile reads from inside an input buffer.
#[derive(Clone, Copy)]
struct Window {
    x: i32,
    z: i32,
    size_x: usize,
    size_z: usize,
    /// Index of the input cell at `(x - 1, z - 1)`.
    in_base: usize,
    in_stride: usize,
    out_base: usize,
}

impl<R: PaddedRule> PaddedLayer<R> {
    /// Bind `rule` to a layer seed.
    pub fn new(seed: i64, rule: R) -> Self {
        Self { seed, rule }
    }

    /// Layer seed.
    pub fn seed(&self) -> i64 {
        self.seed
    }

    /// Input region needed for an output region.
    pub fn input_bounds(x: i32, z: i32, size_x: usize, size_z: usize) -> GridBounds {
        GridBounds::new(x - 1, z - 1, size_x + 2, size_z + 2)
    }

    /// Side of the shared input buffer in combined batch mode. Only
    /// meaningful for batches passing [`TileBatch::check_combined`].
    pub fn combined_input_size(batch: &TileBatch) -> usize {
        let step = (batch.dist >> batch.depth.min(31)).saturating_add(1).max(0) as usize;
        step.saturating_mul(batch.count).saturating_add(2)
    }

    /// Shared input region for combined batch mode.
    pub fn combined_input_bounds(batch: &TileBatch) -> GridBounds {
        GridBounds::square(
            (batch.x >> batch.depth) - 1,
            (batch.z >> batch.depth) - 1,
            Self::combined_input_size(batch),
        )
    }

    fn combined_offset(batch: &TileBatch, g: usize) -> i32 {
        let mask = (batch.depth != 0) as i32;
        let g = g as i32;
        mul_add_shift(g, batch.dist, g & mask, batch.depth)
    }

    /// Whether every tile's combined-mode offset lands on the tile's own
    /// input, so combined and per-tile evaluation read identical cells.
    pub fn combined_compatible(batch: &TileBatch) -> bool {
        if batch.check_combined().is_err() {
            return false;
        }
        let origin = Self::combined_input_bounds(batch);
        let size = Self::combined_input_size(batch) as i64;
        (0..batch.count).all(|g| {
            let (tx, tz) = batch.tile_origin(g, g);
            let off = Self::combined_offset(batch, g);
            tx - 1 - origin.x == off
                && tz - 1 - origin.z == off
                && off >= 0
                && off as i64 + batch.size as i64 + 2 <= size
        })
    }

    /// Evaluate the region `(x, z, size_x, size_z)`.
    ///
    /// `input` covers [`input_bounds`](Self::input_bounds); `side`, when the
    /// rule takes one, is laid out like `out`.
    #[allow(clippy::too_many_arguments)]
    pub fn grid(
        &self,
        x: i32,
        z: i32,
        size_x: usize,
        size_z: usize,
        input: &[i32],
        side: Option<&[i32]>,
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        let out_len = size_x * size_z;
        LayerError::check_len("output", out_len, out.len())?;
        LayerError::check_len("input", (size_x + 2) * (size_z + 2), input.len())?;
        Self::check_side(side, out_len)?;

        self.run(
            Window {
                x,
                z,
                size_x,
                size_z,
                in_base: 0,
                in_stride: size_z + 2,
                out_base: 0,
            },
            input,
            side,
            out,
        );
        Ok(())
    }

    /// Evaluate a tile batch from one shared input buffer.
    pub fn grid_multi_combined(
        &self,
        batch: &TileBatch,
        input: &[i32],
        side: Option<&[i32]>,
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        batch.check_combined()?;
        let in_size = Self::combined_input_size(batch);
        LayerError::check_len("output", batch.output_len(), out.len())?;
        LayerError::check_len("input", in_size * in_size, input.len())?;
        Self::check_side(side, batch.output_len())?;

        let mut offsets = Vec::with_capacity(batch.count);
        for g in 0..batch.count {
            let off = Self::combined_offset(batch, g);
            if off < 0 || off as usize + batch.size + 2 > in_size {
                return Err(LayerError::InvalidConfig(format!(
                    "tile {g} at offset {off} overruns combined input of side {in_size}"
                )));
            }
            offsets.push(off as usize);
        }

        for (i, gx, gz) in batch.tiles() {
            let (x, z) = batch.tile_origin(gx, gz);
            self.run(
                Window {
                    x,
                    z,
                    size_x: batch.size,
                    size_z: batch.size,
                    in_base: offsets[gx] * in_size + offsets[gz],
                    in_stride: in_size,
                    out_base: i * batch.tile_len(),
                },
                input,
                side,
                out,
            );
        }
        Ok(())
    }

    /// Side of each per-tile input buffer in individual batch mode.
    pub fn individual_input_size(batch: &TileBatch) -> usize {
        batch.size + 2
    }

    /// Evaluate a tile batch whose inputs are `count²` consecutive buffers, one
    /// per tile in output order, each covering that tile's
    /// [`input_bounds`](Self::input_bounds).
    pub fn grid_multi_individual(
        &self,
        batch: &TileBatch,
        input: &[i32],
        side: Option<&[i32]>,
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        let in_size = Self::individual_input_size(batch);
        let in_tile = in_size * in_size;
        LayerError::check_len("output", batch.output_len(), out.len())?;
        LayerError::check_len("input", in_tile * batch.tile_count(), input.len())?;
        Self::check_side(side, batch.output_len())?;

        for (i, gx, gz) in batch.tiles() {
            let (x, z) = batch.tile_origin(gx, gz);
            self.run(
                Window {
                    x,
                    z,
                    size_x: batch.size,
                    size_z: batch.size,
                    in_base: i * in_tile,
                    in_stride: in_size,
                    out_base: i * batch.tile_len(),
                },
                input,
                side,
                out,
            );
        }
        Ok(())
    }

    fn check_side(side: Option<&[i32]>, out_len: usize) -> Result<(), LayerError> {
        if R::SIDE_INPUT {
            LayerError::check_len("side", out_len, side.map_or(0, <[i32]>::len))?;
        }
        Ok(())
    }

    #[inline]
    fn cell(
        &self,
        w: &Window,
        dx: usize,
        dz: usize,
        center: i32,
        neighbors: [i32; 4],
        side: Option<&[i32]>,
    ) -> i32 {
        let out_idx = w.out_base + dx * w.size_z + dz;
        let side = match side {
            Some(side) if R::SIDE_INPUT => side[out_idx],
            _ => 0,
        };
        self.rule.eval(
            self.seed,
            &PaddedCell {
                x: w.x + dx as i32,
                z: w.z + dz as i32,
                center,
                neighbors,
                side,
            },
        )
    }

    fn run(&self, w: Window, input: &[i32], side: Option<&[i32]>, out: &mut [i32]) {
        let offsets = R::MODE.offsets(w.in_stride);
        for dx in 0..w.size_x {
            let row_in = w.in_base + (dx + 1) * w.in_stride + 1;
            let row_out = w.out_base + dx * w.size_z;
            let mut dz = 0;
            while dz + DEFAULT_LANES <= w.size_z {
                let lanes = gather_lanes::<DEFAULT_LANES>(input, row_in + dz, &offsets);
                for (lane, neighbors) in lanes.into_iter().enumerate() {
                    let center = input[row_in + dz + lane];
                    out[row_out + dz + lane] =
                        self.cell(&w, dx, dz + lane, center, neighbors, side);
                }
                dz += DEFAULT_LANES;
            }
            for dz in dz..w.size_z {
                let neighbors = gather(input, row_in + dz, &offsets);
                let center = input[row_in + dz];
                out[row_out + dz] = self.cell(&w, dx, dz, center, neighbors, side);
            }
        }
    }
}
