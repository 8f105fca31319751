//! Layers that magnify their input by `2^ZOOM` along each axis.
//!
//! Each low-resolution cell and its `+x`, `+z` and `+x+z` neighbours produce one
//! `2^ZOOM × 2^ZOOM` output tile. Requests whose origin and extents are
//! multiples of the tile size are written straight into the output; any other
//! request is evaluated over the enclosing aligned region in scratch space and
//! the requested window is copied out, so results never depend on alignment.

use crate::gather::gather;
use crate::grid::{GridBounds, TileBatch};
use biomegen_core::{mul_add_shift, LayerError};

/// Write access to one output tile.
pub struct TileWriter<'a> {
    buf: &'a mut [i32],
    base: usize,
    stride: usize,
}

impl TileWriter<'_> {
    /// Set the cell `(dx, dz)` of the tile.
    #[inline(always)]
    pub fn set(&mut self, dx: usize, dz: usize, value: i32) {
        self.buf[self.base + dx * self.stride + dz] = value;
    }
}

/// Per-tile logic of a zoom layer.
pub trait ZoomRule {
    /// Magnification exponent; tiles are `1 << ZOOM` cells wide.
    const ZOOM: u32;

    /// Fill the tile whose first output cell is `(x, z)`.
    ///
    /// `corners` are the low-resolution values at `(0,0), (1,0), (0,1), (1,1)`
    /// as `(dx, dz)`.
    fn zoom_tile(
        &self,
        seed: i64,
        x: i32,
        z: i32,
        corners: [i32; 4],
        out: &mut TileWriter<'_>,
    );
}

/// A seeded zoom rule.
#[derive(Debug, Clone)]
pub struct ZoomLayer<R> {
    seed: i64,
    rule: R,
}

/// Low-resolution tiles to expand and where their output goes.
struct Expand {
    low_x: i32,
    low_z: i32,
    tiles_x: usize,
    tiles_z: usize,
    in_base: usize,
    in_stride: usize,
    out_stride: usize,
}

impl<R: ZoomRule> ZoomLayer<R> {
    const MASK: i32 = (1 << R::ZOOM) - 1;

    /// Bind `rule` to a layer seed.
    pub fn new(seed: i64, rule: R) -> Self {
        Self { seed, rule }
    }

    /// Layer seed.
    pub fn seed(&self) -> i64 {
        self.seed
    }

    /// Whether a request can be written straight into the output.
    pub fn is_aligned(x: i32, z: i32, size_x: usize, size_z: usize) -> bool {
        (x | z | size_x as i32 | size_z as i32) & Self::MASK == 0
    }

    /// Low-resolution extent covering any window of `size` cells.
    fn unaligned_extent(size: usize) -> usize {
        ((Self::MASK as usize + size).saturating_sub(1) >> R::ZOOM) + 2
    }

    /// Input region needed for an output region.
    pub fn input_bounds(x: i32, z: i32, size_x: usize, size_z: usize) -> GridBounds {
        let (low_x, low_z) = (x >> R::ZOOM, z >> R::ZOOM);
        if Self::is_aligned(x, z, size_x, size_z) {
            GridBounds::new(low_x, low_z, (size_x >> R::ZOOM) + 1, (size_z >> R::ZOOM) + 1)
        } else {
            GridBounds::new(
                low_x,
                low_z,
                Self::unaligned_extent(size_x),
                Self::unaligned_extent(size_z),
            )
        }
    }

    fn expand(&self, e: &Expand, input: &[i32], out: &mut [i32]) {
        let stride = e.in_stride as isize;
        let offsets = [0, stride, 1, stride + 1];
        for tx in 0..e.tiles_x {
            for tz in 0..e.tiles_z {
                let corners = gather(input, e.in_base + tx * e.in_stride + tz, &offsets);
                let mut writer = TileWriter {
                    buf: &mut *out,
                    base: (tx << R::ZOOM) * e.out_stride + (tz << R::ZOOM),
                    stride: e.out_stride,
                };
                self.rule.zoom_tile(
                    self.seed,
                    (e.low_x + tx as i32) << R::ZOOM,
                    (e.low_z + tz as i32) << R::ZOOM,
                    corners,
                    &mut writer,
                );
            }
        }
    }

    /// Copy a `size_x × size_z` window at `(off_x, off_z)` out of scratch rows of
    /// `temp_stride` cells.
    #[allow(clippy::too_many_arguments)]
    fn copy_window(
        temp: &[i32],
        temp_stride: usize,
        off_x: usize,
        off_z: usize,
        size_x: usize,
        size_z: usize,
        out: &mut [i32],
        out_base: usize,
    ) {
        for dx in 0..size_x {
            let from = (dx + off_x) * temp_stride + off_z;
            let to = out_base + dx * size_z;
            out[to..to + size_z].copy_from_slice(&temp[from..from + size_z]);
        }
    }

    /// Evaluate the region `(x, z, size_x, size_z)` from `input`, which covers
    /// [`input_bounds`](Self::input_bounds).
    pub fn grid(
        &self,
        x: i32,
        z: i32,
        size_x: usize,
        size_z: usize,
        input: &[i32],
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        LayerError::check_len("output", size_x * size_z, out.len())?;
        if size_x == 0 || size_z == 0 {
            return Ok(());
        }
        let bounds = Self::input_bounds(x, z, size_x, size_z);
        LayerError::check_len("input", bounds.len(), input.len())?;

        if Self::is_aligned(x, z, size_x, size_z) {
            self.expand(
                &Expand {
                    low_x: bounds.x,
                    low_z: bounds.z,
                    tiles_x: size_x >> R::ZOOM,
                    tiles_z: size_z >> R::ZOOM,
                    in_base: 0,
                    in_stride: bounds.size_z,
                    out_stride: size_z,
                },
                input,
                out,
            );
            return Ok(());
        }

        let tiles_x = bounds.size_x - 1;
        let tiles_z = bounds.size_z - 1;
        let temp_stride = tiles_z << R::ZOOM;
        let mut temp = vec![0; (tiles_x << R::ZOOM) * temp_stride];
        self.expand(
            &Expand {
                low_x: bounds.x,
                low_z: bounds.z,
                tiles_x,
                tiles_z,
                in_base: 0,
                in_stride: bounds.size_z,
                out_stride: temp_stride,
            },
            input,
            &mut temp,
        );
        Self::copy_window(
            &temp,
            temp_stride,
            (x & Self::MASK) as usize,
            (z & Self::MASK) as usize,
            size_x,
            size_z,
            out,
            0,
        );
        Ok(())
    }

    /// Side of the shared input buffer in combined batch mode. Only
    /// meaningful for batches passing [`TileBatch::check_combined`].
    pub fn combined_input_size(batch: &TileBatch) -> usize {
        let step = (batch.dist >> batch.depth.min(31)).saturating_add(1).max(0) as usize;
        (step.saturating_mul(batch.count) >> R::ZOOM).saturating_add(2)
    }

    /// Shared input region for combined batch mode.
    pub fn combined_input_bounds(batch: &TileBatch) -> GridBounds {
        GridBounds::square(
            (batch.x >> batch.depth) >> R::ZOOM,
            (batch.z >> batch.depth) >> R::ZOOM,
            Self::combined_input_size(batch),
        )
    }

    fn combined_offset(batch: &TileBatch, g: usize) -> i32 {
        let g = g as i32;
        mul_add_shift(g, batch.dist, g & Self::MASK, batch.depth) >> R::ZOOM
    }

    /// Side of each tile's low-resolution input in batch mode.
    pub fn tile_input_size(batch: &TileBatch) -> usize {
        Self::unaligned_extent(batch.size)
    }

    /// Whether every tile's combined-mode offset lands on the tile's own input.
    pub fn combined_compatible(batch: &TileBatch) -> bool {
        if batch.check_combined().is_err() {
            return false;
        }
        let origin = Self::combined_input_bounds(batch);
        let in_size = Self::combined_input_size(batch) as i64;
        let in_tile = Self::tile_input_size(batch) as i64;
        (0..batch.count).all(|g| {
            let (tx, tz) = batch.tile_origin(g, g);
            let off = Self::combined_offset(batch, g);
            (tx >> R::ZOOM) - origin.x == off
                && (tz >> R::ZOOM) - origin.z == off
                && off >= 0
                && off as i64 + in_tile <= in_size
        })
    }

    fn batch_tiles(
        &self,
        batch: &TileBatch,
        input: &[i32],
        out: &mut [i32],
        in_stride: usize,
        in_base: impl Fn(usize, usize, usize) -> usize,
    ) {
        let in_tile = Self::tile_input_size(batch);
        let temp_stride = (in_tile - 1) << R::ZOOM;
        let mut temp = vec![0; temp_stride * temp_stride];
        for (i, gx, gz) in batch.tiles() {
            let (x, z) = batch.tile_origin(gx, gz);
            self.expand(
                &Expand {
                    low_x: x >> R::ZOOM,
                    low_z: z >> R::ZOOM,
                    tiles_x: in_tile - 1,
                    tiles_z: in_tile - 1,
                    in_base: in_base(i, gx, gz),
                    in_stride,
                    out_stride: temp_stride,
                },
                input,
                &mut temp,
            );
            Self::copy_window(
                &temp,
                temp_stride,
                (x & Self::MASK) as usize,
                (z & Self::MASK) as usize,
                batch.size,
                batch.size,
                out,
                i * batch.tile_len(),
            );
        }
    }

    /// Evaluate a tile batch from one shared input buffer covering
    /// [`combined_input_bounds`](Self::combined_input_bounds).
    pub fn grid_multi_combined(
        &self,
        batch: &TileBatch,
        input: &[i32],
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        batch.check_combined()?;
        LayerError::check_len("output", batch.output_len(), out.len())?;
        if batch.output_len() == 0 {
            return Ok(());
        }
        let in_size = Self::combined_input_size(batch);
        let in_tile = Self::tile_input_size(batch);
        LayerError::check_len("input", in_size * in_size, input.len())?;

        let mut offsets = Vec::with_capacity(batch.count);
        for g in 0..batch.count {
            let off = Self::combined_offset(batch, g);
            if off < 0 || off as usize + in_tile > in_size {
                return Err(LayerError::InvalidConfig(format!(
                    "tile {g} at offset {off} overruns combined input of side {in_size}"
                )));
            }
            offsets.push(off as usize);
        }

        self.batch_tiles(batch, input, out, in_size, |_, gx, gz| {
            offsets[gx] * in_size + offsets[gz]
        });
        Ok(())
    }

    /// Evaluate a tile batch whose inputs are `count²` consecutive buffers of
    /// side [`tile_input_size`](Self::tile_input_size), each starting at the
    /// low-resolution cell containing its tile's origin.
    pub fn grid_multi_individual(
        &self,
        batch: &TileBatch,
        input: &[i32],
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        LayerError::check_len("output", batch.output_len(), out.len())?;
        if batch.output_len() == 0 {
            return Ok(());
        }
        let in_tile = Self::tile_input_size(batch);
        LayerError::check_len("input", in_tile * in_tile * batch.tile_count(), input.len())?;

        self.batch_tiles(batch, input, out, in_tile, |i, _, _| i * in_tile * in_tile);
        Ok(())
    }
}
