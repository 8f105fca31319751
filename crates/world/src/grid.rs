//! Region and tile-batch descriptors shared by every layer shape.

use biomegen_core::{mul_add_shift, LayerError};
use serde::{Deserialize, Serialize};

/// An axis-aligned region of cells, stored x-major (`dx * size_z + dz`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridBounds {
    /// Minimum x.
    pub x: i32,
    /// Minimum z.
    pub z: i32,
    /// Extent along x.
    pub size_x: usize,
    /// Extent along z.
    pub size_z: usize,
}

impl GridBounds {
    /// Construct bounds.
    pub const fn new(x: i32, z: i32, size_x: usize, size_z: usize) -> Self {
        Self {
            x,
            z,
            size_x,
            size_z,
        }
    }

    /// Square bounds of side `size`.
    pub const fn square(x: i32, z: i32, size: usize) -> Self {
        Self::new(x, z, size, size)
    }

    /// Number of cells.
    pub const fn len(&self) -> usize {
        self.size_x * self.size_z
    }

    /// Whether the region holds no cells.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `other` lies entirely inside `self`.
    pub fn contains(&self, other: &GridBounds) -> bool {
        let (sx, sz) = (self.x as i64, self.z as i64);
        let (ox, oz) = (other.x as i64, other.z as i64);
        ox >= sx
            && oz >= sz
            && ox + other.size_x as i64 <= sx + self.size_x as i64
            && oz + other.size_z as i64 <= sz + self.size_z as i64
    }

    /// Smallest bounds containing both `self` and `other`.
    pub fn union(&self, other: &GridBounds) -> GridBounds {
        let x = self.x.min(other.x);
        let z = self.z.min(other.z);
        let end_x = (self.x as i64 + self.size_x as i64).max(other.x as i64 + other.size_x as i64);
        let end_z = (self.z as i64 + self.size_z as i64).max(other.z as i64 + other.size_z as i64);
        GridBounds::new(x, z, (end_x - x as i64) as usize, (end_z - z as i64) as usize)
    }
}

/// Copy the cells of `window` out of `src`, which covers `src_bounds`.
pub fn extract_window(
    src: &[i32],
    src_bounds: &GridBounds,
    window: &GridBounds,
    dst: &mut [i32],
) -> Result<(), LayerError> {
    if !src_bounds.contains(window) {
        return Err(LayerError::InvalidConfig(format!(
            "window {window:?} is not inside {src_bounds:?}"
        )));
    }
    LayerError::check_len("source", src_bounds.len(), src.len())?;
    LayerError::check_len("window", window.len(), dst.len())?;

    let off_x = (window.x - src_bounds.x) as usize;
    let off_z = (window.z - src_bounds.z) as usize;
    for dx in 0..window.size_x {
        let from = (off_x + dx) * src_bounds.size_z + off_z;
        dst[dx * window.size_z..(dx + 1) * window.size_z]
            .copy_from_slice(&src[from..from + window.size_z]);
    }
    Ok(())
}

/// A square grid of equally sized square tiles evaluated in one call.
///
/// Tile `(gx, gz)` starts at
/// `(mul_add_shift(gx, dist, x, depth), mul_add_shift(gz, dist, z, depth))`.
/// Outputs are `count * count` tiles of `size * size` cells, grid x outer and
/// grid z inner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileBatch {
    /// Origin x, before the depth shift.
    pub x: i32,
    /// Origin z, before the depth shift.
    pub z: i32,
    /// Side of each tile in cells.
    pub size: usize,
    /// Spacing between tile origins, before the depth shift.
    pub dist: i32,
    /// Zoom levels between the batch coordinates and this layer.
    pub depth: u32,
    /// Tiles per side.
    pub count: usize,
}

impl TileBatch {
    /// Origin of tile `(gx, gz)`.
    #[inline]
    pub const fn tile_origin(&self, gx: usize, gz: usize) -> (i32, i32) {
        (
            mul_add_shift(gx as i32, self.dist, self.x, self.depth),
            mul_add_shift(gz as i32, self.dist, self.z, self.depth),
        )
    }

    /// Bounds of tile `(gx, gz)`.
    pub const fn tile_bounds(&self, gx: usize, gz: usize) -> GridBounds {
        let (x, z) = self.tile_origin(gx, gz);
        GridBounds::square(x, z, self.size)
    }

    /// Cells in one tile.
    pub const fn tile_len(&self) -> usize {
        self.size * self.size
    }

    /// Number of tiles.
    pub const fn tile_count(&self) -> usize {
        self.count * self.count
    }

    /// Cells in the whole output.
    pub const fn output_len(&self) -> usize {
        self.tile_count() * self.tile_len()
    }

    /// Reject layouts the combined batch mode cannot address: negative
    /// spacing, a depth shift wider than the coordinates, or a shared input
    /// side past `i32::MAX`.
    pub fn check_combined(&self) -> Result<(), LayerError> {
        if self.dist < 0 {
            return Err(LayerError::InvalidConfig(format!(
                "combined batch needs non-negative tile spacing, got {}",
                self.dist
            )));
        }
        if self.depth >= i32::BITS {
            return Err(LayerError::InvalidConfig(format!(
                "batch depth {} exceeds coordinate width",
                self.depth
            )));
        }
        let step = (self.dist >> self.depth) as i64 + 1;
        let span = i64::try_from(self.count)
            .ok()
            .and_then(|count| count.checked_mul(step))
            .filter(|&span| span <= i32::MAX as i64);
        if span.is_none() {
            return Err(LayerError::InvalidConfig(format!(
                "combined input for {} tiles spaced {} is too large",
                self.count, self.dist
            )));
        }
        Ok(())
    }

    /// `(index, gx, gz)` for every tile in output order.
    pub fn tiles(&self) -> impl Iterator<Item = (usize, usize, usize)> {
        let count = self.count;
        (0..count)
            .flat_map(move |gx| (0..count).map(move |gz| (gx, gz)))
            .enumerate()
            .map(|(i, (gx, gz))| (i, gx, gz))
    }
}
