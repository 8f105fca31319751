#![warn(missing_docs)]
//! Deterministic testing surfaces for biome layers: random inputs, windows,
//! digests, and a naive reference evaluator.

pub mod reference;

use anyhow::Result;
use biomegen_world::{extract_window, GridBounds};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// `len` values in `0..limit` drawn from a seeded [`StdRng`].
pub fn random_grid(seed: u64, len: usize, limit: i32) -> Vec<i32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(0..limit)).collect()
}

/// Copy `window` out of a grid covering `src_bounds`.
pub fn window_of(src: &[i32], src_bounds: &GridBounds, window: &GridBounds) -> Result<Vec<i32>> {
    let mut out = vec![0; window.len()];
    extract_window(src, src_bounds, window, &mut out)?;
    Ok(out)
}

/// CRC32 of a grid's little-endian bytes.
pub fn grid_digest(cells: &[i32]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for cell in cells {
        hasher.update(&cell.to_le_bytes());
    }
    hasher.finalize()
}

/// Digest of one evaluated region, for CI artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridRecord<'a> {
    /// Label of the pipeline or layer.
    pub label: &'a str,
    /// World seed.
    pub seed: i64,
    /// Evaluated region.
    pub bounds: GridBounds,
    /// [`grid_digest`] of the cells.
    pub digest: u32,
}

/// A sink that writes newline-delimited JSON records.
pub struct JsonlSink {
    file: File,
}

impl JsonlSink {
    /// Create a sink at `path`, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            file: File::create(path)?,
        })
    }

    /// Append a record.
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        Ok(())
    }
}
