use anyhow::{Context, Result};
use biomegen_world::vanilla::vanilla_biome;
use biomegen_world::{BatchMode, GridBounds, TileBatch};
use serde::Serialize;
use std::{fs, path::Path};

/// What was evaluated.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Request {
    Region {
        bounds: GridBounds,
    },
    Batch {
        batch: TileBatch,
        mode: BatchMode,
    },
}

/// JSON document written by the CLI.
#[derive(Debug, Serialize)]
pub struct GridDocument<'a> {
    pub seed: i64,
    pub request: Request,
    pub crc32: u32,
    pub labels: &'a [i32],
}

impl<'a> GridDocument<'a> {
    pub fn new(seed: i64, request: Request, labels: &'a [i32]) -> Self {
        Self {
            seed,
            request,
            crc32: digest(labels),
            labels,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

/// CRC32 of the labels' little-endian bytes.
pub fn digest(labels: &[i32]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for label in labels {
        hasher.update(&label.to_le_bytes());
    }
    hasher.finalize()
}

fn glyph(id: i32) -> char {
    match id {
        0 | 10 | 24 => '~',
        7 | 11 => '=',
        16 | 25 | 26 => '.',
        _ => match vanilla_biome(id) {
            Some(b) if id > 128 => b.name.chars().nth(8).unwrap_or('?').to_ascii_uppercase(),
            Some(b) => b.name.chars().next().unwrap_or('?'),
            None => '?',
        },
    }
}

/// One text row per x, one glyph per cell.
pub fn preview(labels: &[i32], size_z: usize) -> String {
    if size_z == 0 {
        return String::new();
    }
    let mut out = String::with_capacity(labels.len() + labels.len() / size_z);
    for row in labels.chunks(size_z) {
        out.extend(row.iter().map(|&id| glyph(id)));
        out.push('\n');
    }
    out
}
