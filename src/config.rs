use anyhow::{Context, Result};
use biomegen_world::{BiomeIds, StackConfig};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;

/// Pipeline file picked up from the working directory when none is named.
pub const DEFAULT_PATH: &str = "biomegen.toml";

/// The overworld pipeline shipped with the binary.
pub const DEFAULT_PIPELINE: &str = include_str!("../config/pipeline.toml");

/// A layer graph plus the biome ids its rules refer to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub stack: StackConfig,
    #[serde(default)]
    pub biome_ids: BiomeIds,
}

impl PipelineConfig {
    /// Parse the built-in pipeline.
    pub fn builtin() -> Result<Self> {
        Self::from_toml(DEFAULT_PIPELINE).context("built-in pipeline is invalid")
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load `biomegen.toml` from the working directory when it exists, the
    /// built-in pipeline otherwise. A broken default file is reported and
    /// skipped.
    pub fn load() -> Result<Self> {
        Self::load_or_builtin(Path::new(DEFAULT_PATH))
    }

    fn load_or_builtin(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Self::builtin();
        }
        match Self::load_from_path(path) {
            Ok(cfg) => Ok(cfg),
            Err(err) => {
                warn!("{err:#}. Using built-in pipeline");
                Self::builtin()
            }
        }
    }

    /// Load a pipeline from an explicitly named file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }
}
