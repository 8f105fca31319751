//! biomegen - deterministic layered biome grid generation
//!
//! Loads a pipeline, installs the biome relation table and evaluates one
//! region or tile batch of the pipeline's output layer.

mod config;
mod output;

use anyhow::{Context, Result};
use biomegen_world::vanilla::relation_arrays;
use biomegen_world::{
    BatchMode, BiomeContext, BiomeRegistry, GridBounds, LayerStack, TileBatch, BIOME_COUNT,
};
use clap::{Parser, ValueEnum};
use config::PipelineConfig;
use output::{GridDocument, Request};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Deterministic biome grid generator", long_about = None)]
struct Args {
    /// Pipeline config (TOML); `biomegen.toml` or the built-in overworld
    /// pipeline when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// World seed
    #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
    seed: i64,

    /// Region origin x
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    x: i32,

    /// Region origin z
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    z: i32,

    /// Region extent along x; tile side in batch mode
    #[arg(long, default_value_t = 16)]
    size_x: usize,

    /// Region extent along z
    #[arg(long, default_value_t = 16)]
    size_z: usize,

    /// Tiles per side; evaluates a tile batch instead of one region
    #[arg(long)]
    count: Option<usize>,

    /// Spacing between tile origins, before the depth shift
    #[arg(long, default_value_t = 16)]
    dist: i32,

    /// Zoom levels between batch coordinates and the output layer
    #[arg(long, default_value_t = 0)]
    depth: u32,

    /// How batched layers receive their inputs
    #[arg(long, value_enum, default_value_t = ModeArg::Combined)]
    mode: ModeArg,

    /// Write the JSON document here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print an ASCII preview of the labels
    #[arg(long)]
    preview: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Combined,
    Individual,
}

impl From<ModeArg> for BatchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Combined => BatchMode::Combined,
            ModeArg::Individual => BatchMode::Individual,
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!("Starting biomegen v{}", env!("CARGO_PKG_VERSION"));

    let pipeline = match &args.config {
        Some(path) => PipelineConfig::load_from_path(path)?,
        None => PipelineConfig::load()?,
    };
    let stack = LayerStack::build(&pipeline.stack, args.seed).context("invalid layer stack")?;

    let registry = BiomeRegistry::global();
    let arrays = relation_arrays();
    registry
        .reload(BIOME_COUNT, &arrays.flags, &arrays.mutations, &arrays.equals)
        .context("failed to load biome relations")?;
    let table = registry.snapshot();
    let ctx = BiomeContext::new(&table, &pipeline.biome_ids);

    let (request, labels, row_len) = match args.count {
        Some(count) => {
            if args.size_x != args.size_z {
                warn!(
                    "batch tiles are square; using size {} and ignoring --size-z",
                    args.size_x
                );
            }
            let batch = TileBatch {
                x: args.x,
                z: args.z,
                size: args.size_x,
                dist: args.dist,
                depth: args.depth,
                count,
            };
            let mode = BatchMode::from(args.mode);
            let mut labels = vec![0; batch.output_len()];
            stack.grid_multi(ctx, &batch, mode, &mut labels)?;
            (Request::Batch { batch, mode }, labels, batch.size)
        }
        None => {
            let bounds = GridBounds::new(args.x, args.z, args.size_x, args.size_z);
            let mut labels = vec![0; bounds.len()];
            stack.grid(ctx, args.x, args.z, args.size_x, args.size_z, &mut labels)?;
            (Request::Region { bounds }, labels, bounds.size_z)
        }
    };

    let doc = GridDocument::new(args.seed, request, &labels);
    info!(crc32 = %format!("{:08x}", doc.crc32), cells = labels.len(), "generated");
    match &args.output {
        Some(path) => doc.write_to(path)?,
        None => println!("{}", doc.to_json()?),
    }
    if args.preview {
        print!("{}", output::preview(&labels, row_len));
    }
    Ok(())
}
