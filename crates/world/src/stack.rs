//! Layer-stack evaluator: wires configured layers into a graph and evaluates
//! any region or tile batch of its output node.
//!
//! Composition lives entirely in [`StackConfig`]; the evaluator only knows the
//! four layer shapes. A region request first plans, per layer, the union of
//! the regions its consumers read, then evaluates each layer once over that
//! plan in declaration order. Layers read by several consumers, like the
//! shared river zooms, are therefore computed once per request.

use crate::grid::{extract_window, GridBounds, TileBatch};
use crate::padded::{PaddedLayer, PaddedRule};
use crate::rules::{
    AddIsland, AddMushroomIsland, AddSnow, BiomeContext, BiomeEdge, BiomePicker, BiomeSettings,
    DeepOcean, EdgeCoolWarm, EdgeHeatIce, EdgeSpecial, FixedBiome, FuzzyZoom, Hills, Island,
    RandomValues, RareBiome, RemoveTooMuchOcean, River, RiverInit, RiverMix, SelectBiome, Shore,
    Smooth, VoronoiZoom, Zoom,
};
use crate::source::{SourceLayer, SourceRule};
use crate::translation::{TranslationLayer, TranslationRule};
use crate::zoom::{ZoomLayer, ZoomRule};
use biomegen_core::{layer_seed, LayerError};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Rule of one configured layer, with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerKind {
    /// Continental seed.
    Island,
    /// Uniform noise in `0..limit`.
    RandomValues {
        /// Exclusive upper bound.
        #[serde(default = "default_random_limit")]
        limit: i32,
    },
    /// One biome everywhere.
    FixedBiome {
        /// Biome id.
        biome: i32,
    },
    /// Land growth and coast erosion.
    AddIsland,
    /// Ocean to land in open water.
    RemoveTooMuchOcean,
    /// Climate classes.
    AddSnow,
    /// Cool/warm borders.
    EdgeCoolWarm,
    /// Heat/ice borders.
    EdgeHeatIce,
    /// Special climate tags.
    EdgeSpecial,
    /// Mushroom islands in open ocean.
    AddMushroomIsland,
    /// Deep ocean away from coasts.
    DeepOcean,
    /// Climate class to biome.
    Biome(BiomeSettings),
    /// Edge biomes between incompatible neighbours.
    BiomeEdge,
    /// Hills and mutations; `side` is the river noise.
    Hills,
    /// River noise.
    RiverInit,
    /// River outlines.
    River,
    /// Single-cell noise removal.
    Smooth,
    /// Beaches and shores.
    Shore,
    /// Sunflower plains.
    RareBiome,
    /// River overlay; `side` is the river grid.
    RiverMix,
    /// ×2 zoom, mode for the far corner.
    Zoom,
    /// ×2 zoom, random far corner.
    FuzzyZoom,
    /// ×4 nearest-feature-point zoom.
    VoronoiZoom,
}

fn default_random_limit() -> i32 {
    RandomValues::DEFAULT_LIMIT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Source,
    Translation,
    Padded,
    Zoom,
}

impl LayerKind {
    fn shape(&self) -> Shape {
        use LayerKind as K;
        match self {
            K::Island | K::RandomValues { .. } | K::FixedBiome { .. } => Shape::Source,
            K::AddSnow
            | K::EdgeSpecial
            | K::Biome(_)
            | K::RiverInit
            | K::RareBiome
            | K::RiverMix => Shape::Translation,
            K::AddIsland
            | K::RemoveTooMuchOcean
            | K::EdgeCoolWarm
            | K::EdgeHeatIce
            | K::AddMushroomIsland
            | K::DeepOcean
            | K::BiomeEdge
            | K::Hills
            | K::River
            | K::Smooth
            | K::Shore => Shape::Padded,
            K::Zoom | K::FuzzyZoom | K::VoronoiZoom => Shape::Zoom,
        }
    }

    fn takes_side(&self) -> bool {
        matches!(self, LayerKind::Hills | LayerKind::RiverMix)
    }

    /// Input region this layer reads to produce `b`.
    fn input_bounds(&self, b: GridBounds) -> GridBounds {
        let GridBounds {
            x,
            z,
            size_x,
            size_z,
        } = b;
        match self {
            LayerKind::Zoom => ZoomLayer::<Zoom>::input_bounds(x, z, size_x, size_z),
            LayerKind::FuzzyZoom => ZoomLayer::<FuzzyZoom>::input_bounds(x, z, size_x, size_z),
            LayerKind::VoronoiZoom => ZoomLayer::<VoronoiZoom>::input_bounds(x, z, size_x, size_z),
            // padding does not depend on the rule
            _ if self.shape() == Shape::Padded => {
                PaddedLayer::<Smooth>::input_bounds(x, z, size_x, size_z)
            }
            _ => b,
        }
    }
}

/// One layer of a stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Unique name other layers refer to.
    pub name: String,
    /// Rule and parameters.
    #[serde(flatten)]
    pub kind: LayerKind,
    /// Base seed mixed with the world seed.
    pub base_seed: i64,
    /// Primary input layer; required for everything but sources.
    #[serde(default)]
    pub input: Option<String>,
    /// Secondary input layer, for rules that take one.
    #[serde(default)]
    pub side: Option<String>,
}

/// A complete layer graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackConfig {
    /// Layers in dependency order; inputs must be declared before use.
    pub layers: Vec<LayerSpec>,
    /// Name of the layer the stack evaluates.
    pub output: String,
}

/// How [`LayerStack::grid_multi`] feeds padded and zoom layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// One shared input buffer for the whole batch where the tile layout
    /// allows it, per-tile buffers otherwise.
    #[default]
    Combined,
    /// One input buffer per tile.
    Individual,
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    kind: LayerKind,
    seed: i64,
    input: Option<usize>,
    side: Option<usize>,
    picker: Option<BiomePicker>,
}

/// A layer graph bound to one world seed.
#[derive(Debug, Clone)]
pub struct LayerStack {
    nodes: Vec<Node>,
    /// How many input and side references point at each layer.
    readers: Vec<usize>,
    output: usize,
    world_seed: i64,
}

/// Per-request batch results of shared layers, by layer index.
type Memo = HashMap<usize, Vec<i32>>;

fn invalid(msg: String) -> LayerError {
    LayerError::InvalidConfig(msg)
}

impl LayerStack {
    /// Resolve `config` and derive every layer seed for `world_seed`.
    pub fn build(config: &StackConfig, world_seed: i64) -> Result<Self, LayerError> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut nodes = Vec::with_capacity(config.layers.len());

        for spec in &config.layers {
            let name = spec.name.as_str();
            let resolve = |field: &str, target: &Option<String>| {
                target
                    .as_deref()
                    .map(|t| {
                        index.get(t).copied().ok_or_else(|| {
                            invalid(format!(
                                "layer {name}: {field} {t:?} is not declared before it"
                            ))
                        })
                    })
                    .transpose()
            };
            let input = resolve("input", &spec.input)?;
            let side = resolve("side", &spec.side)?;

            match (spec.kind.shape(), input) {
                (Shape::Source, Some(_)) => {
                    return Err(invalid(format!("layer {name}: source layers take no input")));
                }
                (Shape::Source, None) => {}
                (_, None) => return Err(invalid(format!("layer {name}: missing input"))),
                (_, Some(_)) => {}
            }
            if spec.kind.takes_side() != side.is_some() {
                return Err(invalid(if side.is_some() {
                    format!("layer {name}: rule takes no side input")
                } else {
                    format!("layer {name}: missing side input")
                }));
            }

            let picker = match &spec.kind {
                LayerKind::Biome(settings) => Some(settings.prepare()?),
                LayerKind::RandomValues { limit } => {
                    RandomValues::new(*limit)?;
                    None
                }
                _ => None,
            };

            if index.insert(name, nodes.len()).is_some() {
                return Err(invalid(format!("duplicate layer name {name:?}")));
            }
            nodes.push(Node {
                name: spec.name.clone(),
                kind: spec.kind.clone(),
                seed: layer_seed(world_seed, spec.base_seed),
                input,
                side,
                picker,
            });
        }

        let output = *index
            .get(config.output.as_str())
            .ok_or_else(|| invalid(format!("output layer {:?} is not declared", config.output)))?;

        let mut readers = vec![0; nodes.len()];
        for node in &nodes {
            for j in [node.input, node.side].into_iter().flatten() {
                readers[j] += 1;
            }
        }

        debug!(
            layers = nodes.len(),
            output = %config.output,
            world_seed,
            "built layer stack"
        );
        Ok(Self {
            nodes,
            readers,
            output,
            world_seed,
        })
    }

    /// World seed the stack was built for.
    pub fn world_seed(&self) -> i64 {
        self.world_seed
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the stack has no layers.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Seed of the layer called `name`.
    pub fn seed_of(&self, name: &str) -> Option<i64> {
        self.nodes.iter().find(|n| n.name == name).map(|n| n.seed)
    }

    /// Evaluate the output layer over `(x, z, size_x, size_z)`.
    pub fn grid(
        &self,
        ctx: BiomeContext<'_>,
        x: i32,
        z: i32,
        size_x: usize,
        size_z: usize,
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        let bounds = GridBounds::new(x, z, size_x, size_z);
        LayerError::check_len("output", bounds.len(), out.len())?;
        debug!(?bounds, "evaluating stack region");
        self.eval(self.output, ctx, bounds, out)
    }

    /// Evaluate the output layer at a single cell.
    pub fn get(&self, ctx: BiomeContext<'_>, x: i32, z: i32) -> Result<i32, LayerError> {
        let mut out = [0];
        self.eval(self.output, ctx, GridBounds::square(x, z, 1), &mut out)?;
        Ok(out[0])
    }

    /// Evaluate every tile of `batch` from the output layer.
    pub fn grid_multi(
        &self,
        ctx: BiomeContext<'_>,
        batch: &TileBatch,
        mode: BatchMode,
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        LayerError::check_len("output", batch.output_len(), out.len())?;
        debug!(?batch, ?mode, "evaluating stack batch");
        self.eval_multi(self.output, ctx, batch, mode, &mut Memo::new(), out)
    }

    fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    fn input_of(node: &Node) -> Result<usize, LayerError> {
        node.input
            .ok_or_else(|| invalid(format!("layer {}: missing input", node.name)))
    }

    fn picker_of(node: &Node) -> Result<&BiomePicker, LayerError> {
        node.picker
            .as_ref()
            .ok_or_else(|| invalid(format!("layer {}: biome lists not prepared", node.name)))
    }

    /// Bounds every layer must cover for layer `idx` to produce `b`, unioned
    /// over all of its consumers. `None` for layers the request never reads.
    fn plan(&self, idx: usize, b: GridBounds) -> Vec<Option<GridBounds>> {
        let mut needs: Vec<Option<GridBounds>> = vec![None; idx + 1];
        needs[idx] = Some(b);
        // inputs are always declared before their consumers
        for i in (0..=idx).rev() {
            let Some(nb) = needs[i] else { continue };
            let node = self.node(i);
            let reads = [
                node.input.map(|j| (j, node.kind.input_bounds(nb))),
                node.side.map(|j| (j, nb)),
            ];
            for (j, want) in reads.into_iter().flatten() {
                needs[j] = Some(needs[j].map_or(want, |have| have.union(&want)));
            }
        }
        needs
    }

    fn eval(
        &self,
        idx: usize,
        ctx: BiomeContext<'_>,
        b: GridBounds,
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        self.evaluate(idx, ctx, b, out).map(|_| ())
    }

    /// Evaluate layer `idx` over `b`, computing each upstream layer once over
    /// its planned bounds. Returns the number of layers evaluated.
    fn evaluate(
        &self,
        idx: usize,
        ctx: BiomeContext<'_>,
        b: GridBounds,
        out: &mut [i32],
    ) -> Result<usize, LayerError> {
        LayerError::check_len("region", b.len(), out.len())?;
        if b.is_empty() {
            return Ok(0);
        }
        let needs = self.plan(idx, b);

        let mut last_read = vec![0; needs.len()];
        for (i, node) in self.nodes[..=idx].iter().enumerate() {
            if needs[i].is_some() {
                for j in [node.input, node.side].into_iter().flatten() {
                    last_read[j] = last_read[j].max(i);
                }
            }
        }

        let mut buffers: Vec<Option<Vec<i32>>> = vec![None; needs.len()];
        let mut evaluated = 0;
        for i in 0..=idx {
            let Some(nb) = needs[i] else { continue };
            let node = self.node(i);
            trace!(layer = %node.name, bounds = ?nb, "evaluating layer");

            let mut buf = vec![0; nb.len()];
            {
                let input = node
                    .input
                    .map(|j| Self::window(&buffers, &needs, j, node.kind.input_bounds(nb)))
                    .transpose()?;
                let side = node
                    .side
                    .map(|j| Self::window(&buffers, &needs, j, nb))
                    .transpose()?;
                self.eval_node(node, ctx, nb, input.as_deref(), side.as_deref(), &mut buf)?;
            }

            buffers[i] = Some(buf);
            evaluated += 1;
            for j in [node.input, node.side].into_iter().flatten() {
                if last_read[j] == i {
                    buffers[j] = None;
                }
            }
        }

        let result = buffers[idx]
            .as_deref()
            .ok_or_else(|| invalid(format!("layer {}: not evaluated", self.node(idx).name)))?;
        out.copy_from_slice(result);
        Ok(evaluated)
    }

    /// The cells of `want` from layer `j`'s evaluated buffer.
    fn window<'b>(
        buffers: &'b [Option<Vec<i32>>],
        needs: &[Option<GridBounds>],
        j: usize,
        want: GridBounds,
    ) -> Result<Cow<'b, [i32]>, LayerError> {
        let (Some(buf), Some(have)) = (buffers[j].as_deref(), needs[j]) else {
            return Err(invalid(format!("layer #{j} read before it was evaluated")));
        };
        if have == want {
            return Ok(Cow::Borrowed(buf));
        }
        let mut cells = vec![0; want.len()];
        extract_window(buf, &have, &want, &mut cells)?;
        Ok(Cow::Owned(cells))
    }

    /// Run one layer over `b` given its already evaluated inputs.
    fn eval_node(
        &self,
        node: &Node,
        ctx: BiomeContext<'_>,
        b: GridBounds,
        input: Option<&[i32]>,
        side: Option<&[i32]>,
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        let input = || input.ok_or_else(|| invalid(format!("layer {}: missing input", node.name)));

        use LayerKind as K;
        match &node.kind {
            K::Island => self.source(node, Island, b, out),
            K::RandomValues { limit } => self.source(node, RandomValues::new(*limit)?, b, out),
            K::FixedBiome { biome } => self.source(node, FixedBiome(*biome), b, out),

            K::AddSnow => self.translation(node, AddSnow, b, input()?, side, out),
            K::EdgeSpecial => self.translation(node, EdgeSpecial, b, input()?, side, out),
            K::Biome(_) => {
                let rule = SelectBiome::new(ctx, Self::picker_of(node)?);
                self.translation(node, rule, b, input()?, side, out)
            }
            K::RiverInit => self.translation(node, RiverInit, b, input()?, side, out),
            K::RareBiome => self.translation(node, RareBiome::new(ctx), b, input()?, side, out),
            K::RiverMix => self.translation(node, RiverMix::new(ctx), b, input()?, side, out),

            K::AddIsland => self.padded(node, AddIsland, b, input()?, side, out),
            K::RemoveTooMuchOcean => self.padded(node, RemoveTooMuchOcean, b, input()?, side, out),
            K::EdgeCoolWarm => self.padded(node, EdgeCoolWarm, b, input()?, side, out),
            K::EdgeHeatIce => self.padded(node, EdgeHeatIce, b, input()?, side, out),
            K::AddMushroomIsland => {
                self.padded(node, AddMushroomIsland::new(ctx), b, input()?, side, out)
            }
            K::DeepOcean => self.padded(node, DeepOcean::new(ctx), b, input()?, side, out),
            K::BiomeEdge => self.padded(node, BiomeEdge::new(ctx), b, input()?, side, out),
            K::Hills => self.padded(node, Hills::new(ctx), b, input()?, side, out),
            K::River => self.padded(node, River::new(ctx.ids.river), b, input()?, side, out),
            K::Smooth => self.padded(node, Smooth, b, input()?, side, out),
            K::Shore => self.padded(node, Shore::new(ctx), b, input()?, side, out),

            K::Zoom => self.zoom(node, Zoom, b, input()?, out),
            K::FuzzyZoom => self.zoom(node, FuzzyZoom, b, input()?, out),
            K::VoronoiZoom => self.zoom(node, VoronoiZoom, b, input()?, out),
        }
    }

    fn source<R: SourceRule>(
        &self,
        node: &Node,
        rule: R,
        b: GridBounds,
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        SourceLayer::new(node.seed, rule).grid(b.x, b.z, b.size_x, b.size_z, out)
    }

    fn translation<R: TranslationRule>(
        &self,
        node: &Node,
        rule: R,
        b: GridBounds,
        input: &[i32],
        side: Option<&[i32]>,
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        LayerError::check_len("input", out.len(), input.len())?;
        out.copy_from_slice(input);
        TranslationLayer::new(node.seed, rule).grid(b.x, b.z, b.size_x, b.size_z, out, side)
    }

    fn padded<R: PaddedRule>(
        &self,
        node: &Node,
        rule: R,
        b: GridBounds,
        input: &[i32],
        side: Option<&[i32]>,
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        PaddedLayer::new(node.seed, rule).grid(b.x, b.z, b.size_x, b.size_z, input, side, out)
    }

    fn zoom<R: ZoomRule>(
        &self,
        node: &Node,
        rule: R,
        b: GridBounds,
        input: &[i32],
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        ZoomLayer::new(node.seed, rule).grid(b.x, b.z, b.size_x, b.size_z, input, out)
    }

    /// Evaluate `regions` of layer `idx` into consecutive slices of one buffer.
    fn regions(
        &self,
        idx: usize,
        ctx: BiomeContext<'_>,
        regions: impl IntoIterator<Item = GridBounds>,
        len: usize,
    ) -> Result<Vec<i32>, LayerError> {
        let mut buf = vec![0; len];
        let mut at = 0;
        for bounds in regions {
            let end = at + bounds.len();
            if end > len {
                return Err(LayerError::BufferTooSmall {
                    buffer: "batch input",
                    required: end,
                    actual: len,
                });
            }
            self.eval(idx, ctx, bounds, &mut buf[at..end])?;
            at = end;
        }
        Ok(buf)
    }

    /// Evaluate layer `idx` for the whole batch. Results of layers read by
    /// more than one consumer are kept in `memo` for the rest of the request.
    fn eval_multi(
        &self,
        idx: usize,
        ctx: BiomeContext<'_>,
        batch: &TileBatch,
        mode: BatchMode,
        memo: &mut Memo,
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        if let Some(cached) = memo.get(&idx) {
            LayerError::check_len("output", cached.len(), out.len())?;
            out.copy_from_slice(cached);
            return Ok(());
        }
        self.eval_multi_node(idx, ctx, batch, mode, memo, out)?;
        if self.readers[idx] > 1 {
            memo.insert(idx, out.to_vec());
        }
        Ok(())
    }

    fn eval_multi_node(
        &self,
        idx: usize,
        ctx: BiomeContext<'_>,
        batch: &TileBatch,
        mode: BatchMode,
        memo: &mut Memo,
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        let node = self.node(idx);
        trace!(layer = %node.name, ?mode, "evaluating layer batch");
        if batch.output_len() == 0 {
            return Ok(());
        }

        use LayerKind as K;
        match &node.kind {
            K::Island => SourceLayer::new(node.seed, Island).grid_multi(batch, out),
            K::RandomValues { limit } => {
                SourceLayer::new(node.seed, RandomValues::new(*limit)?).grid_multi(batch, out)
            }
            K::FixedBiome { biome } => {
                SourceLayer::new(node.seed, FixedBiome(*biome)).grid_multi(batch, out)
            }

            K::AddSnow => self.translation_multi(node, AddSnow, ctx, batch, mode, memo, out),
            K::EdgeSpecial => {
                self.translation_multi(node, EdgeSpecial, ctx, batch, mode, memo, out)
            }
            K::Biome(_) => {
                let rule = SelectBiome::new(ctx, Self::picker_of(node)?);
                self.translation_multi(node, rule, ctx, batch, mode, memo, out)
            }
            K::RiverInit => self.translation_multi(node, RiverInit, ctx, batch, mode, memo, out),
            K::RareBiome => {
                let rule = RareBiome::new(ctx);
                self.translation_multi(node, rule, ctx, batch, mode, memo, out)
            }
            K::RiverMix => {
                let rule = RiverMix::new(ctx);
                self.translation_multi(node, rule, ctx, batch, mode, memo, out)
            }

            K::AddIsland => self.padded_multi(node, AddIsland, ctx, batch, mode, memo, out),
            K::RemoveTooMuchOcean => {
                self.padded_multi(node, RemoveTooMuchOcean, ctx, batch, mode, memo, out)
            }
            K::EdgeCoolWarm => self.padded_multi(node, EdgeCoolWarm, ctx, batch, mode, memo, out),
            K::EdgeHeatIce => self.padded_multi(node, EdgeHeatIce, ctx, batch, mode, memo, out),
            K::AddMushroomIsland => {
                let rule = AddMushroomIsland::new(ctx);
                self.padded_multi(node, rule, ctx, batch, mode, memo, out)
            }
            K::DeepOcean => {
                let rule = DeepOcean::new(ctx);
                self.padded_multi(node, rule, ctx, batch, mode, memo, out)
            }
            K::BiomeEdge => {
                let rule = BiomeEdge::new(ctx);
                self.padded_multi(node, rule, ctx, batch, mode, memo, out)
            }
            K::Hills => self.padded_multi(node, Hills::new(ctx), ctx, batch, mode, memo, out),
            K::River => {
                let rule = River::new(ctx.ids.river);
                self.padded_multi(node, rule, ctx, batch, mode, memo, out)
            }
            K::Smooth => self.padded_multi(node, Smooth, ctx, batch, mode, memo, out),
            K::Shore => self.padded_multi(node, Shore::new(ctx), ctx, batch, mode, memo, out),

            K::Zoom => self.zoom_multi(node, Zoom, ctx, batch, mode, out),
            K::FuzzyZoom => self.zoom_multi(node, FuzzyZoom, ctx, batch, mode, out),
            K::VoronoiZoom => self.zoom_multi(node, VoronoiZoom, ctx, batch, mode, out),
        }
    }

    /// Side input of `node` laid out like the batch output.
    fn side_multi(
        &self,
        node: &Node,
        ctx: BiomeContext<'_>,
        batch: &TileBatch,
        mode: BatchMode,
        memo: &mut Memo,
    ) -> Result<Option<Vec<i32>>, LayerError> {
        node.side
            .map(|side| {
                let mut buf = vec![0; batch.output_len()];
                self.eval_multi(side, ctx, batch, mode, memo, &mut buf).map(|_| buf)
            })
            .transpose()
    }

    #[allow(clippy::too_many_arguments)]
    fn translation_multi<R: TranslationRule>(
        &self,
        node: &Node,
        rule: R,
        ctx: BiomeContext<'_>,
        batch: &TileBatch,
        mode: BatchMode,
        memo: &mut Memo,
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        self.eval_multi(Self::input_of(node)?, ctx, batch, mode, memo, out)?;
        let side = self.side_multi(node, ctx, batch, mode, memo)?;
        TranslationLayer::new(node.seed, rule).grid_multi(batch, out, side.as_deref())
    }

    #[allow(clippy::too_many_arguments)]
    fn padded_multi<R: PaddedRule>(
        &self,
        node: &Node,
        rule: R,
        ctx: BiomeContext<'_>,
        batch: &TileBatch,
        mode: BatchMode,
        memo: &mut Memo,
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        let input_idx = Self::input_of(node)?;
        let layer = PaddedLayer::new(node.seed, rule);
        let side = self.side_multi(node, ctx, batch, mode, memo)?;

        if mode == BatchMode::Combined {
            if PaddedLayer::<R>::combined_compatible(batch) {
                let bounds = PaddedLayer::<R>::combined_input_bounds(batch);
                let input = self.regions(input_idx, ctx, [bounds], bounds.len())?;
                return layer.grid_multi_combined(batch, &input, side.as_deref(), out);
            }
            debug!(layer = %node.name, "tile layout not combinable, using per-tile inputs");
        }

        let in_size = PaddedLayer::<R>::individual_input_size(batch);
        let tiles = batch.tiles().map(|(_, gx, gz)| {
            let (x, z) = batch.tile_origin(gx, gz);
            PaddedLayer::<R>::input_bounds(x, z, batch.size, batch.size)
        });
        let input = self.regions(input_idx, ctx, tiles, in_size * in_size * batch.tile_count())?;
        layer.grid_multi_individual(batch, &input, side.as_deref(), out)
    }

    fn zoom_multi<R: ZoomRule>(
        &self,
        node: &Node,
        rule: R,
        ctx: BiomeContext<'_>,
        batch: &TileBatch,
        mode: BatchMode,
        out: &mut [i32],
    ) -> Result<(), LayerError> {
        let input_idx = Self::input_of(node)?;
        let layer = ZoomLayer::new(node.seed, rule);

        if mode == BatchMode::Combined {
            if ZoomLayer::<R>::combined_compatible(batch) {
                let bounds = ZoomLayer::<R>::combined_input_bounds(batch);
                let input = self.regions(input_idx, ctx, [bounds], bounds.len())?;
                return layer.grid_multi_combined(batch, &input, out);
            }
            debug!(layer = %node.name, "tile layout not combinable, using per-tile inputs");
        }

        let in_size = ZoomLayer::<R>::tile_input_size(batch);
        let tiles = batch.tiles().map(|(_, gx, gz)| {
            let (x, z) = batch.tile_origin(gx, gz);
            GridBounds::square(x >> R::ZOOM, z >> R::ZOOM, in_size)
        });
        let input = self.regions(input_idx, ctx, tiles, in_size * in_size * batch.tile_count())?;
        layer.grid_multi_individual(batch, &input, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome_ids::BiomeIds;
    use crate::vanilla::{vanilla_stack, vanilla_table};
    use std::collections::HashSet;

    fn spec(name: &str, kind: LayerKind, base_seed: i64, input: Option<&str>) -> LayerSpec {
        LayerSpec {
            name: name.to_string(),
            kind,
            base_seed,
            input: input.map(str::to_string),
            side: None,
        }
    }

    fn continent() -> StackConfig {
        StackConfig {
            layers: vec![
                spec("island", LayerKind::Island, 1, None),
                spec("fuzzy", LayerKind::FuzzyZoom, 2000, Some("island")),
                spec("grow", LayerKind::AddIsland, 1, Some("fuzzy")),
                spec("zoom", LayerKind::Zoom, 2001, Some("grow")),
                spec("smooth", LayerKind::Smooth, 1000, Some("zoom")),
            ],
            output: "smooth".to_string(),
        }
    }

    #[test]
    fn test_build_derives_layer_seeds() {
        let stack = LayerStack::build(&continent(), 12345).unwrap();
        assert_eq!(stack.len(), 5);
        assert_eq!(stack.seed_of("island"), Some(layer_seed(12345, 1)));
        assert_eq!(stack.seed_of("zoom"), Some(layer_seed(12345, 2001)));
        assert_eq!(stack.seed_of("missing"), None);
    }

    #[test]
    fn test_build_rejects_bad_graphs() {
        let mut forward = continent();
        forward.layers.swap(0, 1);
        assert!(matches!(
            LayerStack::build(&forward, 0),
            Err(LayerError::InvalidConfig(_))
        ));

        let mut duplicate = continent();
        duplicate.layers[2].name = "fuzzy".to_string();
        assert!(LayerStack::build(&duplicate, 0).is_err());

        let mut no_output = continent();
        no_output.output = "nope".to_string();
        assert!(LayerStack::build(&no_output, 0).is_err());

        let mut sourced = continent();
        sourced.layers[0].input = Some("island".to_string());
        assert!(LayerStack::build(&sourced, 0).is_err());

        let mut hills = continent();
        hills
            .layers
            .push(spec("hills", LayerKind::Hills, 1000, Some("smooth")));
        assert!(LayerStack::build(&hills, 0).is_err());
    }

    #[test]
    fn test_windows_agree_with_enclosing_region() {
        let table = vanilla_table().unwrap();
        let ids = BiomeIds::default();
        let ctx = BiomeContext::new(&table, &ids);
        let stack = LayerStack::build(&continent(), 99).unwrap();

        let mut whole = vec![0; 20 * 20];
        stack.grid(ctx, -10, -10, 20, 20, &mut whole).unwrap();
        for (x, z, sx, sz) in [(-3, 2, 5, 4), (-10, -10, 1, 1), (1, -7, 9, 3)] {
            let mut part = vec![0; sx * sz];
            stack.grid(ctx, x, z, sx, sz, &mut part).unwrap();
            for dx in 0..sx {
                for dz in 0..sz {
                    let w = (x + 10) as usize + dx;
                    let h = (z + 10) as usize + dz;
                    assert_eq!(part[dx * sz + dz], whole[w * 20 + h]);
                }
            }
        }
        assert_eq!(stack.get(ctx, 0, 0).unwrap(), whole[10 * 20 + 10]);
    }

    fn position(stack: &LayerStack, name: &str) -> usize {
        stack.nodes.iter().position(|n| n.name == name).unwrap()
    }

    #[test]
    fn test_shared_layers_evaluate_once_per_region() {
        let table = vanilla_table().unwrap();
        let ids = BiomeIds::default();
        let ctx = BiomeContext::new(&table, &ids);
        let stack = LayerStack::build(&vanilla_stack(), 5).unwrap();

        let mut reachable = HashSet::new();
        let mut pending = vec![stack.output];
        while let Some(i) = pending.pop() {
            if reachable.insert(i) {
                let node = stack.node(i);
                pending.extend(node.input.into_iter().chain(node.side));
            }
        }

        let b = GridBounds::new(-20, 7, 24, 16);
        let mut out = vec![0; b.len()];
        let evaluated = stack.evaluate(stack.output, ctx, b, &mut out).unwrap();
        assert_eq!(evaluated, reachable.len());

        // hills and the river branch both read river_zoom_1 and deep_ocean
        let needs = stack.plan(stack.output, b);
        let hills = needs[position(&stack, "hills")].unwrap();
        let river_zoom = needs[position(&stack, "river_zoom_1")].unwrap();
        let river_zoom_2 = needs[position(&stack, "river_zoom_2")].unwrap();
        assert!(river_zoom.contains(&hills));
        assert!(river_zoom.contains(&LayerKind::Zoom.input_bounds(river_zoom_2)));
        assert_eq!(stack.readers[position(&stack, "river_zoom_1")], 2);
        assert_eq!(stack.readers[position(&stack, "deep_ocean")], 2);
    }

    #[test]
    fn test_planned_region_matches_single_cells() {
        let table = vanilla_table().unwrap();
        let ids = BiomeIds::default();
        let ctx = BiomeContext::new(&table, &ids);
        let stack = LayerStack::build(&vanilla_stack(), -42).unwrap();

        let mut region = vec![0; 5 * 3];
        stack.grid(ctx, 13, -2, 5, 3, &mut region).unwrap();
        for dx in 0..5 {
            for dz in 0..3 {
                let cell = stack.get(ctx, 13 + dx as i32, -2 + dz as i32).unwrap();
                assert_eq!(region[dx * 3 + dz], cell, "({dx}, {dz})");
            }
        }
    }

    #[test]
    fn test_batch_modes_match_per_tile_regions() {
        let table = vanilla_table().unwrap();
        let ids = BiomeIds::default();
        let ctx = BiomeContext::new(&table, &ids);
        let stack = LayerStack::build(&continent(), 7).unwrap();
        let batch = TileBatch {
            x: -16,
            z: 32,
            size: 8,
            dist: 16,
            depth: 0,
            count: 3,
        };

        let mut expected = vec![0; batch.output_len()];
        for (i, gx, gz) in batch.tiles() {
            let (x, z) = batch.tile_origin(gx, gz);
            let tile = &mut expected[i * batch.tile_len()..(i + 1) * batch.tile_len()];
            stack.grid(ctx, x, z, batch.size, batch.size, tile).unwrap();
        }
        for mode in [BatchMode::Combined, BatchMode::Individual] {
            let mut out = vec![0; batch.output_len()];
            stack.grid_multi(ctx, &batch, mode, &mut out).unwrap();
            assert_eq!(out, expected, "{mode:?}");
        }
    }

    #[test]
    fn test_negative_spacing_uses_per_tile_inputs() {
        let table = vanilla_table().unwrap();
        let ids = BiomeIds::default();
        let ctx = BiomeContext::new(&table, &ids);
        let stack = LayerStack::build(&continent(), 3).unwrap();
        let batch = TileBatch {
            x: 40,
            z: -8,
            size: 4,
            dist: -12,
            depth: 0,
            count: 2,
        };

        let mut expected = vec![0; batch.output_len()];
        for (i, gx, gz) in batch.tiles() {
            let (x, z) = batch.tile_origin(gx, gz);
            let tile = &mut expected[i * batch.tile_len()..(i + 1) * batch.tile_len()];
            stack.grid(ctx, x, z, batch.size, batch.size, tile).unwrap();
        }
        let mut out = vec![0; batch.output_len()];
        stack
            .grid_multi(ctx, &batch, BatchMode::Combined, &mut out)
            .unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_kind_deserializes_from_flat_table() {
        let spec: LayerSpec = serde_json::from_str(
            r#"{"name":"noise","type":"random_values","base_seed":3}"#,
        )
        .unwrap();
        assert_eq!(spec.kind, LayerKind::RandomValues { limit: 256 });
        assert_eq!(spec.input, None);

        let spec: LayerSpec = serde_json::from_str(
            r#"{"name":"b","type":"biome","base_seed":200,"input":"c","fixed_biome":4}"#,
        )
        .unwrap();
        match spec.kind {
            LayerKind::Biome(settings) => {
                assert_eq!(settings.fixed_biome, 4);
                assert_eq!(settings.icy, BiomeSettings::default().icy);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
