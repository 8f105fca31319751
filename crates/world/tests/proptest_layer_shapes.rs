//! Property-based tests for the layer shapes
//!
//! Every layer must produce the same cell values no matter how a request is
//! cut up:
//! - padded layers agree with a naive per-cell evaluation, side input included
//! - zoom windows agree with any enclosing region
//! - batched tiles agree with per-tile requests in both batch modes

use biomegen_testkit::random_grid;
use biomegen_testkit::reference::padded_grid;
use biomegen_world::rules::{
    AddIsland, BiomeEdge, FuzzyZoom, Hills, Shore, Smooth, VoronoiZoom, Zoom,
};
use biomegen_world::vanilla::vanilla_table;
use biomegen_world::{
    BiomeContext, BiomeIds, CellRng, GridBounds, PaddedLayer, PaddedRule, TileBatch, ZoomLayer,
    ZoomRule,
};
use proptest::prelude::*;

/// Stand-in for a parent layer: a fixed value per absolute cell.
fn plane(seed: i64, limit: i32, x: i32, z: i32) -> i32 {
    CellRng::new(seed, x, z).next_int(limit)
}

fn fill(seed: i64, limit: i32, b: &GridBounds) -> Vec<i32> {
    let mut v = Vec::with_capacity(b.len());
    for dx in 0..b.size_x as i32 {
        for dz in 0..b.size_z as i32 {
            v.push(plane(seed, limit, b.x + dx, b.z + dz));
        }
    }
    v
}

fn padded_region<R: PaddedRule>(
    layer: &PaddedLayer<R>,
    input_seed: i64,
    b: GridBounds,
) -> Vec<i32> {
    let in_bounds = PaddedLayer::<R>::input_bounds(b.x, b.z, b.size_x, b.size_z);
    let input = fill(input_seed, 40, &in_bounds);
    let mut out = vec![0; b.len()];
    layer
        .grid(b.x, b.z, b.size_x, b.size_z, &input, None, &mut out)
        .unwrap();
    out
}

fn zoom_region<R: ZoomRule>(layer: &ZoomLayer<R>, input_seed: i64, b: GridBounds) -> Vec<i32> {
    let in_bounds = ZoomLayer::<R>::input_bounds(b.x, b.z, b.size_x, b.size_z);
    let input = fill(input_seed, 5, &in_bounds);
    let mut out = vec![0; b.len()];
    layer.grid(b.x, b.z, b.size_x, b.size_z, &input, &mut out).unwrap();
    out
}

fn check_zoom_window<R: ZoomRule>(
    layer: &ZoomLayer<R>,
    input_seed: i64,
    outer: GridBounds,
    window: GridBounds,
) -> Result<(), TestCaseError> {
    let whole = zoom_region(layer, input_seed, outer);
    let part = zoom_region(layer, input_seed, window);
    let expected = biomegen_testkit::window_of(&whole, &outer, &window).unwrap();
    prop_assert_eq!(part, expected);
    Ok(())
}

fn per_tile<F>(batch: &TileBatch, mut region: F) -> Vec<i32>
where
    F: FnMut(GridBounds) -> Vec<i32>,
{
    let mut out = Vec::with_capacity(batch.output_len());
    for (_, gx, gz) in batch.tiles() {
        out.extend(region(batch.tile_bounds(gx, gz)));
    }
    out
}

fn check_zoom_batch<R: ZoomRule>(
    layer: &ZoomLayer<R>,
    input_seed: i64,
    batch: &TileBatch,
) -> Result<(), TestCaseError> {
    let expected = per_tile(batch, |b| zoom_region(layer, input_seed, b));

    prop_assert!(ZoomLayer::<R>::combined_compatible(batch));
    let input = fill(input_seed, 5, &ZoomLayer::<R>::combined_input_bounds(batch));
    let mut combined = vec![0; batch.output_len()];
    layer.grid_multi_combined(batch, &input, &mut combined).unwrap();
    prop_assert_eq!(&combined, &expected);

    let side = ZoomLayer::<R>::tile_input_size(batch);
    let mut input = Vec::new();
    for (_, gx, gz) in batch.tiles() {
        let (x, z) = batch.tile_origin(gx, gz);
        let tile_input = GridBounds::square(x >> R::ZOOM, z >> R::ZOOM, side);
        input.extend(fill(input_seed, 5, &tile_input));
    }
    let mut individual = vec![0; batch.output_len()];
    layer.grid_multi_individual(batch, &input, &mut individual).unwrap();
    prop_assert_eq!(&individual, &expected);
    Ok(())
}

proptest! {
    /// Property: padded layers match the naive per-cell reference
    ///
    /// The lane-gathered row loop must hand every rule exactly the centre and
    /// neighbours a per-cell evaluation would.
    #[test]
    fn padded_matches_reference(
        seed in any::<i64>(),
        input_seed in any::<i64>(),
        x in -1000i32..1000,
        z in -1000i32..1000,
        size_x in 0usize..12,
        size_z in 0usize..12,
    ) {
        let table = vanilla_table().unwrap();
        let ids = BiomeIds::default();
        let ctx = BiomeContext::new(&table, &ids);
        let b = GridBounds::new(x, z, size_x, size_z);
        let input = |x, z| plane(input_seed, 40, x, z);

        let add_island = PaddedLayer::new(seed, AddIsland);
        prop_assert_eq!(
            padded_region(&add_island, input_seed, b),
            padded_grid(&AddIsland, seed, &b, input, None)
        );
        let shore = PaddedLayer::new(seed, Shore::new(ctx));
        prop_assert_eq!(
            padded_region(&shore, input_seed, b),
            padded_grid(&Shore::new(ctx), seed, &b, input, None)
        );
        let edge = PaddedLayer::new(seed, BiomeEdge::new(ctx));
        prop_assert_eq!(
            padded_region(&edge, input_seed, b),
            padded_grid(&BiomeEdge::new(ctx), seed, &b, input, None)
        );
        let smooth = PaddedLayer::new(seed, Smooth);
        prop_assert_eq!(
            padded_region(&smooth, input_seed, b),
            padded_grid(&Smooth, seed, &b, input, None)
        );
    }

    /// Property: hills read their river noise from the side grid cell by cell
    #[test]
    fn hills_side_input_matches_reference(
        seed in any::<i64>(),
        input_seed in any::<i64>(),
        side_seed in any::<u64>(),
        x in -1000i32..1000,
        z in -1000i32..1000,
        size_x in 1usize..10,
        size_z in 1usize..10,
    ) {
        let table = vanilla_table().unwrap();
        let ids = BiomeIds::default();
        let ctx = BiomeContext::new(&table, &ids);
        let b = GridBounds::new(x, z, size_x, size_z);
        // river noise spans 0 and 2..300001; small values hit both sub-value paths
        let side = random_grid(side_seed, b.len(), 64);

        let in_bounds = PaddedLayer::<Hills>::input_bounds(x, z, size_x, size_z);
        let input = fill(input_seed, 40, &in_bounds);
        let mut out = vec![0; b.len()];
        PaddedLayer::new(seed, Hills::new(ctx))
            .grid(x, z, size_x, size_z, &input, Some(side.as_slice()), &mut out)
            .unwrap();

        let expected = padded_grid(
            &Hills::new(ctx),
            seed,
            &b,
            |x, z| plane(input_seed, 40, x, z),
            Some(side.as_slice()),
        );
        prop_assert_eq!(out, expected);
    }

    /// Property: a zoom window equals the same cells of an enclosing request
    ///
    /// Holds for aligned and unaligned origins and extents, for both the ×2
    /// and ×4 zooms.
    #[test]
    fn zoom_windows_match_enclosing_region(
        seed in any::<i64>(),
        input_seed in any::<i64>(),
        ox in -64i32..64,
        oz in -64i32..64,
        wx in 0i32..16,
        wz in 0i32..16,
        size_x in 1usize..12,
        size_z in 1usize..12,
    ) {
        let outer = GridBounds::new(ox, oz, 28, 28);
        let window = GridBounds::new(ox + wx, oz + wz, size_x, size_z);

        check_zoom_window(&ZoomLayer::new(seed, Zoom), input_seed, outer, window)?;
        check_zoom_window(&ZoomLayer::new(seed, FuzzyZoom), input_seed, outer, window)?;
        check_zoom_window(&ZoomLayer::new(seed, VoronoiZoom), input_seed, outer, window)?;
    }

    /// Property: padded batches match per-tile requests
    ///
    /// Tiles are placed on a grid aligned to the batch depth so the combined
    /// layout is always usable.
    #[test]
    fn padded_batches_match_per_tile(
        seed in any::<i64>(),
        input_seed in any::<i64>(),
        depth in 0u32..3,
        ax in -32i32..32,
        az in -32i32..32,
        size in 1usize..8,
        spare in 0i32..8,
        count in 1usize..4,
    ) {
        let spacing = size as i32 + spare;
        let batch = TileBatch {
            x: ax << depth,
            z: az << depth,
            size,
            dist: spacing << depth,
            depth,
            count,
        };
        let layer = PaddedLayer::new(seed, AddIsland);
        let expected = per_tile(&batch, |b| padded_region(&layer, input_seed, b));

        prop_assert!(PaddedLayer::<AddIsland>::combined_compatible(&batch));
        let in_bounds = PaddedLayer::<AddIsland>::combined_input_bounds(&batch);
        let input = fill(input_seed, 40, &in_bounds);
        let mut combined = vec![0; batch.output_len()];
        layer.grid_multi_combined(&batch, &input, None, &mut combined).unwrap();
        prop_assert_eq!(&combined, &expected);

        let mut input = Vec::new();
        for (_, gx, gz) in batch.tiles() {
            let (x, z) = batch.tile_origin(gx, gz);
            input.extend(fill(
                input_seed,
                40,
                &PaddedLayer::<AddIsland>::input_bounds(x, z, size, size),
            ));
        }
        let mut individual = vec![0; batch.output_len()];
        layer.grid_multi_individual(&batch, &input, None, &mut individual).unwrap();
        prop_assert_eq!(&individual, &expected);
    }

    /// Property: zoom batches match per-tile requests
    #[test]
    fn zoom_batches_match_per_tile(
        seed in any::<i64>(),
        input_seed in any::<i64>(),
        depth in 0u32..3,
        ax in -16i32..16,
        az in -16i32..16,
        blocks in 1i32..5,
        size_seed in any::<u16>(),
        count in 1usize..4,
    ) {
        // ×2 zoom: everything aligned to 2 << depth
        let spacing = blocks * 2;
        let size = 1 + size_seed as usize % spacing as usize;
        let batch = TileBatch {
            x: (ax * 2) << depth,
            z: (az * 2) << depth,
            size,
            dist: spacing << depth,
            depth,
            count,
        };
        check_zoom_batch(&ZoomLayer::new(seed, Zoom), input_seed, &batch)?;

        // ×4 zoom: aligned to 4 << depth
        let spacing = blocks * 4;
        let size = 1 + size_seed as usize % spacing as usize;
        let batch = TileBatch {
            x: (ax * 4) << depth,
            z: (az * 4) << depth,
            size,
            dist: spacing << depth,
            depth,
            count,
        };
        check_zoom_batch(&ZoomLayer::new(seed, VoronoiZoom), input_seed, &batch)?;
    }
}
