//! Per-tile rules of the magnifying layers.

use crate::zoom::{TileWriter, ZoomRule};
use biomegen_core::CellRng;

/// Most common of four values; ties and all-distinct fall back to a draw.
#[inline]
fn mode_or_random(a: i32, b: i32, c: i32, d: i32, rng: &mut CellRng) -> i32 {
    if b == c && c == d {
        return b;
    }
    if a == b && a == c {
        return a;
    }
    if a == b && a == d {
        return a;
    }
    if a == c && a == d {
        return a;
    }
    if a == b && c != d {
        return a;
    }
    if a == c && b != d {
        return a;
    }
    if a == d && b != c {
        return a;
    }
    if b == c && a != d {
        return b;
    }
    if b == d && a != c {
        return b;
    }
    if c == d && a != b {
        return c;
    }
    [a, b, c, d][rng.next_int_const::<4>() as usize]
}

/// Writes the three randomised cells of a 2×2 tile; `last` picks the far
/// corner.
#[inline(always)]
fn zoom_2x2(
    seed: i64,
    x: i32,
    z: i32,
    v: [i32; 4],
    out: &mut TileWriter<'_>,
    last: impl FnOnce([i32; 4], &mut CellRng) -> i32,
) {
    let mut rng = CellRng::new(seed, x, z);
    out.set(0, 0, v[0]);
    out.set(0, 1, v[(rng.next_int_const::<2>() as usize) << 1]);
    out.set(1, 0, v[rng.next_int_const::<2>() as usize]);
    out.set(1, 1, last(v, &mut rng));
}

/// Doubles resolution, taking the local mode for the far corner.
#[derive(Debug, Clone, Copy, Default)]
pub struct Zoom;

impl ZoomRule for Zoom {
    const ZOOM: u32 = 1;

    fn zoom_tile(&self, seed: i64, x: i32, z: i32, v: [i32; 4], out: &mut TileWriter<'_>) {
        zoom_2x2(seed, x, z, v, out, |[a, b, c, d], rng| {
            mode_or_random(a, b, c, d, rng)
        });
    }
}

/// Doubles resolution, drawing the far corner uniformly.
#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzyZoom;

impl ZoomRule for FuzzyZoom {
    const ZOOM: u32 = 1;

    fn zoom_tile(&self, seed: i64, x: i32, z: i32, v: [i32; 4], out: &mut TileWriter<'_>) {
        zoom_2x2(seed, x, z, v, out, |v, rng| {
            v[rng.next_int_const::<4>() as usize]
        });
    }
}

/// Quadruples resolution by assigning each cell to the nearest of four
/// jittered feature points, one per low-resolution corner.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoronoiZoom;

/// Jitter span of a feature point, in output cells.
const JITTER: f32 = 3.6;

impl VoronoiZoom {
    fn jitter(rng: &mut CellRng) -> f32 {
        (rng.next_int_const::<1024>() as f32 * (1.0 / 1024.0) - 0.5) * JITTER
    }
}

impl ZoomRule for VoronoiZoom {
    const ZOOM: u32 = 2;

    fn zoom_tile(&self, seed: i64, x: i32, z: i32, v: [i32; 4], out: &mut TileWriter<'_>) {
        // (dx, dz) of each feature point's corner, in tie-break order
        const CORNERS: [(i32, i32); 4] = [(0, 0), (0, 1), (1, 0), (1, 1)];
        let values = [v[0], v[2], v[1], v[3]];

        let points = CORNERS.map(|(cx, cz)| {
            let mut rng = CellRng::new(seed, x + (cx << 2), z + (cz << 2));
            let px = Self::jitter(&mut rng) + (cx << 2) as f32;
            let pz = Self::jitter(&mut rng) + (cz << 2) as f32;
            (px, pz)
        });

        for dx in 0..4usize {
            for dz in 0..4usize {
                let mut best = 0;
                let mut best_dist = f32::INFINITY;
                for (i, &(px, pz)) in points.iter().enumerate() {
                    let ddx = dx as f32 - px;
                    let ddz = dz as f32 - pz;
                    let dist = ddx * ddx + ddz * ddz;
                    if dist < best_dist {
                        best = i;
                        best_dist = dist;
                    }
                }
                out.set(dx, dz, values[best]);
            }
        }
    }
}
