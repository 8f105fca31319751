//! Naive cell-by-cell evaluation of padded rules.
//!
//! Every cell rebuilds its own neighbourhood from a coordinate function, with no
//! shared buffers, strides or lane gathering. Layer implementations must agree
//! with it exactly.

use biomegen_world::{GridBounds, PaddedCell, PaddedRule};

/// Evaluate `rule` at `(x, z)`, reading input values from `input(x, z)`.
pub fn padded_cell<R: PaddedRule>(
    rule: &R,
    seed: i64,
    x: i32,
    z: i32,
    input: impl Fn(i32, i32) -> i32,
    side: i32,
) -> i32 {
    let neighbors = R::MODE
        .deltas()
        .map(|(dx, dz)| input(x + dx as i32, z + dz as i32));
    rule.eval(
        seed,
        &PaddedCell {
            x,
            z,
            center: input(x, z),
            neighbors,
            side: if R::SIDE_INPUT { side } else { 0 },
        },
    )
}

/// Evaluate `rule` over `bounds` cell by cell. `side` is laid out like the
/// output.
pub fn padded_grid<R: PaddedRule>(
    rule: &R,
    seed: i64,
    bounds: &GridBounds,
    input: impl Fn(i32, i32) -> i32,
    side: Option<&[i32]>,
) -> Vec<i32> {
    let mut out = Vec::with_capacity(bounds.len());
    for dx in 0..bounds.size_x {
        for dz in 0..bounds.size_z {
            let i = dx * bounds.size_z + dz;
            let x = bounds.x + dx as i32;
            let z = bounds.z + dz as i32;
            let side = side.map_or(0, |s| s[i]);
            out.push(padded_cell(rule, seed, x, z, &input, side));
        }
    }
    out
}
