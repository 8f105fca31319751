//! Per-cell pseudo-random generator.
//!
//! Every cell of every layer gets its own generator, seeded from the layer
//! seed and the cell's absolute coordinates. Output therefore never depends on
//! which region a cell was computed as part of.

use crate::FastModI64;

/// LCG multiplier shared by the cell generator and seed derivation.
pub const MULTIPLIER: i64 = 6_364_136_223_846_793_005;
/// LCG increment shared by the cell generator and seed derivation.
pub const INCREMENT: i64 = 1_442_695_040_888_963_407;

/// One mixing step: `state * (state * MULTIPLIER + INCREMENT) + seed`, wrapping.
#[inline(always)]
pub const fn update(state: i64, seed: i64) -> i64 {
    state
        .wrapping_mul(state.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT))
        .wrapping_add(seed)
}

/// Initial generator state for the cell `(x, z)`.
#[inline(always)]
pub const fn start(seed: i64, x: i32, z: i32) -> i64 {
    let x = x as i64;
    let z = z as i64;
    let mut state = update(seed, x);
    state = update(state, z);
    state = update(state, x);
    update(state, z)
}

/// Seeded generator for a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRng {
    state: i64,
    seed: i64,
}

impl CellRng {
    /// Seed the generator for cell `(x, z)` of a layer whose seed is `seed`.
    #[inline(always)]
    pub const fn new(seed: i64, x: i32, z: i32) -> Self {
        Self {
            state: start(seed, x, z),
            seed,
        }
    }

    /// Current state, before the next draw.
    pub const fn state(&self) -> i64 {
        self.state
    }

    #[inline(always)]
    fn advance(&mut self) {
        self.state = update(self.state, self.seed);
    }

    /// Uniform draw in `0..MAX` with a compile-time bound.
    ///
    /// Powers of two reduce to a mask of the shifted state.
    #[inline(always)]
    pub fn next_int_const<const MAX: i32>(&mut self) -> i32 {
        let r = if MAX & (MAX - 1) == 0 {
            ((self.state >> 24) as i32) & (MAX - 1)
        } else {
            let r = ((self.state >> 24) % MAX as i64) as i32;
            r + ((r >> 31) & MAX)
        };
        self.advance();
        r
    }

    /// Uniform draw in `0..max`. `max` must be positive.
    #[inline(always)]
    pub fn next_int(&mut self, max: i32) -> i32 {
        debug_assert!(max > 0, "next_int bound must be positive");
        let r = ((self.state >> 24) % max as i64) as i32;
        self.advance();
        r + ((r >> 31) & max)
    }

    /// Uniform draw using a precomputed divisor.
    #[inline(always)]
    pub fn next_int_fast(&mut self, max: &FastModI64) -> i32 {
        let r = max.rem(self.state >> 24) as i32;
        self.advance();
        r + ((r >> 31) & max.divisor() as i32)
    }

    /// Advance past `COUNT` draws without computing them.
    #[inline(always)]
    pub fn skip<const COUNT: usize>(&mut self) {
        for _ in 0..COUNT {
            self.advance();
        }
    }
}
