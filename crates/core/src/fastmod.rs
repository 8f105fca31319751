//! Division and remainder by a runtime-constant divisor.
//!
//! The divisor is analysed once and every subsequent `div`/`rem` costs a
//! widening multiply, a subtract and two shifts. Results are exactly those of
//! the `/` and `%` operators (wrapping for `MIN / -1`).

macro_rules! fast_mod_unsigned {
    ($(#[$doc:meta])* $name:ident, $t:ty, $wide:ty, $bits:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            divisor: $t,
            magic: $t,
            shift: u32,
        }

        impl $name {
            /// Precompute the multiplier for `divisor`.
            ///
            /// A zero divisor is a caller error.
            #[inline]
            pub const fn new(divisor: $t) -> Self {
                debug_assert!(divisor != 0, "fast-mod divisor must be non-zero");
                let shift = $bits - (divisor.wrapping_sub(1)).leading_zeros();
                let pow = (1 as $wide) << shift;
                let magic = (((pow - divisor as $wide) << $bits) / divisor as $wide + 1) as $t;
                Self { divisor, magic, shift }
            }

            /// The divisor this helper was built for.
            #[inline]
            pub const fn divisor(&self) -> $t {
                self.divisor
            }

            /// `n / divisor`.
            #[inline]
            pub const fn div(&self, n: $t) -> $t {
                let t = ((self.magic as $wide * n as $wide) >> $bits) as $t;
                let shift1 = if self.shift == 0 { 0 } else { 1 };
                let shift2 = self.shift.saturating_sub(1);
                (t + ((n - t) >> shift1)) >> shift2
            }

            /// `n % divisor`.
            #[inline]
            pub const fn rem(&self, n: $t) -> $t {
                n - self.div(n) * self.divisor
            }
        }
    };
}

macro_rules! fast_mod_signed {
    ($(#[$doc:meta])* $name:ident, $t:ty, $unsigned:ident, $bits:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            divisor: $t,
            magnitude: $unsigned,
        }

        impl $name {
            /// Precompute the multiplier for `divisor`.
            ///
            /// A zero divisor is a caller error.
            #[inline]
            pub const fn new(divisor: $t) -> Self {
                Self {
                    divisor,
                    magnitude: $unsigned::new(divisor.unsigned_abs()),
                }
            }

            /// The divisor this helper was built for.
            #[inline]
            pub const fn divisor(&self) -> $t {
                self.divisor
            }

            /// `n / divisor`, truncated toward zero.
            #[inline]
            pub const fn div(&self, n: $t) -> $t {
                let q = self.magnitude.div(n.unsigned_abs()) as $t;
                // All ones when the operand signs differ.
                let sign = (n ^ self.divisor) >> ($bits - 1);
                (q ^ sign).wrapping_sub(sign)
            }

            /// `n % divisor`, carrying the sign of `n`.
            #[inline]
            pub const fn rem(&self, n: $t) -> $t {
                n.wrapping_sub(self.div(n).wrapping_mul(self.divisor))
            }
        }
    };
}

fast_mod_unsigned!(
    /// Fast division by a fixed `u32`.
    FastModU32, u32, u64, 32
);
fast_mod_unsigned!(
    /// Fast division by a fixed `u64`.
    FastModU64, u64, u128, 64
);
fast_mod_signed!(
    /// Fast truncating division by a fixed `i32`.
    FastModI32, i32, FastModU32, 32
);
fast_mod_signed!(
    /// Fast truncating division by a fixed `i64`.
    FastModI64, i64, FastModU64, 64
);
