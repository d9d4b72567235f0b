//! Numeric representations the smoothing filter can run in.
//!
//! Filters keep their buffers, histories and coefficients in a [`Sample`]
//! type. Products and sums are gathered in the wider [`Sample::Acc`] type and
//! narrowed once at the end of each step.

use core::ops::{Add, Sub};

use num_traits::AsPrimitive;

use crate::filters::{BiquadKernel, FixedBiquad, FloatBiquad};

pub trait Sample: Copy + Default + PartialOrd + core::fmt::Debug {
    /// Accumulator wide enough to hold a sum of products without overflow.
    type Acc: Copy + Default + Add<Output = Self::Acc> + Sub<Output = Self::Acc>;

    fn from_f32(value: f32) -> Self;
    fn to_f32(self) -> f32;

    /// Same scale as `self`, in accumulator width.
    fn widen(self) -> Self::Acc;

    /// Full-width product of two scaled values, not yet renormalized.
    fn mul_wide(self, rhs: Self) -> Self::Acc;

    /// Renormalizes a sum of [`Sample::mul_wide`] products.
    fn from_product(acc: Self::Acc) -> Self;

    /// Mean of `count` widened values. `count` is never zero.
    fn mean(sum: Self::Acc, count: usize) -> Self;

    /// Low-pass recursion for this representation.
    type Biquad: BiquadKernel<Self>;
}

impl Sample for f32 {
    type Acc = f32;
    type Biquad = FloatBiquad;

    #[inline]
    fn from_f32(value: f32) -> Self {
        value
    }

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn widen(self) -> f32 {
        self
    }

    #[inline]
    fn mul_wide(self, rhs: Self) -> f32 {
        self * rhs
    }

    #[inline]
    fn from_product(acc: f32) -> Self {
        acc
    }

    #[inline]
    fn mean(sum: f32, count: usize) -> Self {
        let n: f32 = count.as_();
        sum / n
    }
}

/// Signed fixed-point value with 15 fractional bits held in an `i32`.
///
/// Range is roughly +/-65536 with a resolution of 1/32768. Multiplication
/// widens to `i64` and shifts right by [`Q15::FRAC_BITS`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Q15(i32);

impl Q15 {
    pub const FRAC_BITS: u32 = 15;
    pub const ONE: Q15 = Q15(1 << Self::FRAC_BITS);
    const SCALE: f32 = (1u32 << Self::FRAC_BITS) as f32;

    pub const fn from_bits(bits: i32) -> Self {
        Q15(bits)
    }

    pub const fn to_bits(self) -> i32 {
        self.0
    }

    #[inline]
    fn saturate(wide: i64) -> Self {
        let narrowed: i32 = wide.clamp(i64::from(i32::MIN), i64::from(i32::MAX)).as_();
        Q15(narrowed)
    }
}

impl Sample for Q15 {
    type Acc = i64;
    type Biquad = FixedBiquad;

    /// Rounds to nearest. Out-of-range values saturate, NaN maps to zero.
    fn from_f32(value: f32) -> Self {
        // `as` from float saturates at the integer bounds
        Q15(libm::roundf(value * Self::SCALE) as i32)
    }

    fn to_f32(self) -> f32 {
        let bits: f32 = self.0.as_();
        bits / Self::SCALE
    }

    #[inline]
    fn widen(self) -> i64 {
        i64::from(self.0)
    }

    #[inline]
    fn mul_wide(self, rhs: Self) -> i64 {
        i64::from(self.0) * i64::from(rhs.0)
    }

    #[inline]
    fn from_product(acc: i64) -> Self {
        // Arithmetic shift: rounds toward negative infinity
        Self::saturate(acc >> Self::FRAC_BITS)
    }

    #[inline]
    fn mean(sum: i64, count: usize) -> Self {
        let n: i64 = count.as_();
        Self::saturate(sum / n)
    }
}
