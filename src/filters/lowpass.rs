use core::fmt::Debug;

use crate::sample::{Q15, Sample};

/// Biquad coefficients, normalized so that a0 == 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Coefficients {
    /// Second-order Butterworth low-pass via the bilinear transform.
    ///
    /// `cutoff` is normalized to the sample rate and must lie in (0.0, 0.5).
    pub fn butterworth(cutoff: f32) -> Self {
        let k = libm::tan(core::f64::consts::PI * f64::from(cutoff));
        let k_sq = k * k;
        let sqrt2 = core::f64::consts::SQRT_2;
        let d = 1.0 + sqrt2 * k + k_sq;

        let b0 = k_sq / d;
        Self {
            b0,
            b1: 2.0 * b0,
            b2: b0,
            a1: 2.0 * (k_sq - 1.0) / d,
            a2: (1.0 - sqrt2 * k + k_sq) / d,
        }
    }
}

/// Direct Form I recursion for one sample representation.
///
/// At low cutoffs `1 + a1 + a2` is tiny, so both coefficients and feedback
/// state need more precision than the samples themselves carry.
pub trait BiquadKernel<S>: Debug + Clone {
    fn new(c: &Coefficients) -> Self;
    fn step(&mut self, input: S) -> S;
    fn reset(&mut self);
}

/// Floating-point kernel; coefficients and histories are held in `f64`.
#[derive(Debug, Clone, Copy)]
pub struct FloatBiquad {
    c: Coefficients,
    // x[n-1], x[n-2]
    x: [f64; 2],
    // y[n-1], y[n-2]
    y: [f64; 2],
}

impl BiquadKernel<f32> for FloatBiquad {
    fn new(c: &Coefficients) -> Self {
        Self {
            c: *c,
            x: [0.0; 2],
            y: [0.0; 2],
        }
    }

    fn step(&mut self, input: f32) -> f32 {
        let x0 = f64::from(input);
        let c = &self.c;
        let y0 = c.b0 * x0 + c.b1 * self.x[0] + c.b2 * self.x[1]
            - c.a1 * self.y[0]
            - c.a2 * self.y[1];

        self.x = [x0, self.x[0]];
        self.y = [y0, self.y[0]];
        y0 as f32
    }

    fn reset(&mut self) {
        self.x = [0.0; 2];
        self.y = [0.0; 2];
    }
}

/// Fixed-point kernel for [`Q15`] samples.
///
/// Taps are Q30. `b1` absorbs the rounding of the other four taps so that
/// `b0 + b1 + b2 == 1 + a1 + a2` holds exactly in integers, giving a DC
/// gain of exactly one. The truncated remainder of each output is carried
/// into the next accumulation, so truncation leaves no deadband around the
/// settled value.
#[derive(Debug, Clone, Copy)]
pub struct FixedBiquad {
    b: [i64; 3],
    a: [i64; 2],
    x: [i64; 2],
    y: [i64; 2],
    residue: i128,
}

impl FixedBiquad {
    const TAP_BITS: u32 = 30;

    fn tap(value: f64) -> i64 {
        libm::round(value * f64::from(1u32 << Self::TAP_BITS)) as i64
    }
}

impl BiquadKernel<Q15> for FixedBiquad {
    fn new(c: &Coefficients) -> Self {
        let one = 1i64 << Self::TAP_BITS;
        let b0 = Self::tap(c.b0);
        let a1 = Self::tap(c.a1);
        let a2 = Self::tap(c.a2);
        let b1 = one + a1 + a2 - 2 * b0;

        Self {
            b: [b0, b1, b0],
            a: [a1, a2],
            x: [0; 2],
            y: [0; 2],
            residue: 0,
        }
    }

    fn step(&mut self, input: Q15) -> Q15 {
        let x0 = i64::from(input.to_bits());
        let acc = i128::from(self.b[0]) * i128::from(x0)
            + i128::from(self.b[1]) * i128::from(self.x[0])
            + i128::from(self.b[2]) * i128::from(self.x[1])
            - i128::from(self.a[0]) * i128::from(self.y[0])
            - i128::from(self.a[1]) * i128::from(self.y[1])
            + self.residue;

        // Arithmetic shift floors, so the residue is always non-negative
        let wide = acc >> Self::TAP_BITS;
        let clamped = wide.clamp(i128::from(i32::MIN), i128::from(i32::MAX));
        self.residue = if clamped == wide {
            acc - (wide << Self::TAP_BITS)
        } else {
            0
        };

        let y0 = clamped as i64;
        self.x = [x0, self.x[0]];
        self.y = [y0, self.y[0]];
        Q15::from_bits(y0 as i32)
    }

    fn reset(&mut self) {
        self.x = [0; 2];
        self.y = [0; 2];
        self.residue = 0;
    }
}

/// Second-order low-pass filter, Direct Form I.
///
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
#[derive(Debug, Clone)]
pub struct LowPassFilter<S: Sample> {
    kernel: S::Biquad,
}

impl<S: Sample> LowPassFilter<S> {
    pub fn new(cutoff: f32) -> Self {
        Self::from_coefficients(Coefficients::butterworth(cutoff))
    }

    pub fn from_coefficients(c: Coefficients) -> Self {
        Self {
            kernel: S::Biquad::new(&c),
        }
    }

    pub fn apply(&mut self, input: S) -> S {
        self.kernel.step(input)
    }

    pub fn reset(&mut self) {
        self.kernel.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::float::FloatCore;

    fn settle<S: Sample>(cutoff: f32, level: f32, samples: usize) -> f32 {
        let mut lp = LowPassFilter::<S>::new(cutoff);
        let x = S::from_f32(level);
        let mut y = S::default();
        for _ in 0..samples {
            y = lp.apply(x);
        }
        y.to_f32()
    }

    #[test]
    fn numerator_is_twice_the_outer_taps() {
        let c = Coefficients::butterworth(0.1);
        assert!((c.b1 - 2.0 * c.b0).abs() < 1e-12);
        assert_eq!(c.b0, c.b2);
    }

    #[test]
    fn known_coefficients_at_tenth_of_sample_rate() {
        let c = Coefficients::butterworth(0.1);
        assert!((c.b0 - 0.067_455).abs() < 1e-5);
        assert!((c.a1 + 1.142_98).abs() < 1e-4);
        assert!((c.a2 - 0.412_8).abs() < 1e-4);
    }

    #[test]
    fn dc_gain_is_unity() {
        for &fc in &[0.0002_f32, 0.01, 0.1, 0.25, 0.45] {
            let c = Coefficients::butterworth(fc);
            let gain = (c.b0 + c.b1 + c.b2) / (1.0 + c.a1 + c.a2);
            assert!((gain - 1.0).abs() < 1e-6, "fc {} gain {}", fc, gain);
        }
    }

    #[test]
    fn fixed_taps_sum_to_exact_unity_gain() {
        for &fc in &[0.0002_f32, 0.001, 0.004, 0.1, 0.49] {
            let k = FixedBiquad::new(&Coefficients::butterworth(fc));
            let num: i64 = k.b.iter().sum();
            assert_eq!(num, (1i64 << 30) + k.a[0] + k.a[1], "fc {}", fc);
            assert!(k.b[0] > 0, "fc {} lost its numerator", fc);
        }
    }

    #[test]
    fn constant_input_settles() {
        let y = settle::<f32>(0.1, 120.0, 200);
        assert!((y - 120.0).abs() < 1e-3);
    }

    #[test]
    fn fixed_point_constant_input_settles() {
        let y = settle::<Q15>(0.1, 120.0, 200);
        assert!((y - 120.0).abs() < 0.01, "settled at {}", y);
    }

    #[test]
    fn very_low_cutoffs_keep_unit_gain() {
        for &fc in &[0.0002_f32, 0.0005, 0.001, 0.003, 0.004] {
            let float = settle::<f32>(fc, 100.0, 60_000);
            let fixed = settle::<Q15>(fc, 100.0, 60_000);
            assert!((float - 100.0).abs() < 0.03, "fc {}: float {}", fc, float);
            assert!((fixed - 100.0).abs() < 0.03, "fc {}: fixed {}", fc, fixed);
        }
    }

    #[test]
    fn fixed_point_settles_from_above() {
        let mut lp = LowPassFilter::<Q15>::new(0.002);
        for _ in 0..20_000 {
            lp.apply(Q15::from_f32(300.0));
        }
        let mut y = Q15::default();
        for _ in 0..40_000 {
            y = lp.apply(Q15::from_f32(80.0));
        }
        assert!((y.to_f32() - 80.0).abs() < 0.03, "settled at {}", y.to_f32());
    }

    #[test]
    fn reset_clears_history() {
        let mut lp = LowPassFilter::new(0.2);
        for _ in 0..10 {
            lp.apply(50.0_f32);
        }
        lp.reset();
        let mut fresh = LowPassFilter::new(0.2);
        assert_eq!(lp.apply(80.0_f32), fresh.apply(80.0_f32));
    }

    #[test]
    fn fixed_reset_clears_residue() {
        let mut lp = LowPassFilter::<Q15>::new(0.003);
        for _ in 0..10 {
            lp.apply(Q15::from_f32(77.7));
        }
        lp.reset();
        let mut fresh = LowPassFilter::<Q15>::new(0.003);
        let x = Q15::from_f32(91.3);
        assert_eq!(lp.apply(x), fresh.apply(x));
    }
}
