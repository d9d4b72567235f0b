use crate::sample::Sample;

/// Exponential Moving Average filter state
#[derive(Debug, Clone, Copy)]
pub struct EmaFilter<S> {
    alpha: S,
    one_minus_alpha: S,
    previous: S,
    initialized: bool,
}

impl<S: Sample> EmaFilter<S> {
    /// Create new EMA filter with uninitialized state.
    ///
    /// Both weights are converted once here, so a fixed-point filter never
    /// touches floats on the sample path.
    pub fn new(alpha: f32) -> Self {
        debug_assert!(
            alpha > 0.0 && alpha <= 1.0,
            "EMA alpha must be in range (0.0, 1.0], got {}",
            alpha
        );

        Self {
            alpha: S::from_f32(alpha),
            one_minus_alpha: S::from_f32(1.0 - alpha),
            previous: S::default(),
            initialized: false,
        }
    }

    /// Apply EMA filter: output = alpha * input + (1 - alpha) * previous
    ///
    /// First call initializes the filter to the input value.
    pub fn apply(&mut self, input: S) -> S {
        if !self.initialized {
            self.previous = input;
            self.initialized = true;
            return input;
        }

        let output = S::from_product(
            self.alpha.mul_wide(input) + self.one_minus_alpha.mul_wide(self.previous),
        );
        self.previous = output;
        output
    }

    /// Reset filter state
    pub fn reset(&mut self) {
        self.initialized = false;
        self.previous = S::default();
    }
}
