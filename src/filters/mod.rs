//! Noise filtering implementations
//!
//! Filters smooth noisy sensor readings. Each stage is generic over its
//! [`Sample`] representation, so the same algorithms run in `f32` or in
//! [`Q15`](crate::sample::Q15) fixed point.

mod ema;
mod lowpass;
mod median;
mod moving_avg;
mod window;

pub use ema::EmaFilter;
pub use lowpass::{BiquadKernel, Coefficients, FixedBiquad, FloatBiquad, LowPassFilter};
pub use median::MedianFilter;
pub use moving_avg::MovingAvgFilter;

use crate::config::{ConfigError, FilterConfig, FilterKind};
use crate::sample::Sample;

/// The active smoothing stage, one variant per [`FilterKind`].
#[derive(Debug, Clone)]
enum Stage<S: Sample> {
    MovingAverage(MovingAvgFilter<S>),
    Ema(EmaFilter<S>),
    LowPass2(LowPassFilter<S>),
    Median(MedianFilter<S>),
    None,
}

impl<S: Sample> Stage<S> {
    /// `cfg` must already be validated.
    fn build(cfg: &FilterConfig) -> Self {
        match cfg.kind {
            FilterKind::MovingAverage => {
                Stage::MovingAverage(MovingAvgFilter::new(usize::from(cfg.window_size)))
            }
            FilterKind::Ema => Stage::Ema(EmaFilter::new(cfg.alpha)),
            FilterKind::LowPass2 => Stage::LowPass2(LowPassFilter::new(cfg.cutoff_freq)),
            FilterKind::Median => Stage::Median(MedianFilter::new(usize::from(cfg.window_size))),
            FilterKind::None => Stage::None,
        }
    }

    fn apply(&mut self, input: S) -> S {
        match self {
            Stage::MovingAverage(f) => f.apply(input),
            Stage::Ema(f) => f.apply(input),
            Stage::LowPass2(f) => f.apply(input),
            Stage::Median(f) => f.apply(input),
            Stage::None => input,
        }
    }

    fn reset(&mut self) {
        match self {
            Stage::MovingAverage(f) => f.reset(),
            Stage::Ema(f) => f.reset(),
            Stage::LowPass2(f) => f.reset(),
            Stage::Median(f) => f.reset(),
            Stage::None => {}
        }
    }
}

/// Configurable smoothing filter.
///
/// Owns its configuration and all filter state. Reconfiguring always starts
/// from a cleared state; a rejected configuration leaves everything as it was.
#[derive(Debug, Clone)]
pub struct SmoothingFilter<S: Sample = f32> {
    config: FilterConfig,
    stage: Stage<S>,
    samples: usize,
    last_output: Option<S>,
}

impl SmoothingFilter<f32> {
    /// Floating-point filter for `config`.
    pub fn new(config: FilterConfig) -> Result<Self, ConfigError> {
        Self::with_precision(config)
    }
}

impl<S: Sample> SmoothingFilter<S> {
    /// Filter running in the sample representation `S`.
    pub fn with_precision(config: FilterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            stage: Stage::build(&config),
            samples: 0,
            last_output: None,
        })
    }

    /// Validates and applies `config`, clearing all filter state.
    ///
    /// On error the previous configuration and state are left untouched.
    pub fn configure(&mut self, config: FilterConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        self.stage = Stage::build(&config);
        self.samples = 0;
        self.last_output = None;
        log::debug!("smoothing filter reconfigured: {:?}", config);
        Ok(())
    }

    pub fn config(&self) -> FilterConfig {
        self.config
    }

    /// Filters one raw reading.
    ///
    /// Non-finite readings are dropped and the previous output is repeated.
    pub fn process(&mut self, raw: f32) -> f32 {
        self.try_process(raw).unwrap_or_else(|| self.current())
    }

    /// Like [`SmoothingFilter::process`], but `None` when the reading was
    /// dropped, so callers can tell a repeated output from a new one.
    pub fn try_process(&mut self, raw: f32) -> Option<f32> {
        if !raw.is_finite() {
            log::warn!("dropping non-finite reading {}", raw);
            return None;
        }

        let output = self.stage.apply(S::from_f32(raw));
        self.samples = self.samples.saturating_add(1);
        self.last_output = Some(output);
        Some(output.to_f32())
    }

    /// Most recent output, or 0.0 before the first sample.
    pub fn current(&self) -> f32 {
        self.last_output.map_or(0.0, Sample::to_f32)
    }

    /// Samples held in the window for windowed kinds, otherwise the number of
    /// samples processed since the last reset.
    pub fn fill_count(&self) -> usize {
        match &self.stage {
            Stage::MovingAverage(f) => f.fill_count(),
            Stage::Median(f) => f.fill_count(),
            _ => self.samples,
        }
    }

    /// Clears filter state, keeping the configuration.
    pub fn reset(&mut self) {
        self.stage.reset();
        self.samples = 0;
        self.last_output = None;
    }
}

impl<S: Sample> Default for SmoothingFilter<S> {
    fn default() -> Self {
        let config = FilterConfig::default();
        Self {
            config,
            stage: Stage::build(&config),
            samples: 0,
            last_output: None,
        }
    }
}
