//! Adaptive drift compensation.
//!
//! A scalar Kalman estimator tracks the additive bias between a reference
//! glucose level and the incoming readings. It is only updated when the
//! recent history looks settled, and at most once per adaptive interval.

use heapless::Vec;

use crate::config::{DriftConfig, ReferenceMode};

/// Readings kept for stability detection.
pub const HISTORY_SIZE: usize = 10;

/// One-dimensional Kalman estimator for a slowly varying offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetEstimator {
    /// Offset estimate
    pub x: f32,
    /// Estimate error covariance
    pub p: f32,
    q: f32,
    r: f32,
}

impl OffsetEstimator {
    pub const fn new(p0: f32, q: f32, r: f32) -> Self {
        Self { x: 0.0, p: p0, q, r }
    }

    /// One predict/update cycle against `measurement`; returns the new estimate.
    pub fn update(&mut self, measurement: f32) -> f32 {
        // The offset is modelled as constant, so prediction only grows p
        self.p += self.q;
        let gain = self.p / (self.p + self.r);
        self.x += gain * (measurement - self.x);
        self.p *= 1.0 - gain;
        self.x
    }
}

/// Mean and population standard deviation.
fn mean_and_stddev(values: &[f32]) -> (f32, f32) {
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let sum_sq = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>();
    (mean, libm::sqrtf(sum_sq / n))
}

#[derive(Debug, Clone)]
pub struct DriftCompensator<const N: usize = HISTORY_SIZE> {
    config: DriftConfig,
    history: Vec<f32, N>,
    index: usize,
    estimator: OffsetEstimator,
    current_offset: f32,
    last_stable_reference: f32,
    last_stable_reference_time: u32,
    last_compensation_time: Option<u32>,
}

impl DriftCompensator<HISTORY_SIZE> {
    pub fn new(config: DriftConfig) -> Self {
        Self::with_history(config)
    }
}

impl<const N: usize> DriftCompensator<N> {
    /// Compensator with an `N`-reading stability window.
    ///
    /// `config` is expected to be validated; the pipeline never hands over
    /// one that is not. An empty window is rejected at compile time:
    ///
    /// ```compile_fail
    /// use glucose_pipeline::{DriftCompensator, DriftConfig};
    ///
    /// let drift = DriftCompensator::<0>::with_history(DriftConfig::default());
    /// ```
    pub fn with_history(config: DriftConfig) -> Self {
        const { assert!(N > 0, "history must hold at least one reading") };
        Self {
            config,
            history: Vec::new(),
            index: 0,
            estimator: OffsetEstimator::new(config.p0, config.q, config.r),
            current_offset: 0.0,
            last_stable_reference: 0.0,
            last_stable_reference_time: 0,
            last_compensation_time: None,
        }
    }

    pub fn config(&self) -> DriftConfig {
        self.config
    }

    /// Adds `value` to the history, updates the offset estimate when the
    /// gate is open, and returns the compensated (never negative) value.
    pub fn apply_compensation(&mut self, value: f32, now: u32) -> f32 {
        self.record(value);

        let stable = self.detect_stability(now);

        let interval_elapsed = match self.last_compensation_time {
            None => true,
            Some(last) => now.wrapping_sub(last) >= self.config.adaptive_interval_secs,
        };

        if stable && interval_elapsed && self.last_stable_reference > 0.0 {
            let observed_drift = self.last_stable_reference - value;
            let estimate = self.estimator.update(observed_drift);
            self.current_offset =
                num_traits::clamp(estimate, -self.config.max_offset, self.config.max_offset);
            self.last_compensation_time = Some(now);
            log::debug!(
                "drift adjustment at {}s: observed {:.2}, offset {:.2}",
                now,
                observed_drift,
                self.current_offset
            );
        }

        self.compensate(value)
    }

    /// `value` corrected by the current offset, without recording it.
    pub fn compensate(&self, value: f32) -> f32 {
        (value + self.current_offset).max(0.0)
    }

    fn record(&mut self, value: f32) {
        if self.history.is_full() {
            self.history[self.index] = value;
        } else {
            let _ = self.history.push(value);
        }
        self.index = (self.index + 1) % N;
    }

    /// Stable iff the full history has low spread and a plausible level.
    /// Records the history mean as the reference according to the mode.
    fn detect_stability(&mut self, now: u32) -> bool {
        if !self.history.is_full() {
            return false;
        }

        let (mean, stddev) = mean_and_stddev(&self.history);
        let stable = stddev < self.config.stability_threshold
            && mean > self.config.min_value_for_stability;

        if stable {
            let refresh = match self.config.reference_mode {
                ReferenceMode::Tracking => true,
                ReferenceMode::Latched => self.last_stable_reference <= 0.0,
            };
            if refresh {
                self.last_stable_reference = mean;
                self.last_stable_reference_time = now;
            }
        }
        stable
    }

    pub fn current_offset(&self) -> f32 {
        self.current_offset
    }

    pub fn last_stable_reference(&self) -> f32 {
        self.last_stable_reference
    }

    pub fn last_stable_reference_time(&self) -> u32 {
        self.last_stable_reference_time
    }

    pub fn last_compensation_time(&self) -> Option<u32> {
        self.last_compensation_time
    }

    pub fn estimator(&self) -> &OffsetEstimator {
        &self.estimator
    }

    /// Forces the reference, e.g. from a fingerstick calibration.
    ///
    /// Only positive, finite values are accepted; returns whether the
    /// reference was taken.
    pub fn set_stable_reference(&mut self, value: f32, now: u32) -> bool {
        if !(value.is_finite() && value > 0.0) {
            return false;
        }
        self.last_stable_reference = value;
        self.last_stable_reference_time = now;
        log::info!("stable reference set: {:.2} at {}s", value, now);
        true
    }

    /// Back to the freshly constructed state with the same tunables.
    pub fn reset(&mut self) {
        *self = Self::with_history(self.config);
    }
}

impl Default for DriftCompensator<HISTORY_SIZE> {
    fn default() -> Self {
        Self::new(DriftConfig::default())
    }
}
