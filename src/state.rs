use crate::drift::DriftCompensator;
use crate::filters::SmoothingFilter;
use crate::sample::Sample;

/// Mutable processing state of one pipeline: everything touched on the
/// sample path. Both pipeline front ends guard exactly this.
#[derive(Debug, Clone)]
pub(crate) struct State<S: Sample> {
    /// Smoothing stage, reset on every reconfiguration
    pub filter: SmoothingFilter<S>,

    /// Drift estimator, survives filter reconfiguration
    pub drift: DriftCompensator,
}

impl<S: Sample> State<S> {
    /// A dropped reading repeats the last compensated output and leaves the
    /// stability history alone.
    pub fn process(&mut self, raw: f32, timestamp: u32) -> f32 {
        let Some(smoothed) = self.filter.try_process(raw) else {
            return self.drift.compensate(self.filter.current());
        };
        let output = self.drift.apply_compensation(smoothed, timestamp);
        log::trace!(
            "t={}s raw={:.2} smoothed={:.2} out={:.2}",
            timestamp,
            raw,
            smoothed,
            output
        );
        output
    }

    pub fn reset(&mut self) {
        self.filter.reset();
        self.drift.reset();
    }
}
