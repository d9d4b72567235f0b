use crate::sample::Sample;

use super::window::SampleWindow;

/// Simple moving average filter state
///
/// Maintains a circular buffer of past samples. The sum is taken in the
/// sample type's wide accumulator, so a fixed-point window cannot overflow.
#[derive(Debug, Clone)]
pub struct MovingAvgFilter<S> {
    window: SampleWindow<S>,
}

impl<S: Sample> MovingAvgFilter<S> {
    /// Create new moving average filter
    ///
    /// window_size must be > 0 and <= MAX_WINDOW
    pub fn new(window_size: usize) -> Self {
        Self {
            window: SampleWindow::new(window_size),
        }
    }

    /// Apply moving average filter
    ///
    /// Averages the last window_size samples. Until buffer is full,
    /// averages all samples received so far.
    pub fn apply(&mut self, input: S) -> S {
        self.window.push(input);

        let sum = self
            .window
            .values()
            .iter()
            .fold(S::Acc::default(), |acc, v| acc + v.widen());
        S::mean(sum, self.window.len())
    }

    pub fn fill_count(&self) -> usize {
        self.window.len()
    }

    /// Reset filter state
    pub fn reset(&mut self) {
        self.window.reset();
    }
}
