use core::cmp::Ordering;

use crate::config::WINDOW_CAPACITY;
use crate::sample::Sample;

use super::window::SampleWindow;

/// Running median over the last `window_size` samples.
///
/// Rejects isolated spikes that a moving average would smear across the
/// whole window. Even counts average the two middle values.
#[derive(Debug, Clone)]
pub struct MedianFilter<S> {
    window: SampleWindow<S>,
}

impl<S: Sample> MedianFilter<S> {
    pub fn new(window_size: usize) -> Self {
        Self {
            window: SampleWindow::new(window_size),
        }
    }

    pub fn apply(&mut self, input: S) -> S {
        self.window.push(input);

        let values = self.window.values();
        let mut sorted = [S::default(); WINDOW_CAPACITY];
        let sorted = &mut sorted[..values.len()];
        sorted.copy_from_slice(values);
        sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 1 {
            sorted[mid]
        } else {
            S::mean(sorted[mid - 1].widen() + sorted[mid].widen(), 2)
        }
    }

    pub fn fill_count(&self) -> usize {
        self.window.len()
    }

    pub fn reset(&mut self) {
        self.window.reset();
    }
}
