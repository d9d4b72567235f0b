use heapless::Vec;

use crate::config::WINDOW_CAPACITY;
use crate::sample::Sample;

/// Fixed-capacity circular buffer of the most recent samples.
///
/// Only the first `window_size` slots are used. Until the window is full,
/// `values()` yields only the samples received so far.
#[derive(Debug, Clone)]
pub(crate) struct SampleWindow<S> {
    buffer: Vec<S, WINDOW_CAPACITY>,
    window_size: usize,
    index: usize,
    count: usize,
}

impl<S: Sample> SampleWindow<S> {
    /// `window_size` must be in `1..=WINDOW_CAPACITY`; config validation
    /// guarantees this for every caller.
    pub fn new(window_size: usize) -> Self {
        debug_assert!(window_size > 0 && window_size <= WINDOW_CAPACITY);
        let window_size = window_size.clamp(1, WINDOW_CAPACITY);

        let mut buffer = Vec::new();
        for _ in 0..window_size {
            let _ = buffer.push(S::default());
        }

        Self {
            buffer,
            window_size,
            index: 0,
            count: 0,
        }
    }

    pub fn push(&mut self, value: S) {
        self.buffer[self.index] = value;
        self.index = (self.index + 1) % self.window_size;

        if self.count < self.window_size {
            self.count += 1;
        }
    }

    /// Slots are written in order during the fill phase, so the first
    /// `count` slots always hold exactly the live samples.
    pub fn values(&self) -> &[S] {
        &self.buffer[..self.count]
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.count = 0;
        for val in self.buffer.iter_mut() {
            *val = S::default();
        }
    }
}
