/// One raw sensor value and the monotonic time it was taken at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f32,
    /// Seconds on a monotonic clock
    pub timestamp: u32,
}

impl Reading {
    pub const fn new(value: f32, timestamp: u32) -> Self {
        Self { value, timestamp }
    }
}

/// Supplier of raw readings, e.g. an ADC front end.
///
/// Bus errors and timeouts stay inside the implementation; the pipeline only
/// sees whether a reading is available this cycle.
pub trait SampleSource {
    fn next_reading(&mut self) -> Option<Reading>;
}

impl<F> SampleSource for F
where
    F: FnMut() -> Option<Reading>,
{
    fn next_reading(&mut self) -> Option<Reading> {
        self()
    }
}
