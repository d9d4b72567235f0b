//! Pipeline shared between a sampling context and a command context.

use parking_lot::Mutex;

use crate::config::{DriftConfig, FilterConfig};
use crate::drift::DriftCompensator;
use crate::filters::SmoothingFilter;
use crate::pipeline::{PipelineError, load_drift_config, load_filter_config, persist_filter_config};
use crate::sample::Sample;
use crate::source::SampleSource;
use crate::state::State;
use crate::store::ParameterStore;

/// [`ConditioningPipeline`](crate::ConditioningPipeline) behind a lock.
///
/// Filter and drift state share one mutex, so `process` and reconfiguration
/// are mutually exclusive. The store has its own mutex, always taken before
/// the state mutex. [`SharedPipeline::set_filter_parameter`] holds the store
/// lock across configure and write, so concurrent writers persist in the
/// order they were applied. The write itself runs after the state lock is
/// released and never stalls the sampling path.
pub struct SharedPipeline<P, S: Sample = f32> {
    state: Mutex<State<S>>,
    store: Mutex<P>,
}

impl<P: ParameterStore> SharedPipeline<P, f32> {
    pub fn init(store: P) -> Self {
        Self::init_with_precision(store)
    }
}

impl<P, S> SharedPipeline<P, S>
where
    P: ParameterStore,
    S: Sample,
{
    pub fn init_with_precision(mut store: P) -> Self {
        let filter_config = load_filter_config(&mut store);
        let drift_config = load_drift_config(&mut store);

        Self {
            state: Mutex::new(State {
                filter: SmoothingFilter::with_precision(filter_config).unwrap_or_default(),
                drift: DriftCompensator::new(drift_config),
            }),
            store: Mutex::new(store),
        }
    }

    pub fn process(&self, raw: f32, timestamp: u32) -> f32 {
        self.state.lock().process(raw, timestamp)
    }

    pub fn poll<Src: SampleSource + ?Sized>(&self, source: &mut Src) -> Result<f32, PipelineError> {
        let reading = source.next_reading().ok_or(PipelineError::NoData)?;
        Ok(self.process(reading.value, reading.timestamp))
    }

    pub fn set_filter_parameter(&self, config: FilterConfig) -> Result<(), PipelineError> {
        let mut store = self.store.lock();
        self.state.lock().filter.configure(config)?;
        persist_filter_config(&mut *store, &config)?;
        Ok(())
    }

    pub fn filter_config(&self) -> FilterConfig {
        self.state.lock().filter.config()
    }

    pub fn drift_config(&self) -> DriftConfig {
        self.state.lock().drift.config()
    }

    pub fn drift_offset(&self) -> f32 {
        self.state.lock().drift.current_offset()
    }

    pub fn set_stable_reference(&self, value: f32, timestamp: u32) -> bool {
        self.state.lock().drift.set_stable_reference(value, timestamp)
    }

    pub fn reset(&self) {
        self.state.lock().reset();
    }

    /// Runs `f` with exclusive access to the store.
    pub fn with_store<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        f(&mut self.store.lock())
    }

    pub fn into_store(self) -> P {
        self.store.into_inner()
    }
}
