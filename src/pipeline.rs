use crate::config::{ConfigError, DriftConfig, FilterConfig};
use crate::drift::DriftCompensator;
use crate::filters::SmoothingFilter;
use crate::sample::{Q15, Sample};
use crate::source::SampleSource;
use crate::state::State;
use crate::store::{MAX_RECORD_LEN, ParamKey, ParameterStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PipelineError {
    /// Configuration rejected; nothing was changed
    InvalidParameter(ConfigError),
    /// Applied in memory but not guaranteed durable
    PersistenceFailure(StoreError),
    /// The sample source had no reading this cycle
    NoData,
}

impl core::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PipelineError::InvalidParameter(e) => write!(f, "invalid parameter: {}", e),
            PipelineError::PersistenceFailure(e) => {
                write!(f, "applied but not persisted: {}", e)
            }
            PipelineError::NoData => write!(f, "no reading available"),
        }
    }
}

impl core::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            PipelineError::InvalidParameter(e) => Some(e),
            PipelineError::PersistenceFailure(e) => Some(e),
            PipelineError::NoData => None,
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        PipelineError::InvalidParameter(e)
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        PipelineError::PersistenceFailure(e)
    }
}

/// Smoothing followed by drift compensation, with persisted configuration.
///
/// `output = drift.apply_compensation(filter.process(raw), t)`
pub struct ConditioningPipeline<P, S: Sample = f32> {
    state: State<S>,
    store: P,
}

/// Pipeline whose smoothing stage runs in Q15 fixed point.
pub type FixedPointPipeline<P> = ConditioningPipeline<P, Q15>;

impl<P: ParameterStore> ConditioningPipeline<P, f32> {
    /// Loads the parameters from `store` and builds a floating-point pipeline.
    pub fn init(store: P) -> Self {
        Self::init_with_precision(store)
    }
}

impl<P, S> ConditioningPipeline<P, S>
where
    P: ParameterStore,
    S: Sample,
{
    /// Loads both parameter records from `store`. Missing, corrupt or
    /// out-of-range records are replaced by defaults, which are written back.
    pub fn init_with_precision(mut store: P) -> Self {
        let filter_config = load_filter_config(&mut store);
        let drift_config = load_drift_config(&mut store);
        log::info!(
            "pipeline initialized: {:?}, {:?}",
            filter_config.kind,
            drift_config.reference_mode
        );

        Self {
            state: State {
                filter: SmoothingFilter::with_precision(filter_config).unwrap_or_default(),
                drift: DriftCompensator::new(drift_config),
            },
            store,
        }
    }

    pub fn process(&mut self, raw: f32, timestamp: u32) -> f32 {
        self.state.process(raw, timestamp)
    }

    /// Pulls one reading from `source` and processes it.
    pub fn poll<Src: SampleSource + ?Sized>(
        &mut self,
        source: &mut Src,
    ) -> Result<f32, PipelineError> {
        let reading = source.next_reading().ok_or(PipelineError::NoData)?;
        Ok(self.process(reading.value, reading.timestamp))
    }

    /// Validates and applies `config`, then persists it.
    ///
    /// A [`PipelineError::PersistenceFailure`] means the new configuration
    /// is already active but may not survive a restart.
    pub fn set_filter_parameter(&mut self, config: FilterConfig) -> Result<(), PipelineError> {
        self.state.filter.configure(config)?;
        persist_filter_config(&mut self.store, &config)?;
        Ok(())
    }

    pub fn filter_config(&self) -> FilterConfig {
        self.state.filter.config()
    }

    pub fn drift_config(&self) -> DriftConfig {
        self.state.drift.config()
    }

    pub fn drift_offset(&self) -> f32 {
        self.state.drift.current_offset()
    }

    pub fn set_stable_reference(&mut self, value: f32, timestamp: u32) -> bool {
        self.state.drift.set_stable_reference(value, timestamp)
    }

    pub fn filter(&self) -> &SmoothingFilter<S> {
        &self.state.filter
    }

    pub fn drift(&self) -> &DriftCompensator {
        &self.state.drift
    }

    /// Clears filter and drift state. Configuration is kept.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut P {
        &mut self.store
    }

    pub fn into_store(self) -> P {
        self.store
    }
}

pub(crate) fn load_filter_config<P: ParameterStore + ?Sized>(store: &mut P) -> FilterConfig {
    read_record(
        store,
        ParamKey::FilterConfig,
        FilterConfig::from_bytes,
        FilterConfig::validate,
    )
    .unwrap_or_else(|| {
        let config = FilterConfig::default();
        let _ = persist(store, ParamKey::FilterConfig, &config.to_bytes());
        config
    })
}

pub(crate) fn load_drift_config<P: ParameterStore + ?Sized>(store: &mut P) -> DriftConfig {
    read_record(
        store,
        ParamKey::DriftConfig,
        DriftConfig::from_bytes,
        DriftConfig::validate,
    )
    .unwrap_or_else(|| {
        let config = DriftConfig::default();
        let _ = persist(store, ParamKey::DriftConfig, &config.to_bytes());
        config
    })
}

pub(crate) fn persist_filter_config<P: ParameterStore + ?Sized>(
    store: &mut P,
    config: &FilterConfig,
) -> Result<(), StoreError> {
    persist(store, ParamKey::FilterConfig, &config.to_bytes())
}

/// Reads, decodes and validates one record. `None` means "use the default".
fn read_record<P, T>(
    store: &mut P,
    key: ParamKey,
    decode: fn(&[u8]) -> Result<T, ConfigError>,
    validate: fn(&T) -> Result<(), ConfigError>,
) -> Option<T>
where
    P: ParameterStore + ?Sized,
    T: core::fmt::Debug,
{
    let mut buf = [0u8; MAX_RECORD_LEN];
    let len = match store.read(key, &mut buf) {
        Ok(len) => len,
        Err(e) => {
            log::info!("{:?} not loaded ({}), using default", key, e);
            return None;
        }
    };

    match decode(&buf[..len]).and_then(|value| validate(&value).map(|()| value)) {
        Ok(value) => {
            log::info!("loaded {:?}: {:?}", key, value);
            Some(value)
        }
        Err(e) => {
            log::warn!("stored {:?} rejected ({}), using default", key, e);
            None
        }
    }
}

fn persist<P: ParameterStore + ?Sized>(
    store: &mut P,
    key: ParamKey,
    bytes: &[u8],
) -> Result<(), StoreError> {
    store.write(key, bytes).inspect_err(|e| {
        log::warn!("failed to persist {:?}: {}", key, e);
    })
}
