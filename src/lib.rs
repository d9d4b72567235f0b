#![cfg_attr(not(feature = "std"), no_std)]

mod config;
mod pipeline;
mod source;
mod state;
pub mod drift;
pub mod filters;
pub mod sample;
pub mod store;

#[cfg(feature = "std")]
mod shared;

pub use config::{
    ConfigError, DriftConfig, FilterConfig, FilterKind, ReferenceMode, DEFAULT_ALPHA,
    DEFAULT_CUTOFF, DEFAULT_WINDOW, MAX_ALPHA, MAX_WINDOW, MIN_ALPHA, MIN_WINDOW, NYQUIST,
};
pub use drift::{DriftCompensator, HISTORY_SIZE};
pub use filters::SmoothingFilter;
pub use pipeline::{ConditioningPipeline, FixedPointPipeline, PipelineError};
pub use sample::{Q15, Sample};
pub use source::{Reading, SampleSource};
pub use store::{InMemoryStore, ParamKey, ParameterStore, StoreError};

#[cfg(feature = "std")]
pub use shared::SharedPipeline;
