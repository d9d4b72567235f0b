//! Tunable parameters for the smoothing filter and the drift compensator.
//!
//! Both configs are plain `Copy` structs validated with `validate()`, and both
//! have a fixed little-endian record layout used by the [`ParameterStore`].
//!
//! [`ParameterStore`]: crate::store::ParameterStore

pub const MIN_WINDOW: u8 = 2;
pub const MAX_WINDOW: u8 = 10;
pub const DEFAULT_WINDOW: u8 = 4;

pub const MIN_ALPHA: f32 = 0.01;
pub const MAX_ALPHA: f32 = 0.99;
pub const DEFAULT_ALPHA: f32 = 0.2;

/// Normalized cutoff, as a fraction of the sample rate. Valid range is the
/// open interval (0.0, 0.5).
pub const DEFAULT_CUTOFF: f32 = 0.1;
pub const NYQUIST: f32 = 0.5;

/// Capacity of the moving-average and median ring buffer.
pub(crate) const WINDOW_CAPACITY: usize = MAX_WINDOW as usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    WindowSizeOutOfRange,
    AlphaOutOfRange,
    CutoffOutOfRange,
    InvalidDriftParameter(&'static str),
    /// Stored record is truncated or carries an unknown tag
    Malformed,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::WindowSizeOutOfRange => write!(
                f,
                "window_size must be in range [{}, {}]",
                MIN_WINDOW, MAX_WINDOW
            ),
            ConfigError::AlphaOutOfRange => write!(
                f,
                "alpha must be in range [{}, {}]",
                MIN_ALPHA, MAX_ALPHA
            ),
            ConfigError::CutoffOutOfRange => {
                write!(f, "cutoff_freq must be in range (0.0, {})", NYQUIST)
            }
            ConfigError::InvalidDriftParameter(what) => {
                write!(f, "invalid drift parameter: {}", what)
            }
            ConfigError::Malformed => write!(f, "malformed parameter record"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Smoothing algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterKind {
    /// Arithmetic mean over the last `window_size` samples
    MovingAverage,

    /// Exponential moving average: output = alpha * input + (1 - alpha) * previous
    /// Lower alpha = more smoothing, higher = more responsive
    Ema,

    /// Second-order Butterworth low-pass at `cutoff_freq`
    LowPass2,

    /// Median over the last `window_size` samples, robust to single spikes
    Median,

    /// No filtering applied
    None,
}

impl FilterKind {
    const fn tag(self) -> u8 {
        match self {
            FilterKind::MovingAverage => 0,
            FilterKind::Ema => 1,
            FilterKind::LowPass2 => 2,
            FilterKind::Median => 3,
            FilterKind::None => 4,
        }
    }

    const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(FilterKind::MovingAverage),
            1 => Some(FilterKind::Ema),
            2 => Some(FilterKind::LowPass2),
            3 => Some(FilterKind::Median),
            4 => Some(FilterKind::None),
            _ => None,
        }
    }
}

/// Smoothing filter configuration.
///
/// Only the fields used by `kind` are validated; the others are carried along
/// untouched so that switching kinds keeps the previously tuned values.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterConfig {
    pub kind: FilterKind,
    pub window_size: u8,
    pub alpha: f32,
    pub cutoff_freq: f32,
}

impl FilterConfig {
    pub const RECORD_LEN: usize = 12;

    pub const fn moving_average(window_size: u8) -> Self {
        Self {
            kind: FilterKind::MovingAverage,
            window_size,
            ..Self::DEFAULT
        }
    }

    pub const fn ema(alpha: f32) -> Self {
        Self {
            kind: FilterKind::Ema,
            alpha,
            ..Self::DEFAULT
        }
    }

    pub const fn low_pass(cutoff_freq: f32) -> Self {
        Self {
            kind: FilterKind::LowPass2,
            cutoff_freq,
            ..Self::DEFAULT
        }
    }

    pub const fn median(window_size: u8) -> Self {
        Self {
            kind: FilterKind::Median,
            window_size,
            ..Self::DEFAULT
        }
    }

    pub const fn passthrough() -> Self {
        Self {
            kind: FilterKind::None,
            ..Self::DEFAULT
        }
    }

    const DEFAULT: Self = Self {
        kind: FilterKind::MovingAverage,
        window_size: DEFAULT_WINDOW,
        alpha: DEFAULT_ALPHA,
        cutoff_freq: DEFAULT_CUTOFF,
    };

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.kind {
            FilterKind::MovingAverage | FilterKind::Median => {
                if self.window_size < MIN_WINDOW || self.window_size > MAX_WINDOW {
                    return Err(ConfigError::WindowSizeOutOfRange);
                }
            }
            FilterKind::Ema => {
                // Negated form also rejects NaN
                if !(self.alpha >= MIN_ALPHA && self.alpha <= MAX_ALPHA) {
                    return Err(ConfigError::AlphaOutOfRange);
                }
            }
            FilterKind::LowPass2 => {
                if !(self.cutoff_freq > 0.0 && self.cutoff_freq < NYQUIST) {
                    return Err(ConfigError::CutoffOutOfRange);
                }
            }
            FilterKind::None => {}
        }
        Ok(())
    }

    /// Layout: `[kind, window_size, 0, 0, alpha (f32 LE), cutoff_freq (f32 LE)]`
    pub fn to_bytes(&self) -> [u8; Self::RECORD_LEN] {
        let mut out = [0u8; Self::RECORD_LEN];
        out[0] = self.kind.tag();
        out[1] = self.window_size;
        out[4..8].copy_from_slice(&self.alpha.to_le_bytes());
        out[8..12].copy_from_slice(&self.cutoff_freq.to_le_bytes());
        out
    }

    /// Decodes a record written by [`FilterConfig::to_bytes`]. The result is
    /// not validated.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() < Self::RECORD_LEN {
            return Err(ConfigError::Malformed);
        }
        let kind = FilterKind::from_tag(bytes[0]).ok_or(ConfigError::Malformed)?;
        Ok(Self {
            kind,
            window_size: bytes[1],
            alpha: read_f32(bytes, 4),
            cutoff_freq: read_f32(bytes, 8),
        })
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Where the drift compensator takes its "true value" reference from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReferenceMode {
    /// Every stable history window replaces the reference with its mean.
    Tracking,

    /// The first stable window, or an external calibration, sets the
    /// reference. Later stable windows only open the update gate.
    Latched,
}

/// Drift compensator tunables: Kalman noise constants and stability gating.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriftConfig {
    /// Process noise covariance
    pub q: f32,
    /// Measurement noise covariance
    pub r: f32,
    /// Initial estimate error covariance
    pub p0: f32,
    /// Population std-dev below which the history counts as stable (mg/dL)
    pub stability_threshold: f32,
    /// History mean must exceed this to count as stable (mg/dL)
    pub min_value_for_stability: f32,
    /// Minimum spacing between two estimator updates
    pub adaptive_interval_secs: u32,
    /// Offset is clamped to +/- this value (mg/dL)
    pub max_offset: f32,
    pub reference_mode: ReferenceMode,
}

impl DriftConfig {
    pub const RECORD_LEN: usize = 32;

    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            self.q,
            self.r,
            self.p0,
            self.stability_threshold,
            self.min_value_for_stability,
            self.max_offset,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::InvalidDriftParameter("values must be finite"));
        }
        if self.q < 0.0 {
            return Err(ConfigError::InvalidDriftParameter("q must be >= 0"));
        }
        if self.r <= 0.0 {
            return Err(ConfigError::InvalidDriftParameter("r must be > 0"));
        }
        if self.p0 < 0.0 {
            return Err(ConfigError::InvalidDriftParameter("p0 must be >= 0"));
        }
        if self.stability_threshold <= 0.0 {
            return Err(ConfigError::InvalidDriftParameter(
                "stability_threshold must be > 0",
            ));
        }
        if self.min_value_for_stability < 0.0 {
            return Err(ConfigError::InvalidDriftParameter(
                "min_value_for_stability must be >= 0",
            ));
        }
        if self.max_offset <= 0.0 {
            return Err(ConfigError::InvalidDriftParameter("max_offset must be > 0"));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; Self::RECORD_LEN] {
        let mut out = [0u8; Self::RECORD_LEN];
        out[0..4].copy_from_slice(&self.q.to_le_bytes());
        out[4..8].copy_from_slice(&self.r.to_le_bytes());
        out[8..12].copy_from_slice(&self.p0.to_le_bytes());
        out[12..16].copy_from_slice(&self.stability_threshold.to_le_bytes());
        out[16..20].copy_from_slice(&self.min_value_for_stability.to_le_bytes());
        out[20..24].copy_from_slice(&self.adaptive_interval_secs.to_le_bytes());
        out[24..28].copy_from_slice(&self.max_offset.to_le_bytes());
        out[28] = match self.reference_mode {
            ReferenceMode::Tracking => 0,
            ReferenceMode::Latched => 1,
        };
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() < Self::RECORD_LEN {
            return Err(ConfigError::Malformed);
        }
        let reference_mode = match bytes[28] {
            0 => ReferenceMode::Tracking,
            1 => ReferenceMode::Latched,
            _ => return Err(ConfigError::Malformed),
        };
        Ok(Self {
            q: read_f32(bytes, 0),
            r: read_f32(bytes, 4),
            p0: read_f32(bytes, 8),
            stability_threshold: read_f32(bytes, 12),
            min_value_for_stability: read_f32(bytes, 16),
            adaptive_interval_secs: u32::from_le_bytes([
                bytes[20], bytes[21], bytes[22], bytes[23],
            ]),
            max_offset: read_f32(bytes, 24),
            reference_mode,
        })
    }
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            q: 0.01,
            r: 1.0,
            p0: 1.0,
            stability_threshold: 2.0,
            min_value_for_stability: 40.0,
            adaptive_interval_secs: 300,
            max_offset: 50.0,
            reference_mode: ReferenceMode::Tracking,
        }
    }
}

fn read_f32(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
