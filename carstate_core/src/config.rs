//! Runtime configuration for the normalizer.
//!
//! Separate from the TOML-deserialized config in `carstate_config`; see
//! `conversions` for the mapping.

use crate::util::{DEFAULT_RATE_HZ, period_s};

/// Timing knobs of the steering offset calibration and speed filter.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizerCfg {
    /// Control tick period in seconds.
    pub dt_s: f64,
    /// Steering offset low-pass time constant in seconds. Default: 60 s.
    pub offset_time_constant_s: f64,
}

impl Default for NormalizerCfg {
    fn default() -> Self {
        Self {
            dt_s: period_s(DEFAULT_RATE_HZ),
            offset_time_constant_s: 60.0,
        }
    }
}
