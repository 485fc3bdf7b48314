#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas for a vehicle state normalizer session.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The variant is kept as its config-file name here; `carstate_core`
//!   resolves it to a `VehicleVariant` when building a session.
use serde::Deserialize;

/// Vehicle identity and externally detected hardware.
#[derive(Debug, Deserialize, Clone)]
pub struct VehicleCfg {
    /// Variant name, e.g. "rav4_tss2" or "corolla_2010".
    pub variant: String,
    /// Pedal interceptor board is fitted.
    #[serde(default)]
    pub gas_interceptor: bool,
    /// Blind-spot monitor messages are present on the powertrain bus.
    #[serde(default)]
    pub blind_spot_monitor: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControlCfg {
    /// Control loop rate in Hz; one normalizer update per tick.
    pub rate_hz: u32,
    /// Time constant of the steering angle offset low-pass filter (seconds).
    pub offset_time_constant_s: f64,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            rate_hz: 100,
            offset_time_constant_s: 60.0,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub vehicle: VehicleCfg,
    #[serde(default)]
    pub control: ControlCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Vehicle
        if self.vehicle.variant.trim().is_empty() {
            eyre::bail!("vehicle.variant must not be empty");
        }

        // Control
        if self.control.rate_hz == 0 {
            eyre::bail!("control.rate_hz must be > 0");
        }
        if self.control.rate_hz > 10_000 {
            eyre::bail!("control.rate_hz is unreasonably large (>10kHz)");
        }
        let tau = self.control.offset_time_constant_s;
        if !(tau.is_finite() && tau > 0.0) {
            eyre::bail!("control.offset_time_constant_s must be finite and > 0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot}");
        }

        Ok(())
    }

    /// Control tick period in seconds.
    pub fn dt_s(&self) -> f64 {
        1.0 / f64::from(self.control.rate_hz.max(1))
    }
}
