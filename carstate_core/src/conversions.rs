//! Conversions from `carstate_config` TOML types to core runtime types.

use crate::config::NormalizerCfg;
use crate::error::CarStateError;
use crate::util::period_s;
use crate::variant::{SessionConfig, VehicleVariant};

impl From<&carstate_config::ControlCfg> for NormalizerCfg {
    fn from(c: &carstate_config::ControlCfg) -> Self {
        Self {
            dt_s: period_s(c.rate_hz),
            offset_time_constant_s: c.offset_time_constant_s,
        }
    }
}

impl TryFrom<&carstate_config::VehicleCfg> for SessionConfig {
    type Error = CarStateError;

    fn try_from(v: &carstate_config::VehicleCfg) -> Result<Self, Self::Error> {
        let variant: VehicleVariant = v.variant.parse()?;
        Ok(SessionConfig::new(variant)
            .with_gas_interceptor(v.gas_interceptor)
            .with_blind_spot_monitor(v.blind_spot_monitor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_maps_rate_to_period() {
        let c = carstate_config::ControlCfg {
            rate_hz: 50,
            offset_time_constant_s: 30.0,
        };
        let n = NormalizerCfg::from(&c);
        assert!((n.dt_s - 0.02).abs() < 1e-15);
        assert_eq!(n.offset_time_constant_s, 30.0);
    }

    #[test]
    fn vehicle_maps_name_and_flags() {
        let v = carstate_config::VehicleCfg {
            variant: "lexus_is".into(),
            gas_interceptor: true,
            blind_spot_monitor: false,
        };
        let s = SessionConfig::try_from(&v).unwrap();
        assert_eq!(s.variant, VehicleVariant::LexusIs);
        assert!(s.gas_interceptor_enabled);
        assert!(!s.blind_spot_monitor_enabled);

        let bad = carstate_config::VehicleCfg {
            variant: "model_t".into(),
            gas_interceptor: false,
            blind_spot_monitor: false,
        };
        assert_eq!(
            SessionConfig::try_from(&bad),
            Err(CarStateError::UnknownVariant("model_t".into()))
        );
    }
}
