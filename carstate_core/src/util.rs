//! Unit conversions and tick-period helpers.

/// km/h to m/s.
pub const KPH_TO_MS: f64 = 1.0 / 3.6;

/// Default control loop rate.
pub const DEFAULT_RATE_HZ: u32 = 100;

/// Tick period in seconds for a control rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
#[inline]
pub fn period_s(hz: u32) -> f64 {
    1.0 / f64::from(hz.max(1))
}
