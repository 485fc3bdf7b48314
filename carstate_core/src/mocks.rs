//! Test and helper doubles for the external collaborators.

use carstate_traits::SpeedEstimator;

/// Estimator that reports the raw speed unchanged and zero acceleration.
/// Useful when a test wants `v_ego == v_ego_raw`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughEstimator;

impl SpeedEstimator for PassthroughEstimator {
    fn update(&mut self, v_ego_raw: f64) -> (f64, f64) {
        (v_ego_raw, 0.0)
    }
}
