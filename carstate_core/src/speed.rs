//! Default joint speed/acceleration estimator.

use carstate_traits::SpeedEstimator;

/// Steady-state Kalman gains for a 100 Hz tick.
const KF_GAIN: [f64; 2] = [0.122_876_73, 0.296_663_09];
/// Jump in raw speed (m/s) that re-seeds the filter instead of integrating.
const RESET_THRESHOLD_MPS: f64 = 2.0;

/// Two-state constant-gain Kalman filter over `[v, a]` with a constant
/// acceleration model.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedKf {
    dt_s: f64,
    v: f64,
    a: f64,
}

impl SpeedKf {
    pub fn new(dt_s: f64) -> Self {
        Self {
            dt_s,
            v: 0.0,
            a: 0.0,
        }
    }

    pub fn state(&self) -> (f64, f64) {
        (self.v, self.a)
    }
}

impl SpeedEstimator for SpeedKf {
    fn update(&mut self, v_ego_raw: f64) -> (f64, f64) {
        // Avoid a huge acceleration spike when the session starts while moving.
        if (v_ego_raw - self.v).abs() > RESET_THRESHOLD_MPS {
            self.v = v_ego_raw;
            self.a = 0.0;
        }
        let v_pred = self.v + self.dt_s * self.a;
        let a_pred = self.a;
        let innovation = v_ego_raw - v_pred;
        self.v = v_pred + KF_GAIN[0] * innovation;
        self.a = a_pred + KF_GAIN[1] * innovation;
        (self.v, self.a)
    }

    fn reset(&mut self) {
        self.v = 0.0;
        self.a = 0.0;
    }
}
