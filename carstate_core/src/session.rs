//! Explicit session-lifetime state threaded through every normalizer update.

use crate::rate_ring::RateRingSmoother;
use crate::steering::SteeringCalibrationState;

/// Hardware reports genuine low-speed lockout state.
pub const ACC_TYPE_STANDARD: i64 = 1;
/// Hardware reports lockout permanently regardless of capability.
pub const ACC_TYPE_PERMANENT_LOCKOUT: i64 = 2;

/// Everything the normalizer remembers between ticks.
///
/// Owned exclusively by the control loop; construct a fresh one per vehicle
/// session. Two sessions fed identical frames produce identical snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub(crate) steering: SteeringCalibrationState,
    pub(crate) rate: RateRingSmoother,
    pub(crate) low_speed_lockout: bool,
    pub(crate) acc_type: i64,
    pub(crate) pcm_acc_status: Option<i64>,
    pub(crate) steer_state: Option<i64>,
    pub(crate) lockout_quirk_reported: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            steering: SteeringCalibrationState::default(),
            rate: RateRingSmoother::new(),
            low_speed_lockout: false,
            acc_type: ACC_TYPE_STANDARD,
            pcm_acc_status: None,
            steer_state: None,
            lockout_quirk_reported: false,
        }
    }

    pub fn steering(&self) -> &SteeringCalibrationState {
        &self.steering
    }

    /// Rate smoother of the secondary-sensor path (idle on other variants).
    pub fn rate(&self) -> &RateRingSmoother {
        &self.rate
    }

    /// Adaptive cruise is locked out below its minimum speed.
    pub fn low_speed_lockout(&self) -> bool {
        self.low_speed_lockout
    }

    /// Last ACC type discriminator seen on the assist bus (1 until read).
    pub fn acc_type(&self) -> i64 {
        self.acc_type
    }

    /// Last `PCM_CRUISE.CRUISE_STATE` code; `None` on variants without it.
    pub fn pcm_acc_status(&self) -> Option<i64> {
        self.pcm_acc_status
    }

    /// Last `EPS_STATUS.LKA_STATE` code.
    pub fn steer_state(&self) -> Option<i64> {
        self.steer_state
    }
}
