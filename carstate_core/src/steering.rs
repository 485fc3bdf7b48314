//! Online calibration of the steering angle zero offset.
//!
//! The torque sensor's angle reading is zeroed wherever the wheel happened to
//! be at power-on, while the angle sensor is absolute but coarse. Once the
//! torque sensor produces a trustworthy reading, the difference between the
//! two is low-pass filtered into an offset and the published angle becomes
//! `torque_sensor_angle - offset`.

use crate::filter::FirstOrderFilter;

/// Torque-sensor angle magnitude above which the reading is considered real.
pub const ACCURATE_ANGLE_EPS_DEG: f64 = 1e-3;
/// Offset estimates are not trusted at or beyond this absolute angle.
pub const MAX_CALIBRATION_ANGLE_DEG: f64 = 90.0;

/// Session-lifetime calibration state; mutated only by [`SteeringCalibrator`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SteeringCalibrationState {
    offset: f64,
    initialized: bool,
    accurate_angle_seen: bool,
}

impl SteeringCalibrationState {
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    /// Sticky: once true, stays true for the session.
    pub fn accurate_angle_seen(&self) -> bool {
        self.accurate_angle_seen
    }
}

/// Result of one calibration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringAngle {
    pub angle_deg: f64,
    /// `None` until the offset filter has been seeded.
    pub offset_deg: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringCalibrator {
    filter: FirstOrderFilter,
}

impl SteeringCalibrator {
    pub fn new(time_constant_s: f64, dt_s: f64) -> Self {
        Self {
            filter: FirstOrderFilter::new(time_constant_s, dt_s),
        }
    }

    /// Fuse one cycle of angle readings.
    ///
    /// `fused_candidate` is the angle sensor reading (coarse + fraction),
    /// `torque_angle` the torque sensor's relative angle.
    pub fn update(
        &self,
        state: &mut SteeringCalibrationState,
        fused_candidate: f64,
        torque_angle: f64,
        torque_initializing: bool,
        bus_valid: bool,
    ) -> SteeringAngle {
        // Some racks report a non-zero angle while still initializing.
        if !state.accurate_angle_seen
            && torque_angle.abs() > ACCURATE_ANGLE_EPS_DEG
            && !torque_initializing
        {
            state.accurate_angle_seen = true;
            tracing::debug!(torque_angle, "accurate steering angle seen");
        }

        let mut out = SteeringAngle {
            angle_deg: fused_candidate,
            offset_deg: None,
        };
        if !state.accurate_angle_seen {
            return out;
        }

        if fused_candidate.abs() < MAX_CALIBRATION_ANGLE_DEG && bus_valid {
            let prev = state.initialized.then_some(state.offset);
            state.offset = self.filter.step(prev, torque_angle - fused_candidate);
            if !state.initialized {
                state.initialized = true;
                tracing::debug!(offset = state.offset, "steering offset filter seeded");
            } else {
                tracing::trace!(offset = state.offset, "steering offset update");
            }
        }

        if state.initialized {
            out.offset_deg = Some(state.offset);
            out.angle_deg = torque_angle - state.offset;
        }
        out
    }
}
