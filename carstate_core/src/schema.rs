//! Bus subscription schema derived once per session from the variant profile.
//!
//! The external bus stack decodes exactly the signals listed here and checks
//! each message's freshness against the expected rate.

use serde::Serialize;

use crate::error::Bus;
use crate::variant::{CruiseSource, VariantProfile};

/// One signal the bus stack must decode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRequest {
    pub signal: &'static str,
    pub message: &'static str,
    /// Multiplexer value, when the signal lives in a multiplexed message.
    pub mux: Option<i64>,
}

/// Expected receive rate of a message, used by the bus stack's validity flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreshnessCheck {
    pub message: &'static str,
    pub rate_hz: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BusSchema {
    pub signals: Vec<SignalRequest>,
    pub checks: Vec<FreshnessCheck>,
}

impl BusSchema {
    fn sig(&mut self, signal: &'static str, message: &'static str, mux: i64) {
        self.signals.push(SignalRequest {
            signal,
            message,
            mux: Some(mux),
        });
    }

    fn check(&mut self, message: &'static str, rate_hz: f64) {
        self.checks.push(FreshnessCheck { message, rate_hz });
    }

    /// Whether `message.signal` is subscribed, regardless of multiplexer value.
    pub fn subscribes(&self, message: &str, signal: &str) -> bool {
        self.signals
            .iter()
            .any(|r| r.message == message && r.signal == signal)
    }
}

/// Schemas for both buses of one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSchema {
    pub pt: BusSchema,
    pub cam: BusSchema,
}

impl SessionSchema {
    pub fn bus(&self, bus: Bus) -> &BusSchema {
        match bus {
            Bus::Pt => &self.pt,
            Bus::Cam => &self.cam,
        }
    }
}

/// Build both bus schemas for `profile`. Deterministic and side-effect free.
pub fn build_schema(profile: &VariantProfile) -> SessionSchema {
    SessionSchema {
        pt: pt_schema(profile),
        cam: cam_schema(profile),
    }
}

fn pt_schema(profile: &VariantProfile) -> BusSchema {
    let d = profile.descriptor();
    let mut s = BusSchema::default();

    s.sig("STEER_ANGLE", "STEER_ANGLE_SENSOR", 0);
    s.sig("GEAR", "GEAR_PACKET", 0);
    s.sig("BRAKE_PRESSED", "BRAKE_MODULE", 0);
    s.sig("DOOR_OPEN_FL", "BODY_CONTROL_STATE", 1);
    s.sig("DOOR_OPEN_FR", "BODY_CONTROL_STATE", 1);
    s.sig("DOOR_OPEN_RL", "BODY_CONTROL_STATE", 1);
    s.sig("DOOR_OPEN_RR", "BODY_CONTROL_STATE", 1);
    s.sig("SEATBELT_DRIVER_UNLATCHED", "BODY_CONTROL_STATE", 1);
    s.sig("PARKING_BRAKE", "BODY_CONTROL_STATE", 0);
    s.sig("TC_DISABLED", "ESP_CONTROL", 1);
    s.sig("BRAKE_HOLD_ACTIVE", "ESP_CONTROL", 0);
    s.sig("STEER_TORQUE_DRIVER", "STEER_TORQUE_SENSOR", 0);
    s.sig("STEER_TORQUE_EPS", "STEER_TORQUE_SENSOR", 0);
    s.sig("STEER_ANGLE", "STEER_TORQUE_SENSOR", 0);
    s.sig("STEER_ANGLE_INITIALIZING", "STEER_TORQUE_SENSOR", 0);
    s.sig("TURN_SIGNALS", "BLINKERS_STATE", 3);
    s.sig("LKA_STATE", "EPS_STATUS", 0);
    s.sig("AUTO_HIGH_BEAM", "LIGHT_STALK", 0);

    s.check("GEAR_PACKET", 1.0);
    s.check("LIGHT_STALK", 1.0);
    s.check("BLINKERS_STATE", 0.15);
    s.check("BODY_CONTROL_STATE", 3.0);
    s.check("ESP_CONTROL", 3.0);
    s.check("EPS_STATUS", 25.0);
    s.check("BRAKE_MODULE", 40.0);
    s.check("STEER_ANGLE_SENSOR", 80.0);
    s.check("STEER_TORQUE_SENSOR", 50.0);

    s.sig("GAS_PEDAL", "GAS_PEDAL", 0);
    s.check("GAS_PEDAL", 33.0);

    match d.cruise {
        CruiseSource::Dsu => {
            s.sig("MAIN_ON", "DSU_CRUISE", 0);
            s.sig("SET_SPEED", "DSU_CRUISE", 0);
            s.check("DSU_CRUISE", 5.0);
        }
        CruiseSource::Pcm => {
            s.sig("MAIN_ON", "PCM_CRUISE_2", 0);
            s.sig("SET_SPEED", "PCM_CRUISE_2", 0);
            s.sig("LOW_SPEED_LOCKOUT", "PCM_CRUISE_2", 0);
            s.check("PCM_CRUISE_2", 33.0);
        }
        CruiseSource::SingleState => {}
    }

    if profile.gas_interceptor() {
        s.sig("INTERCEPTOR_GAS", "GAS_SENSOR", 0);
        s.sig("INTERCEPTOR_GAS2", "GAS_SENSOR", 0);
        s.check("GAS_SENSOR", 50.0);
    }

    if profile.blind_spot_monitor() {
        s.sig("L_ADJACENT", "BSM", 0);
        s.sig("L_APPROACHING", "BSM", 0);
        s.sig("R_ADJACENT", "BSM", 0);
        s.sig("R_APPROACHING", "BSM", 0);
        s.check("BSM", 1.0);
    }

    if d.legacy {
        s.sig("ZORRO_STEER", "SECONDARY_STEER_ANGLE", 0);
        s.sig("CRUISE_CONTROL_STATE", "PCM_CRUISE_SM", 0);
        s.check("PCM_CRUISE_SM", 1.0);
        s.check("SECONDARY_STEER_ANGLE", 1.0);
    } else {
        s.sig("CRUISE_ACTIVE", "PCM_CRUISE", 0);
        s.sig("CRUISE_STATE", "PCM_CRUISE", 0);
        s.sig("GAS_RELEASED", "PCM_CRUISE", 1);
        s.sig("STEER_FRACTION", "STEER_ANGLE_SENSOR", 0);
        s.sig("STEER_RATE", "STEER_ANGLE_SENSOR", 0);
        s.check("PCM_CRUISE", 33.0);
    }

    let (front, rear) = d.wheels.messages();
    s.sig("WHEEL_SPEED_FL", front, 0);
    s.sig("WHEEL_SPEED_FR", front, 0);
    s.sig("WHEEL_SPEED_RL", rear, 0);
    s.sig("WHEEL_SPEED_RR", rear, 0);
    if front == rear {
        s.check(front, 80.0);
    } else {
        s.check(front, 1.0);
        s.check(rear, 1.0);
    }

    s
}

fn cam_schema(profile: &VariantProfile) -> BusSchema {
    let d = profile.descriptor();
    let mut s = BusSchema::default();
    // The legacy model has no camera / assist bus at all.
    if !d.assist_passthrough {
        return s;
    }

    s.sig("FORCE", "PRE_COLLISION", 0);
    s.sig("PRECOLLISION_ACTIVE", "PRE_COLLISION", 0);

    // Steering message doubles as a check that the camera bus is connected.
    s.check("STEERING_LKA", 42.0);
    // Observed rate is irregular; presence only.
    s.check("PRE_COLLISION", 0.0);

    if d.second_gen_assist {
        s.signals.push(SignalRequest {
            signal: "ACC_TYPE",
            message: "ACC_CONTROL",
            mux: None,
        });
        s.check("ACC_CONTROL", 33.0);
    }
    s
}
