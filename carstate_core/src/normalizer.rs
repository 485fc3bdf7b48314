//! The per-tick normalizer (`StateNormalizer`).
//!
//! Consumes one decoded frame per bus, dispatches to the variant's extraction
//! paths through its descriptor, runs the steering calibration and cruise
//! classification against the explicit `SessionState`, and assembles a fresh
//! `CarStateSnapshot`.

use std::time::Duration;

use carstate_traits::{SignalFrame, SpeedEstimator, ValueTable};

use crate::config::NormalizerCfg;
use crate::cruise::CruiseStateClassifier;
use crate::error::{Bus, CarStateError, Result};
use crate::gear::{GEAR_MESSAGE, GEAR_SIGNAL, resolve_gear};
use crate::schema::{SessionSchema, build_schema};
use crate::session::SessionState;
use crate::signals::{code, flag, read};
use crate::snapshot::{CarStateSnapshot, WheelSpeeds};
use crate::steering::SteeringCalibrator;
use crate::variant::{CruiseSource, GasPressedRule, LockoutRule, VariantProfile};

/// Interceptor gas reading above which the pedal counts as pressed (exclusive).
pub const GAS_INTERCEPTOR_THRESHOLD: f64 = 15.0;
/// Raw wheel-speed mean (m/s) below which the vehicle is at a standstill.
pub const STANDSTILL_SPEED_MPS: f64 = 0.001;
/// Pre-collision brake force below which stock AEB is considered braking.
pub const STOCK_AEB_FORCE: f64 = -1e-5;
/// `EPS_STATUS.LKA_STATE` codes of a healthy steering rack.
pub const LKA_STATE_OK: [i64; 3] = [1, 3, 5];

const DOORS: [&str; 4] = ["DOOR_OPEN_FL", "DOOR_OPEN_FR", "DOOR_OPEN_RL", "DOOR_OPEN_RR"];

pub struct StateNormalizer<V: ValueTable> {
    profile: VariantProfile,
    cfg: NormalizerCfg,
    steering: SteeringCalibrator,
    values: V,
}

impl<V: ValueTable> core::fmt::Debug for StateNormalizer<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StateNormalizer")
            .field("variant", &self.profile.variant())
            .field("gas_interceptor", &self.profile.gas_interceptor())
            .field("blind_spot_monitor", &self.profile.blind_spot_monitor())
            .field("cfg", &self.cfg)
            .finish()
    }
}

impl<V: ValueTable> StateNormalizer<V> {
    /// Construct without validation; use `build_normalizer` from outside the crate.
    pub(crate) fn from_parts(profile: VariantProfile, cfg: NormalizerCfg, values: V) -> Self {
        let steering = SteeringCalibrator::new(cfg.offset_time_constant_s, cfg.dt_s);
        Self {
            profile,
            cfg,
            steering,
            values,
        }
    }

    pub fn profile(&self) -> &VariantProfile {
        &self.profile
    }

    pub fn cfg(&self) -> &NormalizerCfg {
        &self.cfg
    }

    /// Subscription schema the bus stack must be configured with.
    pub fn schema(&self) -> SessionSchema {
        build_schema(&self.profile)
    }

    /// One control tick.
    ///
    /// `elapsed` is the time since the previous tick; it only feeds the
    /// secondary-sensor rate path. A `MissingSignal` error means the bus
    /// schema and this normalizer disagree and the session must stop; on
    /// error neither `session` nor `estimator` is touched.
    pub fn update<P, C, E>(
        &self,
        session: &mut SessionState,
        estimator: &mut E,
        pt: &P,
        cam: &C,
        elapsed: Duration,
    ) -> Result<CarStateSnapshot>
    where
        P: SignalFrame + ?Sized,
        C: SignalFrame + ?Sized,
        E: SpeedEstimator + ?Sized,
    {
        let mut next = session.clone();
        let mut snap = self.assemble(&mut next, pt, cam, elapsed)?;
        let (v_ego, a_ego) = estimator.update(snap.v_ego_raw);
        snap.v_ego = v_ego;
        snap.a_ego = a_ego;
        *session = next;
        Ok(snap)
    }

    /// Reads every signal and advances `session`; the caller commits it only on success.
    fn assemble<P, C>(
        &self,
        session: &mut SessionState,
        pt: &P,
        cam: &C,
        elapsed: Duration,
    ) -> core::result::Result<CarStateSnapshot, CarStateError>
    where
        P: SignalFrame + ?Sized,
        C: SignalFrame + ?Sized,
    {
        let d = self.profile.descriptor();
        let mut ret = CarStateSnapshot::default();

        // 1) body and brake
        let mut door_open = false;
        for door in DOORS {
            door_open |= flag(read(pt, Bus::Pt, "BODY_CONTROL_STATE", door)?);
        }
        ret.door_open = door_open;
        ret.seatbelt_unlatched = flag(read(
            pt,
            Bus::Pt,
            "BODY_CONTROL_STATE",
            "SEATBELT_DRIVER_UNLATCHED",
        )?);
        ret.brake_pressed = flag(read(pt, Bus::Pt, "BRAKE_MODULE", "BRAKE_PRESSED")?);
        ret.brake_hold_active = read(pt, Bus::Pt, "ESP_CONTROL", "BRAKE_HOLD_ACTIVE")? == 1.0;

        // 2) gas
        if self.profile.gas_interceptor() {
            let g1 = read(pt, Bus::Pt, "GAS_SENSOR", "INTERCEPTOR_GAS")?;
            let g2 = read(pt, Bus::Pt, "GAS_SENSOR", "INTERCEPTOR_GAS2")?;
            ret.gas = (g1 + g2) / 2.0;
            ret.gas_pressed = ret.gas > GAS_INTERCEPTOR_THRESHOLD;
        } else {
            ret.gas = read(pt, Bus::Pt, "GAS_PEDAL", "GAS_PEDAL")?;
            ret.gas_pressed = match d.gas_pressed {
                GasPressedRule::Never => false,
                GasPressedRule::GasReleasedInverted => {
                    read(pt, Bus::Pt, "PCM_CRUISE", "GAS_RELEASED")? == 0.0
                }
            };
        }

        // 3) wheel speeds and ego speed
        let (front, rear) = d.wheels.messages();
        ret.wheel_speeds = WheelSpeeds {
            fl: read(pt, Bus::Pt, front, "WHEEL_SPEED_FL")?,
            fr: read(pt, Bus::Pt, front, "WHEEL_SPEED_FR")?,
            rl: read(pt, Bus::Pt, rear, "WHEEL_SPEED_RL")?,
            rr: read(pt, Bus::Pt, rear, "WHEEL_SPEED_RR")?,
        };
        ret.v_ego_raw = ret.wheel_speeds.mean();
        ret.standstill = ret.v_ego_raw < STANDSTILL_SPEED_MPS;

        // 4) steering angle, offset and rate
        if d.secondary_angle_sensor {
            let angle = read(pt, Bus::Pt, "SECONDARY_STEER_ANGLE", "ZORRO_STEER")?;
            ret.steering_angle_deg = angle;
            ret.steering_rate_deg = session.rate.update(angle, elapsed.as_secs_f64());
        } else {
            let candidate = read(pt, Bus::Pt, "STEER_ANGLE_SENSOR", "STEER_ANGLE")?
                + read(pt, Bus::Pt, "STEER_ANGLE_SENSOR", "STEER_FRACTION")?;
            let torque_angle = read(pt, Bus::Pt, "STEER_TORQUE_SENSOR", "STEER_ANGLE")?;
            let initializing = flag(read(
                pt,
                Bus::Pt,
                "STEER_TORQUE_SENSOR",
                "STEER_ANGLE_INITIALIZING",
            )?);
            let angle = self.steering.update(
                &mut session.steering,
                candidate,
                torque_angle,
                initializing,
                pt.is_valid(),
            );
            ret.steering_angle_deg = angle.angle_deg;
            ret.steering_angle_offset_deg = angle.offset_deg.unwrap_or(0.0);
            ret.steering_rate_deg = read(pt, Bus::Pt, "STEER_ANGLE_SENSOR", "STEER_RATE")?;
        }

        // 5) gear
        let gear_code = code(read(pt, Bus::Pt, GEAR_MESSAGE, GEAR_SIGNAL)?);
        ret.gear_shifter = resolve_gear(&self.values, gear_code);

        // 6) blinkers
        let turn = code(read(pt, Bus::Pt, "BLINKERS_STATE", "TURN_SIGNALS")?);
        ret.left_blinker = turn == 1;
        ret.right_blinker = turn == 2;

        // 7) steering torque and rack health
        ret.steering_torque = read(pt, Bus::Pt, "STEER_TORQUE_SENSOR", "STEER_TORQUE_DRIVER")?;
        ret.steering_torque_eps =
            read(pt, Bus::Pt, "STEER_TORQUE_SENSOR", "STEER_TORQUE_EPS")? * d.eps_torque_scale;
        // The rack's own override bit trips at too high a torque; threshold the driver channel.
        ret.steering_pressed = ret.steering_torque.abs() > d.steer_threshold;
        let lka_state = code(read(pt, Bus::Pt, "EPS_STATUS", "LKA_STATE")?);
        session.steer_state = Some(lka_state);
        ret.steer_warning = !LKA_STATE_OK.contains(&lka_state);

        // 8) cruise
        ret.cruise_state = CruiseStateClassifier::new(&self.profile).classify(pt, cam, session)?;
        ret.esp_disabled = flag(read(pt, Bus::Pt, "ESP_CONTROL", "TC_DISABLED")?);

        // 9) blind spot
        if self.profile.blind_spot_monitor() {
            ret.left_blindspot = read(pt, Bus::Pt, "BSM", "L_ADJACENT")? == 1.0
                || read(pt, Bus::Pt, "BSM", "L_APPROACHING")? == 1.0;
            ret.right_blindspot = read(pt, Bus::Pt, "BSM", "R_ADJACENT")? == 1.0
                || read(pt, Bus::Pt, "BSM", "R_APPROACHING")? == 1.0;
        }

        // 10) passthroughs
        if d.assist_passthrough {
            ret.generic_toggle = flag(read(pt, Bus::Pt, "LIGHT_STALK", "AUTO_HIGH_BEAM")?);
            let active = flag(read(cam, Bus::Cam, "PRE_COLLISION", "PRECOLLISION_ACTIVE")?);
            let force = read(cam, Bus::Cam, "PRE_COLLISION", "FORCE")?;
            ret.stock_aeb = active && force < STOCK_AEB_FORCE;
        } else {
            ret.generic_toggle = true;
            ret.stock_aeb = false;
        }

        Ok(ret)
    }
}

/// Every `(bus, message, signal)` the normalizer may read for `profile`.
///
/// Used at construction time to prove the schema covers the normalizer.
pub fn required_signals(profile: &VariantProfile) -> Vec<(Bus, &'static str, &'static str)> {
    let d = profile.descriptor();
    let mut out: Vec<(Bus, &'static str, &'static str)> = Vec::with_capacity(48);
    let mut pt = |m: &'static str, s: &'static str| out.push((Bus::Pt, m, s));

    for door in DOORS {
        pt("BODY_CONTROL_STATE", door);
    }
    pt("BODY_CONTROL_STATE", "SEATBELT_DRIVER_UNLATCHED");
    pt("BRAKE_MODULE", "BRAKE_PRESSED");
    pt("ESP_CONTROL", "BRAKE_HOLD_ACTIVE");
    pt("ESP_CONTROL", "TC_DISABLED");

    if profile.gas_interceptor() {
        pt("GAS_SENSOR", "INTERCEPTOR_GAS");
        pt("GAS_SENSOR", "INTERCEPTOR_GAS2");
    } else {
        pt("GAS_PEDAL", "GAS_PEDAL");
        if d.gas_pressed == GasPressedRule::GasReleasedInverted {
            pt("PCM_CRUISE", "GAS_RELEASED");
        }
    }

    let (front, rear) = d.wheels.messages();
    pt(front, "WHEEL_SPEED_FL");
    pt(front, "WHEEL_SPEED_FR");
    pt(rear, "WHEEL_SPEED_RL");
    pt(rear, "WHEEL_SPEED_RR");

    if d.secondary_angle_sensor {
        pt("SECONDARY_STEER_ANGLE", "ZORRO_STEER");
    } else {
        pt("STEER_ANGLE_SENSOR", "STEER_ANGLE");
        pt("STEER_ANGLE_SENSOR", "STEER_FRACTION");
        pt("STEER_ANGLE_SENSOR", "STEER_RATE");
        pt("STEER_TORQUE_SENSOR", "STEER_ANGLE");
        pt("STEER_TORQUE_SENSOR", "STEER_ANGLE_INITIALIZING");
    }

    pt(GEAR_MESSAGE, GEAR_SIGNAL);
    pt("BLINKERS_STATE", "TURN_SIGNALS");
    pt("STEER_TORQUE_SENSOR", "STEER_TORQUE_DRIVER");
    pt("STEER_TORQUE_SENSOR", "STEER_TORQUE_EPS");
    pt("EPS_STATUS", "LKA_STATE");

    match d.cruise {
        CruiseSource::Dsu => {
            pt("DSU_CRUISE", "MAIN_ON");
            pt("DSU_CRUISE", "SET_SPEED");
        }
        CruiseSource::Pcm => {
            pt("PCM_CRUISE_2", "MAIN_ON");
            pt("PCM_CRUISE_2", "SET_SPEED");
        }
        CruiseSource::SingleState => pt("PCM_CRUISE_SM", "CRUISE_CONTROL_STATE"),
    }
    if d.lockout != LockoutRule::NotTracked {
        pt("PCM_CRUISE_2", "LOW_SPEED_LOCKOUT");
    }
    if d.cruise != CruiseSource::SingleState {
        pt("PCM_CRUISE", "CRUISE_STATE");
        pt("PCM_CRUISE", "CRUISE_ACTIVE");
    }

    if profile.blind_spot_monitor() {
        pt("BSM", "L_ADJACENT");
        pt("BSM", "L_APPROACHING");
        pt("BSM", "R_ADJACENT");
        pt("BSM", "R_APPROACHING");
    }
    if d.assist_passthrough {
        pt("LIGHT_STALK", "AUTO_HIGH_BEAM");
        out.push((Bus::Cam, "PRE_COLLISION", "PRECOLLISION_ACTIVE"));
        out.push((Bus::Cam, "PRE_COLLISION", "FORCE"));
    }
    if d.second_gen_assist {
        out.push((Bus::Cam, "ACC_CONTROL", "ACC_TYPE"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::DecodedFrame;
    use crate::gear::ToyotaGearTable;
    use crate::mocks::PassthroughEstimator;
    use crate::snapshot::GearShifter;
    use crate::speed::SpeedKf;
    use crate::variant::{SessionConfig, VehicleVariant};

    const TICK: Duration = Duration::from_millis(10);

    struct Rig {
        n: StateNormalizer<ToyotaGearTable>,
        session: SessionState,
        est: PassthroughEstimator,
        pt: DecodedFrame,
        cam: DecodedFrame,
    }

    impl Rig {
        fn new(cfg: SessionConfig) -> Self {
            let n = StateNormalizer::from_parts(
                VariantProfile::from(cfg),
                NormalizerCfg::default(),
                ToyotaGearTable,
            );
            let schema = n.schema();
            Self {
                pt: DecodedFrame::zeroed(&schema.pt, true),
                cam: DecodedFrame::zeroed(&schema.cam, true),
                n,
                session: SessionState::new(),
                est: PassthroughEstimator,
            }
        }

        fn tick(&mut self) -> CarStateSnapshot {
            self.n
                .update(&mut self.session, &mut self.est, &self.pt, &self.cam, TICK)
                .unwrap()
        }
    }

    #[test]
    fn interceptor_gas_is_mean_and_threshold_is_exclusive() {
        let mut r = Rig::new(SessionConfig::new(VehicleVariant::Prius).with_gas_interceptor(true));
        r.pt.set("GAS_SENSOR", "INTERCEPTOR_GAS", 20.0)
            .set("GAS_SENSOR", "INTERCEPTOR_GAS2", 10.0);
        let s = r.tick();
        assert_eq!(s.gas, 15.0);
        assert!(!s.gas_pressed);

        r.pt.set("GAS_SENSOR", "INTERCEPTOR_GAS2", 12.0);
        let s = r.tick();
        assert_eq!(s.gas, 16.0);
        assert!(s.gas_pressed);
    }

    #[test]
    fn gas_pressed_follows_inverted_release_bit() {
        let mut r = Rig::new(SessionConfig::new(VehicleVariant::Camry));
        r.pt.set("GAS_PEDAL", "GAS_PEDAL", 0.3)
            .set("PCM_CRUISE", "GAS_RELEASED", 1.0);
        let s = r.tick();
        assert_eq!(s.gas, 0.3);
        assert!(!s.gas_pressed);
        r.pt.set("PCM_CRUISE", "GAS_RELEASED", 0.0);
        assert!(r.tick().gas_pressed);
    }

    #[test]
    fn legacy_gas_is_never_pressed() {
        let mut r = Rig::new(SessionConfig::new(VehicleVariant::Corolla2010));
        r.pt.set("GAS_PEDAL", "GAS_PEDAL", 50.0);
        let s = r.tick();
        assert_eq!(s.gas, 50.0);
        assert!(!s.gas_pressed);
    }

    #[test]
    fn any_door_opens_the_car() {
        let mut r = Rig::new(SessionConfig::new(VehicleVariant::Rav4));
        assert!(!r.tick().door_open);
        r.pt.set("BODY_CONTROL_STATE", "DOOR_OPEN_RR", 1.0);
        assert!(r.tick().door_open);
    }

    #[test]
    fn eps_torque_is_scaled_and_driver_threshold_is_exclusive() {
        let mut r = Rig::new(SessionConfig::new(VehicleVariant::Corolla));
        r.pt.set("STEER_TORQUE_SENSOR", "STEER_TORQUE_EPS", 100.0)
            .set("STEER_TORQUE_SENSOR", "STEER_TORQUE_DRIVER", -100.0);
        let s = r.tick();
        assert!((s.steering_torque_eps - 88.0).abs() < 1e-9);
        assert_eq!(s.steering_torque, -100.0);
        assert!(!s.steering_pressed);
        r.pt.set("STEER_TORQUE_SENSOR", "STEER_TORQUE_DRIVER", -101.0);
        assert!(r.tick().steering_pressed);
    }

    #[test]
    fn steer_warning_outside_healthy_lka_states() {
        let mut r = Rig::new(SessionConfig::new(VehicleVariant::Prius));
        for (lka, warn) in [(0.0, true), (1.0, false), (3.0, false), (5.0, false), (9.0, true)] {
            r.pt.set("EPS_STATUS", "LKA_STATE", lka);
            assert_eq!(r.tick().steer_warning, warn, "LKA_STATE {lka}");
        }
        assert_eq!(r.session.steer_state(), Some(9));
    }

    #[test]
    fn gear_and_blinkers() {
        let mut r = Rig::new(SessionConfig::new(VehicleVariant::Highlander));
        r.pt.set("GEAR_PACKET", "GEAR", 16.0)
            .set("BLINKERS_STATE", "TURN_SIGNALS", 2.0);
        let s = r.tick();
        assert_eq!(s.gear_shifter, GearShifter::Reverse);
        assert!(!s.left_blinker);
        assert!(s.right_blinker);
        r.pt.set("GEAR_PACKET", "GEAR", 7.0)
            .set("BLINKERS_STATE", "TURN_SIGNALS", 3.0);
        let s = r.tick();
        assert_eq!(s.gear_shifter, GearShifter::Unknown);
        assert!(!s.left_blinker && !s.right_blinker);
    }

    #[test]
    fn stock_aeb_needs_active_and_negative_force() {
        let mut r = Rig::new(SessionConfig::new(VehicleVariant::Rav4Tss2));
        r.cam.set("PRE_COLLISION", "PRECOLLISION_ACTIVE", 1.0);
        assert!(!r.tick().stock_aeb);
        r.cam.set("PRE_COLLISION", "FORCE", -0.5);
        assert!(r.tick().stock_aeb);
        r.cam.set("PRE_COLLISION", "PRECOLLISION_ACTIVE", 0.0);
        assert!(!r.tick().stock_aeb);
    }

    #[test]
    fn legacy_variant_has_fixed_passthroughs() {
        let mut r = Rig::new(SessionConfig::new(VehicleVariant::Corolla2010));
        let s = r.tick();
        assert!(s.generic_toggle);
        assert!(!s.stock_aeb);
        assert_eq!(s.steering_angle_offset_deg, 0.0);
    }

    #[test]
    fn blind_spot_only_when_fitted() {
        let mut r = Rig::new(
            SessionConfig::new(VehicleVariant::CamryHybrid).with_blind_spot_monitor(true),
        );
        r.pt.set("BSM", "L_APPROACHING", 1.0);
        let s = r.tick();
        assert!(s.left_blindspot);
        assert!(!s.right_blindspot);

        let mut bare = Rig::new(SessionConfig::new(VehicleVariant::CamryHybrid));
        bare.pt.set("BSM", "L_APPROACHING", 1.0);
        assert!(!bare.tick().left_blindspot);
    }

    #[test]
    fn missing_signal_is_an_error() {
        let mut r = Rig::new(SessionConfig::new(VehicleVariant::Prius));
        r.pt = DecodedFrame::new(true);
        let err = r
            .n
            .update(&mut r.session, &mut r.est, &r.pt, &r.cam, TICK)
            .unwrap_err();
        let typed = err.downcast_ref::<CarStateError>().unwrap();
        assert!(matches!(typed, CarStateError::MissingSignal { bus: Bus::Pt, .. }));
    }

    #[test]
    fn failed_update_leaves_session_and_estimator_untouched() {
        let with_bsm = SessionConfig::new(VehicleVariant::Rav4Tss2).with_blind_spot_monitor(true);
        let n = StateNormalizer::from_parts(
            VariantProfile::from(with_bsm),
            NormalizerCfg::default(),
            ToyotaGearTable,
        );
        // Powertrain frame lacks the BSM message, which is read after steering and cruise.
        let bare = build_schema(&VariantProfile::from(SessionConfig::new(
            VehicleVariant::Rav4Tss2,
        )));
        let mut pt = DecodedFrame::zeroed(&bare.pt, true);
        pt.set("STEER_ANGLE_SENSOR", "STEER_ANGLE", 4.0)
            .set("STEER_TORQUE_SENSOR", "STEER_ANGLE", 5.0)
            .set("SECONDARY_STEER_ANGLE", "ZORRO_STEER", 4.0)
            .set("EPS_STATUS", "LKA_STATE", 5.0)
            .set("WHEEL_SPEEDS_FRONT", "WHEEL_SPEED_FL", 1.0);
        let mut cam = DecodedFrame::zeroed(&n.schema().cam, true);
        cam.set("ACC_CONTROL", "ACC_TYPE", 2.0);

        let mut session = SessionState::new();
        let mut kf = SpeedKf::new(0.01);
        let err = n.update(&mut session, &mut kf, &pt, &cam, TICK).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CarStateError>(),
            Some(CarStateError::MissingSignal { signal, .. }) if signal == "L_ADJACENT"
        ));
        assert_eq!(session, SessionState::new());
        assert_eq!(kf.state(), (0.0, 0.0));

        let mut pt_full = DecodedFrame::zeroed(&n.schema().pt, true);
        pt_full
            .set("STEER_TORQUE_SENSOR", "STEER_ANGLE", 5.0)
            .set("SECONDARY_STEER_ANGLE", "ZORRO_STEER", 4.0)
            .set("EPS_STATUS", "LKA_STATE", 5.0)
            .set("WHEEL_SPEEDS_FRONT", "WHEEL_SPEED_FL", 1.0);
        n.update(&mut session, &mut kf, &pt_full, &cam, TICK).unwrap();
        assert_ne!(session, SessionState::new());
        assert_ne!(kf.state(), (0.0, 0.0));
    }

    #[test]
    fn required_signals_are_unique() {
        for v in VehicleVariant::ALL {
            for (gas, bsm) in [(false, false), (true, true)] {
                let p = VariantProfile::from(
                    SessionConfig::new(v)
                        .with_gas_interceptor(gas)
                        .with_blind_spot_monitor(bsm),
                );
                let req = required_signals(&p);
                let mut dedup = req.clone();
                dedup.sort_by_key(|(b, m, s)| (b.to_string(), *m, *s));
                dedup.dedup();
                assert_eq!(dedup.len(), req.len(), "{v}");
            }
        }
    }
}
