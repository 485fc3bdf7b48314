//! Per-cycle vehicle state published to the control stack.

use serde::Serialize;

/// Gear selector position. Codes the dictionary does not know map to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GearShifter {
    #[default]
    Unknown,
    Park,
    Drive,
    Neutral,
    Reverse,
    Sport,
    Low,
    Brake,
    Eco,
    Manumatic,
}

impl GearShifter {
    /// Map a dictionary label ("P", "DRIVE", ...) to a gear. `None` and
    /// unrecognized labels give `Unknown`.
    pub fn from_label(label: Option<&str>) -> Self {
        let Some(label) = label else {
            return GearShifter::Unknown;
        };
        match label.trim().to_ascii_uppercase().as_str() {
            "P" | "PARK" => GearShifter::Park,
            "R" | "REVERSE" => GearShifter::Reverse,
            "N" | "NEUTRAL" => GearShifter::Neutral,
            "E" | "ECO" => GearShifter::Eco,
            "T" | "MANUAL" => GearShifter::Manumatic,
            "D" | "DRIVE" => GearShifter::Drive,
            "S" | "SPORT" => GearShifter::Sport,
            "L" | "LOW" => GearShifter::Low,
            "B" | "BRAKE" => GearShifter::Brake,
            _ => GearShifter::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WheelSpeeds {
    pub fl: f64,
    pub fr: f64,
    pub rl: f64,
    pub rr: f64,
}

impl WheelSpeeds {
    /// Arithmetic mean of the four wheels.
    pub fn mean(&self) -> f64 {
        (self.fl + self.fr + self.rl + self.rr) / 4.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CruiseState {
    pub available: bool,
    /// Set speed in m/s.
    pub speed: f64,
    pub enabled: bool,
    pub standstill: bool,
    pub non_adaptive: bool,
}

/// Output of one normalizer cycle. Built fresh every tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarStateSnapshot {
    pub door_open: bool,
    pub seatbelt_unlatched: bool,
    pub brake_pressed: bool,
    pub brake_hold_active: bool,
    pub gas: f64,
    pub gas_pressed: bool,
    pub wheel_speeds: WheelSpeeds,
    pub v_ego_raw: f64,
    pub v_ego: f64,
    pub a_ego: f64,
    pub standstill: bool,
    pub steering_angle_deg: f64,
    pub steering_angle_offset_deg: f64,
    pub steering_rate_deg: f64,
    pub steering_torque: f64,
    pub steering_torque_eps: f64,
    pub steering_pressed: bool,
    pub steer_warning: bool,
    pub gear_shifter: GearShifter,
    pub left_blinker: bool,
    pub right_blinker: bool,
    pub cruise_state: CruiseState,
    pub esp_disabled: bool,
    pub left_blindspot: bool,
    pub right_blindspot: bool,
    pub generic_toggle: bool,
    pub stock_aeb: bool,
}
