//! Supported vehicle variants and the per-variant descriptor table.
//!
//! Everything that differs between models (which cruise message is
//! authoritative, how wheel speeds are laid out, how gas-pressed is derived,
//! which lockout rule applies, steering thresholds) lives in exactly one
//! `VariantDescriptor` per variant. The schema builder, the normalizer and the
//! cruise classifier all consume the descriptor instead of matching on the
//! variant themselves.

use core::str::FromStr;

use crate::error::CarStateError;

/// Closed set of supported vehicle models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleVariant {
    Prius,
    Rav4,
    Rav4Hybrid,
    Camry,
    CamryHybrid,
    Corolla,
    Highlander,
    HighlanderHybrid,
    LexusRx,
    LexusIs,
    LexusRc,
    Rav4Tss2,
    Rav4HybridTss2,
    CorollaTss2,
    /// Pre-assist model retrofitted with a secondary absolute angle sensor.
    Corolla2010,
}

impl VehicleVariant {
    pub const ALL: [VehicleVariant; 15] = [
        VehicleVariant::Prius,
        VehicleVariant::Rav4,
        VehicleVariant::Rav4Hybrid,
        VehicleVariant::Camry,
        VehicleVariant::CamryHybrid,
        VehicleVariant::Corolla,
        VehicleVariant::Highlander,
        VehicleVariant::HighlanderHybrid,
        VehicleVariant::LexusRx,
        VehicleVariant::LexusIs,
        VehicleVariant::LexusRc,
        VehicleVariant::Rav4Tss2,
        VehicleVariant::Rav4HybridTss2,
        VehicleVariant::CorollaTss2,
        VehicleVariant::Corolla2010,
    ];

    /// Descriptor record for this variant.
    #[inline]
    pub fn descriptor(self) -> &'static VariantDescriptor {
        &DESCRIPTORS[self as usize]
    }

    /// Config-file name, e.g. `"rav4_tss2"`.
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn is_second_gen_assist(self) -> bool {
        self.descriptor().second_gen_assist
    }

    pub fn uses_secondary_angle_sensor(self) -> bool {
        self.descriptor().secondary_angle_sensor
    }

    pub fn is_legacy_model(self) -> bool {
        self.descriptor().legacy
    }

    pub fn suppresses_standstill_timer(self) -> bool {
        self.descriptor().no_stop_timer
    }
}

impl core::fmt::Display for VehicleVariant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VehicleVariant {
    type Err = CarStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        VehicleVariant::ALL
            .iter()
            .copied()
            .find(|v| v.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CarStateError::UnknownVariant(s.to_string()))
    }
}

/// Where cruise availability, set speed and engagement are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CruiseSource {
    /// Availability and set speed from `PCM_CRUISE_2`, engagement from `PCM_CRUISE`.
    Pcm,
    /// Luxury trims: availability and set speed from the DSU's `DSU_CRUISE`.
    Dsu,
    /// Legacy model: only a single on/off state in `PCM_CRUISE_SM`.
    SingleState,
}

/// Message layout of the four wheel-speed signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelLayout {
    /// All four wheels in `WHEEL_SPEEDS`.
    Combined,
    /// Fronts in `WHEEL_SPEEDS_FRONT`, rears in `WHEEL_SPEEDS_REAR`.
    SplitFrontRear,
}

impl WheelLayout {
    /// `(front message, rear message)`.
    pub fn messages(self) -> (&'static str, &'static str) {
        match self {
            WheelLayout::Combined => ("WHEEL_SPEEDS", "WHEEL_SPEEDS"),
            WheelLayout::SplitFrontRear => ("WHEEL_SPEEDS_FRONT", "WHEEL_SPEEDS_REAR"),
        }
    }
}

/// How gas-pressed is derived when no interceptor is fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasPressedRule {
    /// Pressed iff `PCM_CRUISE.GAS_RELEASED == 0`.
    GasReleasedInverted,
    /// The pedal state is not reported; never pressed.
    Never,
}

/// When the low-speed lockout latch is refreshed from `PCM_CRUISE_2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutRule {
    /// Refreshed every cycle.
    Always,
    /// Refreshed only while the assist bus reports `ACC_TYPE == 1`.
    WhenAccTypeOne,
    /// No lockout signal on this variant.
    NotTracked,
}

/// Immutable per-variant configuration record.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantDescriptor {
    pub variant: VehicleVariant,
    pub name: &'static str,
    pub second_gen_assist: bool,
    pub secondary_angle_sensor: bool,
    pub legacy: bool,
    pub no_stop_timer: bool,
    pub cruise: CruiseSource,
    pub wheels: WheelLayout,
    pub gas_pressed: GasPressedRule,
    pub lockout: LockoutRule,
    /// Driver torque magnitude above which the wheel counts as held.
    pub steer_threshold: f64,
    /// Calibration factor applied to the assist-motor torque channel.
    pub eps_torque_scale: f64,
    /// Auto high-beam toggle and pre-collision passthrough are present.
    pub assist_passthrough: bool,
}

impl VariantDescriptor {
    const fn standard(variant: VehicleVariant, name: &'static str) -> Self {
        Self {
            variant,
            name,
            second_gen_assist: false,
            secondary_angle_sensor: false,
            legacy: false,
            no_stop_timer: false,
            cruise: CruiseSource::Pcm,
            wheels: WheelLayout::Combined,
            gas_pressed: GasPressedRule::GasReleasedInverted,
            lockout: LockoutRule::Always,
            steer_threshold: 100.0,
            eps_torque_scale: 0.88,
            assist_passthrough: true,
        }
    }

    /// Hybrids and similar platforms that resume from standstill without a gesture.
    const fn no_stop_timer(variant: VehicleVariant, name: &'static str) -> Self {
        Self {
            no_stop_timer: true,
            ..Self::standard(variant, name)
        }
    }

    const fn dsu(variant: VehicleVariant, name: &'static str) -> Self {
        Self {
            cruise: CruiseSource::Dsu,
            lockout: LockoutRule::NotTracked,
            ..Self::standard(variant, name)
        }
    }

    const fn second_gen(variant: VehicleVariant, name: &'static str) -> Self {
        Self {
            second_gen_assist: true,
            no_stop_timer: true,
            lockout: LockoutRule::WhenAccTypeOne,
            ..Self::standard(variant, name)
        }
    }

    const fn legacy(variant: VehicleVariant, name: &'static str) -> Self {
        Self {
            secondary_angle_sensor: true,
            legacy: true,
            no_stop_timer: true,
            cruise: CruiseSource::SingleState,
            wheels: WheelLayout::SplitFrontRear,
            gas_pressed: GasPressedRule::Never,
            lockout: LockoutRule::NotTracked,
            assist_passthrough: false,
            ..Self::standard(variant, name)
        }
    }
}

// Indexed by `VehicleVariant as usize`; order must match the enum.
static DESCRIPTORS: [VariantDescriptor; 15] = [
    VariantDescriptor::standard(VehicleVariant::Prius, "prius"),
    VariantDescriptor::standard(VehicleVariant::Rav4, "rav4"),
    VariantDescriptor::no_stop_timer(VehicleVariant::Rav4Hybrid, "rav4_hybrid"),
    VariantDescriptor::standard(VehicleVariant::Camry, "camry"),
    VariantDescriptor::standard(VehicleVariant::CamryHybrid, "camry_hybrid"),
    VariantDescriptor::standard(VehicleVariant::Corolla, "corolla"),
    VariantDescriptor::no_stop_timer(VehicleVariant::Highlander, "highlander"),
    VariantDescriptor::no_stop_timer(VehicleVariant::HighlanderHybrid, "highlander_hybrid"),
    VariantDescriptor::standard(VehicleVariant::LexusRx, "lexus_rx"),
    VariantDescriptor::dsu(VehicleVariant::LexusIs, "lexus_is"),
    VariantDescriptor::dsu(VehicleVariant::LexusRc, "lexus_rc"),
    VariantDescriptor::second_gen(VehicleVariant::Rav4Tss2, "rav4_tss2"),
    VariantDescriptor::second_gen(VehicleVariant::Rav4HybridTss2, "rav4_hybrid_tss2"),
    VariantDescriptor::second_gen(VehicleVariant::CorollaTss2, "corolla_tss2"),
    VariantDescriptor::legacy(VehicleVariant::Corolla2010, "corolla_2010"),
];

/// Session-start input: the variant plus externally detected hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub variant: VehicleVariant,
    pub gas_interceptor_enabled: bool,
    pub blind_spot_monitor_enabled: bool,
}

impl SessionConfig {
    pub fn new(variant: VehicleVariant) -> Self {
        Self {
            variant,
            gas_interceptor_enabled: false,
            blind_spot_monitor_enabled: false,
        }
    }

    pub fn with_gas_interceptor(mut self, enabled: bool) -> Self {
        self.gas_interceptor_enabled = enabled;
        self
    }

    pub fn with_blind_spot_monitor(mut self, enabled: bool) -> Self {
        self.blind_spot_monitor_enabled = enabled;
        self
    }
}

/// Fixed description of the session: descriptor plus feature flags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantProfile {
    descriptor: &'static VariantDescriptor,
    gas_interceptor: bool,
    blind_spot_monitor: bool,
}

impl From<SessionConfig> for VariantProfile {
    fn from(cfg: SessionConfig) -> Self {
        Self {
            descriptor: cfg.variant.descriptor(),
            gas_interceptor: cfg.gas_interceptor_enabled,
            blind_spot_monitor: cfg.blind_spot_monitor_enabled,
        }
    }
}

impl VariantProfile {
    #[inline]
    pub fn descriptor(&self) -> &'static VariantDescriptor {
        self.descriptor
    }

    #[inline]
    pub fn variant(&self) -> VehicleVariant {
        self.descriptor.variant
    }

    #[inline]
    pub fn gas_interceptor(&self) -> bool {
        self.gas_interceptor
    }

    #[inline]
    pub fn blind_spot_monitor(&self) -> bool {
        self.blind_spot_monitor
    }

    pub fn is_second_gen_assist(&self) -> bool {
        self.descriptor.second_gen_assist
    }

    pub fn uses_secondary_angle_sensor(&self) -> bool {
        self.descriptor.secondary_angle_sensor
    }

    pub fn is_legacy_model(&self) -> bool {
        self.descriptor.legacy
    }

    pub fn suppresses_standstill_timer(&self) -> bool {
        self.descriptor.no_stop_timer
    }
}
