//! Type-state builder for `CarState` and generic `build_normalizer` constructor.
//!
//! The builder enforces at compile time that a session config is provided
//! before `build()` is available. `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::time::Duration;

use carstate_traits::{SignalFrame, SpeedEstimator, ValueTable};
use eyre::WrapErr;

use crate::config::NormalizerCfg;
use crate::error::{BuildError, Result};
use crate::gear::ToyotaGearTable;
use crate::normalizer::{StateNormalizer, required_signals};
use crate::schema::{SessionSchema, build_schema};
use crate::session::SessionState;
use crate::snapshot::CarStateSnapshot;
use crate::speed::SpeedKf;
use crate::variant::{SessionConfig, VariantProfile};

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

/// One vehicle session: the normalizer plus the state it threads between ticks.
pub struct CarState {
    pub(crate) inner: StateNormalizer<Box<dyn ValueTable>>,
    session: SessionState,
    estimator: Box<dyn SpeedEstimator>,
}

impl core::fmt::Debug for CarState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CarState")
            .field("variant", &self.inner.profile().variant())
            .field("offset_initialized", &self.session.steering().initialized())
            .field("low_speed_lockout", &self.session.low_speed_lockout())
            .finish()
    }
}

impl CarState {
    /// Start building a CarState.
    pub fn builder() -> CarStateBuilder<Missing> {
        CarStateBuilder::default()
    }

    /// Normalize one tick of decoded frames.
    pub fn update<P, C>(&mut self, pt: &P, cam: &C, elapsed: Duration) -> Result<CarStateSnapshot>
    where
        P: SignalFrame + ?Sized,
        C: SignalFrame + ?Sized,
    {
        self.inner
            .update(&mut self.session, &mut *self.estimator, pt, cam, elapsed)
            .wrap_err("car state update")
    }

    /// Subscription schema for the bus stack.
    pub fn schema(&self) -> SessionSchema {
        self.inner.schema()
    }

    pub fn profile(&self) -> &VariantProfile {
        self.inner.profile()
    }

    pub fn cfg(&self) -> &NormalizerCfg {
        self.inner.cfg()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Adaptive cruise low-speed lockout as last observed.
    pub fn low_speed_lockout(&self) -> bool {
        self.session.low_speed_lockout()
    }

    /// Drop calibration, cruise and speed filter memory, as on ignition off/on.
    pub fn reset_session(&mut self) {
        self.session = SessionState::new();
        self.estimator.reset();
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `CarState`. All fields are validated on `build()`.
pub struct CarStateBuilder<S> {
    session: Option<SessionConfig>,
    control: Option<NormalizerCfg>,
    estimator: Option<Box<dyn SpeedEstimator>>,
    values: Option<Box<dyn ValueTable>>,
    _s: PhantomData<S>,
}

impl Default for CarStateBuilder<Missing> {
    fn default() -> Self {
        Self {
            session: None,
            control: None,
            estimator: None,
            values: None,
            _s: PhantomData,
        }
    }
}

/// Validate configuration and construct a `StateNormalizer`.
///
/// Single source of truth for validation, used by both
/// `CarStateBuilder::try_build()` and `build_normalizer()`.
fn validate_and_build<V: ValueTable>(
    session: SessionConfig,
    cfg: NormalizerCfg,
    values: V,
) -> Result<StateNormalizer<V>> {
    if !cfg.dt_s.is_finite() || cfg.dt_s <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "dt_s must be finite and > 0",
        )));
    }
    if !cfg.offset_time_constant_s.is_finite() || cfg.offset_time_constant_s <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "offset_time_constant_s must be finite and > 0",
        )));
    }

    let profile = VariantProfile::from(session);
    let schema = build_schema(&profile);
    for (bus, message, signal) in required_signals(&profile) {
        if !schema.bus(bus).subscribes(message, signal) {
            return Err(eyre::Report::new(BuildError::SchemaMismatch {
                bus,
                message,
                signal,
            }));
        }
    }

    tracing::debug!(
        variant = %profile.variant(),
        gas_interceptor = profile.gas_interceptor(),
        blind_spot_monitor = profile.blind_spot_monitor(),
        pt_signals = schema.pt.signals.len(),
        cam_signals = schema.cam.signals.len(),
        "normalizer built"
    );
    Ok(StateNormalizer::from_parts(profile, cfg, values))
}

impl<S> CarStateBuilder<S> {
    /// Fallible build available in any type-state; returns a typed error for missing pieces.
    pub fn try_build(self) -> Result<CarState> {
        let session = self
            .session
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSession))?;
        let cfg = self.control.unwrap_or_default();
        let values: Box<dyn ValueTable> = self.values.unwrap_or_else(|| Box::new(ToyotaGearTable));
        let dt_s = cfg.dt_s;

        let inner = validate_and_build(session, cfg, values)?;
        let estimator = self
            .estimator
            .unwrap_or_else(|| Box::new(SpeedKf::new(dt_s)));

        Ok(CarState {
            inner,
            session: SessionState::new(),
            estimator,
        })
    }

    /// Chainable setters that do not affect type-state.
    pub fn with_control(mut self, control: NormalizerCfg) -> Self {
        self.control = Some(control);
        self
    }

    /// Replace the default speed filter.
    pub fn with_estimator(mut self, estimator: impl SpeedEstimator + 'static) -> Self {
        self.estimator = Some(Box::new(estimator));
        self
    }

    /// Replace the default gear dictionary.
    pub fn with_value_table(mut self, values: impl ValueTable + 'static) -> Self {
        self.values = Some(Box::new(values));
        self
    }
}

impl CarStateBuilder<Missing> {
    pub fn with_session(self, session: SessionConfig) -> CarStateBuilder<Set> {
        CarStateBuilder {
            session: Some(session),
            control: self.control,
            estimator: self.estimator,
            values: self.values,
            _s: PhantomData,
        }
    }
}

impl CarStateBuilder<Set> {
    /// Validate and build. Only available once a session config is set.
    pub fn build(self) -> Result<CarState> {
        self.try_build()
    }
}

/// Build a generic, statically-dispatched normalizer.
///
/// Delegates to the shared `validate_and_build`. The caller owns the
/// `SessionState` and estimator.
pub fn build_normalizer<V: ValueTable>(
    session: SessionConfig,
    cfg: NormalizerCfg,
    values: V,
) -> Result<StateNormalizer<V>> {
    validate_and_build(session, cfg, values)
}
