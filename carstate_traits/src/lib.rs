//! Seams between the vehicle state normalizer and its external collaborators.
//!
//! The normalizer never decodes bus frames, never looks up DBC value tables
//! and never runs the speed filter itself; it reaches those through the
//! traits below so that each can be swapped for a real bus stack or a test
//! double.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// One cycle's worth of decoded values from a single bus.
pub trait SignalFrame {
    /// Decoded value of `signal` within `message`, if the bus stack decoded it.
    fn value(&self, message: &str, signal: &str) -> Option<f64>;

    /// Bus-level validity as judged by the upstream freshness checks.
    fn is_valid(&self) -> bool;
}

/// Joint speed/acceleration estimator fed with the raw wheel-speed mean.
pub trait SpeedEstimator {
    /// Feed one raw speed sample (m/s) and return `(v_ego, a_ego)`.
    fn update(&mut self, v_ego_raw: f64) -> (f64, f64);

    /// Forget filter memory at session start. Stateless estimators keep the default.
    fn reset(&mut self) {}
}

/// Named-value dictionary mapping raw integer codes to semantic labels.
pub trait ValueTable {
    fn label(&self, message: &str, signal: &str, code: i64) -> Option<&str>;
}

impl<T: SpeedEstimator + ?Sized> SpeedEstimator for Box<T> {
    fn update(&mut self, v_ego_raw: f64) -> (f64, f64) {
        (**self).update(v_ego_raw)
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}

impl<T: ValueTable + ?Sized> ValueTable for Box<T> {
    fn label(&self, message: &str, signal: &str, code: i64) -> Option<&str> {
        (**self).label(message, signal, code)
    }
}
