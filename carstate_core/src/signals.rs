//! Frame access helpers shared by the normalizer and the cruise classifier.

use carstate_traits::SignalFrame;

use crate::error::{Bus, CarStateError};

/// Read a signal the active variant requires; absence is a schema mismatch.
#[inline]
pub(crate) fn read<F: SignalFrame + ?Sized>(
    frame: &F,
    bus: Bus,
    message: &str,
    signal: &str,
) -> Result<f64, CarStateError> {
    frame
        .value(message, signal)
        .ok_or_else(|| CarStateError::MissingSignal {
            bus,
            message: message.to_string(),
            signal: signal.to_string(),
        })
}

/// Enumerated signals are integral on the wire; truncate like an integer cast.
#[inline]
pub(crate) fn code(v: f64) -> i64 {
    v as i64
}

/// Boolean signals: any non-zero value is set.
#[inline]
pub(crate) fn flag(v: f64) -> bool {
    v != 0.0
}
