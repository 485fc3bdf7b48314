//! Single-pole low-pass filter used for the steering offset estimate.

/// First-order IIR low-pass: `y = (1 - alpha) * y + alpha * u`,
/// with `alpha = dt / (tau + dt)`.
///
/// The filter itself is stateless; the caller owns the `(value, initialized)`
/// pair so that session state stays in one explicit struct.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstOrderFilter {
    alpha: f64,
}

impl FirstOrderFilter {
    /// `time_constant_s` and `dt_s` are validated by the normalizer builder.
    pub fn new(time_constant_s: f64, dt_s: f64) -> Self {
        Self {
            alpha: dt_s / (time_constant_s + dt_s),
        }
    }

    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Advance one sample. The first sample (`prev == None`) seeds the output.
    #[inline]
    pub fn step(&self, prev: Option<f64>, u: f64) -> f64 {
        match prev {
            None => u,
            Some(y) => (1.0 - self.alpha) * y + self.alpha * u,
        }
    }
}
