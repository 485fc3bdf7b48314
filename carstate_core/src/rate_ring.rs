//! Steering rate for the secondary absolute angle sensor, which carries no
//! rate signal of its own.

use std::collections::VecDeque;

/// Number of rate samples kept for the running average.
pub const RATE_RING_CAPACITY: usize = 5;

/// Fixed-capacity window of recent rate samples with an O(1) running sum.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateRingBuffer {
    buf: VecDeque<f64>,
    sum: f64,
}

impl RateRingBuffer {
    pub fn new() -> Self {
        Self {
            buf: VecDeque::with_capacity(RATE_RING_CAPACITY),
            sum: 0.0,
        }
    }

    /// Push a sample, evicting the oldest once full.
    pub fn push(&mut self, v: f64) {
        if self.buf.len() == RATE_RING_CAPACITY
            && let Some(old) = self.buf.pop_front()
        {
            self.sum -= old;
        }
        self.buf.push_back(v);
        self.sum += v;
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Mean of the held samples; 0 when empty.
    pub fn average(&self) -> f64 {
        if self.buf.is_empty() {
            0.0
        } else {
            self.sum / self.buf.len() as f64
        }
    }
}

/// Instantaneous angle-difference rate with a smoothed side channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateRingSmoother {
    ring: RateRingBuffer,
    last_angle: Option<f64>,
    smoothed: f64,
}

impl RateRingSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the instantaneous rate in deg/s.
    ///
    /// The first call has nothing to difference against and reports 0.
    /// A non-positive or non-finite `elapsed_s` also reports 0 and leaves the
    /// ring untouched.
    pub fn update(&mut self, angle_deg: f64, elapsed_s: f64) -> f64 {
        let rate = match self.last_angle {
            None => 0.0,
            Some(prev) if elapsed_s > 0.0 && elapsed_s.is_finite() => {
                let r = (angle_deg - prev) / elapsed_s;
                self.ring.push(r);
                self.smoothed = self.ring.average();
                r
            }
            Some(_) => {
                tracing::warn!(elapsed_s, "degenerate tick interval; steering rate forced to 0");
                0.0
            }
        };
        self.last_angle = Some(angle_deg);
        rate
    }

    /// Ring-averaged rate. Maintained every cycle but not published in the snapshot.
    pub fn smoothed_rate(&self) -> f64 {
        self.smoothed
    }

    pub fn ring(&self) -> &RateRingBuffer {
        &self.ring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_evicts_oldest_and_keeps_sum() {
        let mut r = RateRingBuffer::new();
        for v in 1..=7 {
            r.push(f64::from(v));
        }
        assert_eq!(r.len(), RATE_RING_CAPACITY);
        // holds 3,4,5,6,7
        assert!((r.sum() - 25.0).abs() < 1e-12);
        assert!((r.average() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn empty_ring_average_is_zero() {
        assert_eq!(RateRingBuffer::new().average(), 0.0);
    }

    #[test]
    fn first_call_is_zero_then_differences() {
        let mut s = RateRingSmoother::new();
        assert_eq!(s.update(10.0, 0.01), 0.0);
        let r = s.update(10.5, 0.1);
        assert!((r - 5.0).abs() < 1e-9, "rate = {r}");
        assert_eq!(s.ring().len(), 1);
    }

    #[test]
    fn zero_or_negative_elapsed_publishes_zero() {
        let mut s = RateRingSmoother::new();
        s.update(0.0, 0.01);
        assert_eq!(s.update(5.0, 0.0), 0.0);
        assert_eq!(s.update(6.0, -0.01), 0.0);
        assert_eq!(s.update(7.0, f64::NAN), 0.0);
        assert!(s.ring().is_empty());
        // angle still tracked across degenerate ticks
        let r = s.update(8.0, 0.5);
        assert!((r - 2.0).abs() < 1e-12);
    }

    #[test]
    fn smoothed_rate_averages_window() {
        let mut s = RateRingSmoother::new();
        s.update(0.0, 0.1);
        s.update(1.0, 1.0); // 1
        s.update(4.0, 1.0); // 3
        assert!((s.smoothed_rate() - 2.0).abs() < 1e-12);
    }
}
