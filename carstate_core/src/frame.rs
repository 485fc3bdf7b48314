//! In-memory decoded frame handed over by the signal bus each cycle.

use std::collections::HashMap;

use carstate_traits::SignalFrame;

use crate::schema::BusSchema;

/// Decoded values of one bus for one cycle, keyed by message then signal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFrame {
    values: HashMap<String, HashMap<String, f64>>,
    valid: bool,
}

impl DecodedFrame {
    /// Empty frame with the given bus validity.
    pub fn new(valid: bool) -> Self {
        Self {
            values: HashMap::new(),
            valid,
        }
    }

    /// Frame holding every signal `schema` subscribes to, all set to 0.
    pub fn zeroed(schema: &BusSchema, valid: bool) -> Self {
        let mut frame = Self::new(valid);
        for req in &schema.signals {
            frame.set(req.message, req.signal, 0.0);
        }
        frame
    }

    /// Insert or overwrite a decoded value.
    pub fn set(&mut self, message: &str, signal: &str, value: f64) -> &mut Self {
        self.values
            .entry(message.to_string())
            .or_default()
            .insert(signal.to_string(), value);
        self
    }

    /// Builder-style variant of [`DecodedFrame::set`].
    pub fn with(mut self, message: &str, signal: &str, value: f64) -> Self {
        self.set(message, signal, value);
        self
    }

    pub fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    /// Number of decoded signals across all messages.
    pub fn len(&self) -> usize {
        self.values.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SignalFrame for DecodedFrame {
    fn value(&self, message: &str, signal: &str) -> Option<f64> {
        self.values.get(message)?.get(signal).copied()
    }

    fn is_valid(&self) -> bool {
        self.valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_read_back() {
        let mut f = DecodedFrame::new(true);
        f.set("GEAR_PACKET", "GEAR", 32.0)
            .set("GEAR_PACKET", "GEAR", 0.0)
            .set("BRAKE_MODULE", "BRAKE_PRESSED", 1.0);
        assert_eq!(f.value("GEAR_PACKET", "GEAR"), Some(0.0));
        assert_eq!(f.value("BRAKE_MODULE", "BRAKE_PRESSED"), Some(1.0));
        assert_eq!(f.value("BRAKE_MODULE", "NOPE"), None);
        assert_eq!(f.value("NOPE", "GEAR"), None);
        assert_eq!(f.len(), 2);
        assert!(f.is_valid());
    }

    #[test]
    fn validity_is_independent_of_content() {
        let mut f = DecodedFrame::default();
        assert!(!f.is_valid());
        assert!(f.is_empty());
        f.set_valid(true);
        assert!(f.is_valid());
    }
}
