//! Default named-value dictionary for the gear selector.

use carstate_traits::ValueTable;

use crate::snapshot::GearShifter;

pub const GEAR_MESSAGE: &str = "GEAR_PACKET";
pub const GEAR_SIGNAL: &str = "GEAR";

/// `GEAR_PACKET.GEAR` value table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToyotaGearTable;

impl ValueTable for ToyotaGearTable {
    fn label(&self, message: &str, signal: &str, code: i64) -> Option<&str> {
        if message != GEAR_MESSAGE || signal != GEAR_SIGNAL {
            return None;
        }
        match code {
            0 => Some("D"),
            1 => Some("S"),
            8 => Some("N"),
            16 => Some("R"),
            32 => Some("P"),
            _ => None,
        }
    }
}

/// Resolve a raw gear code through `table`; unknown codes give `GearShifter::Unknown`.
pub fn resolve_gear<V: ValueTable + ?Sized>(table: &V, code: i64) -> GearShifter {
    GearShifter::from_label(table.label(GEAR_MESSAGE, GEAR_SIGNAL, code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, GearShifter::Drive)]
    #[case(1, GearShifter::Sport)]
    #[case(8, GearShifter::Neutral)]
    #[case(16, GearShifter::Reverse)]
    #[case(32, GearShifter::Park)]
    #[case(3, GearShifter::Unknown)]
    #[case(-1, GearShifter::Unknown)]
    fn resolves_codes(#[case] code: i64, #[case] gear: GearShifter) {
        assert_eq!(resolve_gear(&ToyotaGearTable, code), gear);
    }

    #[test]
    fn other_signals_have_no_labels() {
        assert_eq!(ToyotaGearTable.label("GEAR_PACKET", "SPORT_ON", 0), None);
        assert_eq!(ToyotaGearTable.label("EPS_STATUS", "GEAR", 0), None);
    }
}
