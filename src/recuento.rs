//! Cash count ("recuento"): itemized denominations or one aggregate figure.
//!
//! Both sources are kept side by side. Switching the mode only changes which
//! one feeds the closing calculator; neither is cleared.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::denominations::{Denomination, DenominationLedger};
use crate::money::AmountInput;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountMode {
    /// Count every coin and bill ("separado").
    #[default]
    #[serde(rename = "separado", alias = "itemized")]
    Itemized,
    /// Enter the counted cash as a single figure ("total").
    #[serde(rename = "total", alias = "aggregate")]
    Aggregate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CashCount {
    pub mode: CountMode,
    pub ledger: DenominationLedger,
    pub aggregate: AmountInput,
}

impl CashCount {
    pub fn set_mode(&mut self, mode: CountMode) {
        self.mode = mode;
    }

    pub fn set_count(&mut self, denomination: Denomination, raw: &str) {
        self.ledger.set_count(denomination, raw);
    }

    pub fn set_aggregate(&mut self, raw: impl Into<String>) {
        self.aggregate = AmountInput::new(raw);
    }

    /// Counted cash from whichever source the active mode selects.
    pub fn total(&self) -> Decimal {
        match self.mode {
            CountMode::Itemized => self.ledger.subtotal(),
            CountMode::Aggregate => self.aggregate.value(),
        }
    }

    /// Clears both sources. The selected mode is kept.
    pub fn reset(&mut self) {
        self.ledger.reset();
        self.aggregate = AmountInput::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_total_follows_active_mode() {
        let mut count = CashCount::default();
        count.set_count(Denomination::Bill20, "2");
        count.set_aggregate("75.5");

        assert_eq!(count.mode, CountMode::Itemized);
        assert_eq!(count.total(), dec!(40));

        count.set_mode(CountMode::Aggregate);
        assert_eq!(count.total(), dec!(75.50));
    }

    #[test]
    fn test_toggling_mode_preserves_both_sources() {
        let mut count = CashCount::default();
        count.set_count(Denomination::Cents50, "3");
        count.set_aggregate("12");
        let before = count.clone();

        count.set_mode(CountMode::Aggregate);
        count.set_mode(CountMode::Itemized);
        count.set_mode(CountMode::Aggregate);
        count.set_mode(CountMode::Itemized);

        assert_eq!(count, before);
        assert_eq!(count.total(), dec!(1.50));
    }

    #[test]
    fn test_reset_keeps_mode() {
        let mut count = CashCount::default();
        count.set_mode(CountMode::Aggregate);
        count.set_aggregate("300");
        count.set_count(Denomination::Bill100, "3");
        count.reset();

        assert_eq!(count.mode, CountMode::Aggregate);
        assert_eq!(count.total(), Decimal::ZERO);
        assert!(count.ledger.is_empty());
    }

    #[test]
    fn test_mode_wire_names() {
        assert_eq!(
            serde_json::to_value(CountMode::Itemized).unwrap(),
            serde_json::json!("separado")
        );
        assert_eq!(
            serde_json::from_value::<CountMode>(serde_json::json!("total")).unwrap(),
            CountMode::Aggregate
        );
    }
}
