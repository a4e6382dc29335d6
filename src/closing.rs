//! Closing figures ("cierre") and the reconciliation formulas.
//!
//! Cash:  expected = opening + sales + cash_income - total_expenses
//!        discrepancy = recuento - expected
//! Card:  discrepancy = card_close - card_total - tips
//!
//! Nothing here is cached. Every figure is derived from the current inputs
//! each time it is asked for, and every unparsable input counts as 0.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::expenses::ExpenseLedger;
use crate::money::AmountInput;
use crate::recuento::CashCount;

/// Figures entered on the closing tab. `opening_value` comes from the
/// backend for the selected shift and is never typed by the cashier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosingFigures {
    pub opening_value: Decimal,
    pub sales: AmountInput,
    pub cash_income: AmountInput,
    pub card_total: AmountInput,
    pub card_close: AmountInput,
    pub tips: AmountInput,
}

/// The user-editable closing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClosingField {
    Sales,
    CashIncome,
    CardTotal,
    CardClose,
    Tips,
}

impl ClosingFigures {
    pub fn set(&mut self, field: ClosingField, raw: impl Into<String>) {
        *self.field_mut(field) = AmountInput::new(raw);
    }

    pub fn get(&self, field: ClosingField) -> &AmountInput {
        match field {
            ClosingField::Sales => &self.sales,
            ClosingField::CashIncome => &self.cash_income,
            ClosingField::CardTotal => &self.card_total,
            ClosingField::CardClose => &self.card_close,
            ClosingField::Tips => &self.tips,
        }
    }

    /// Zero every entered figure; the fetched opening value stays.
    pub fn reset_entered(&mut self) {
        *self = Self {
            opening_value: self.opening_value,
            ..Default::default()
        };
    }

    fn field_mut(&mut self, field: ClosingField) -> &mut AmountInput {
        match field {
            ClosingField::Sales => &mut self.sales,
            ClosingField::CashIncome => &mut self.cash_income,
            ClosingField::CardTotal => &mut self.card_total,
            ClosingField::CardClose => &mut self.card_close,
            ClosingField::Tips => &mut self.tips,
        }
    }
}

// ---------------------------------------------------------------------------
// Formulas
// ---------------------------------------------------------------------------

/// Cash that should be in the till: opening + sales + cash income - expenses.
pub fn expected_total(figures: &ClosingFigures, expenses: &ExpenseLedger) -> Decimal {
    figures.opening_value + figures.sales.value() + figures.cash_income.value()
        - expenses.total_expenses()
}

/// Counted minus expected. Positive means the till is over, negative short.
pub fn cash_discrepancy(
    count: &CashCount,
    figures: &ClosingFigures,
    expenses: &ExpenseLedger,
) -> Decimal {
    count.total() - expected_total(figures, expenses)
}

/// Terminal close-out minus card receipts minus tips.
pub fn card_discrepancy(figures: &ClosingFigures) -> Decimal {
    figures.card_close.value() - figures.card_total.value() - figures.tips.value()
}

/// Every derived closing figure, computed together for reports and payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosingSummary {
    pub recuento_total: Decimal,
    pub total_expenses: Decimal,
    pub expected_total: Decimal,
    pub cash_discrepancy: Decimal,
    pub card_discrepancy: Decimal,
}

impl ClosingSummary {
    pub fn derive(count: &CashCount, expenses: &ExpenseLedger, figures: &ClosingFigures) -> Self {
        let recuento_total = count.total();
        let expected_total = expected_total(figures, expenses);
        Self {
            recuento_total,
            total_expenses: expenses.total_expenses(),
            expected_total,
            cash_discrepancy: recuento_total - expected_total,
            card_discrepancy: card_discrepancy(figures),
        }
    }

    /// Both discrepancies exactly zero.
    pub fn is_balanced(&self) -> bool {
        self.cash_discrepancy.is_zero() && self.card_discrepancy.is_zero()
    }
}
