//! Close-out document sent to the backend on submission.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::recuento::CountMode;
use crate::shift::Shift;
use crate::state::TillState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub shift: Shift,
    pub date: String,
    pub time: String,
    pub recuento: RecuentoPayload,
    pub gastos: GastosPayload,
    pub cierre: CierrePayload,
    pub attachments: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecuentoPayload {
    pub mode: CountMode,
    pub total: Decimal,
    /// Count per denomination label; itemized mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, u32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GastosPayload {
    pub withdrawal: Decimal,
    pub expenses: Vec<ExpensePayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePayload {
    pub id: u32,
    pub category: String,
    pub amount: Decimal,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CierrePayload {
    pub card_total: Decimal,
    pub card_close: Decimal,
    pub tips: Decimal,
    pub card_discrepancy: Decimal,
    pub opening_value: Decimal,
    pub sales: Decimal,
    pub cash_income: Decimal,
    pub total_expenses: Decimal,
    pub expected_total: Decimal,
    pub recuento_total: Decimal,
    pub cash_discrepancy: Decimal,
}

impl SubmissionPayload {
    /// Snapshot the current state, derived figures included.
    pub fn from_state(state: &TillState) -> Self {
        let summary = state.summary();
        let closing = &state.closing;

        let details = match state.recuento.mode {
            CountMode::Itemized => Some(
                state
                    .recuento
                    .ledger
                    .lines()
                    .map(|(d, count)| (d.label().to_string(), count))
                    .collect(),
            ),
            CountMode::Aggregate => None,
        };

        Self {
            shift: state.context.shift,
            date: state.context.date.clone(),
            time: state.context.time.clone(),
            recuento: RecuentoPayload {
                mode: state.recuento.mode,
                total: summary.recuento_total,
                details,
            },
            gastos: GastosPayload {
                withdrawal: state.gastos.withdrawal.value(),
                expenses: state
                    .gastos
                    .items()
                    .iter()
                    .map(|e| ExpensePayload {
                        id: e.id,
                        category: e.category.clone(),
                        amount: e.amount.value(),
                        details: e.details.clone(),
                    })
                    .collect(),
            },
            cierre: CierrePayload {
                card_total: closing.card_total.value(),
                card_close: closing.card_close.value(),
                tips: closing.tips.value(),
                card_discrepancy: summary.card_discrepancy,
                opening_value: closing.opening_value,
                sales: closing.sales.value(),
                cash_income: closing.cash_income.value(),
                total_expenses: summary.total_expenses,
                expected_total: summary.expected_total,
                recuento_total: summary.recuento_total,
                cash_discrepancy: summary.cash_discrepancy,
            },
            attachments: state.attachments.ids(),
        }
    }
}
