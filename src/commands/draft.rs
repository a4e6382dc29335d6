//! Close-out drafts: a JSON snapshot of what the cashier entered, replayed
//! into a session as form actions.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::closing::ClosingField;
use crate::denominations::Denomination;
use crate::expenses::ExpenseField;
use crate::recuento::CountMode;
use crate::shift::Shift;
use crate::state::Action;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosingDraft {
    #[serde(default, alias = "turno")]
    pub shift: Option<Shift>,
    #[serde(default, alias = "count_mode", alias = "mode")]
    pub count_mode: Option<CountMode>,
    /// Denomination label (`"0.05"`, `"20"`, ...) to piece count.
    #[serde(default, alias = "details")]
    pub denominations: BTreeMap<String, Value>,
    #[serde(default, alias = "aggregate_total", alias = "total")]
    pub aggregate: Option<Value>,
    #[serde(default, alias = "retiro")]
    pub withdrawal: Option<Value>,
    #[serde(default, alias = "gastos")]
    pub expenses: Vec<DraftExpense>,
    #[serde(default)]
    pub sales: Option<Value>,
    #[serde(default, alias = "cash_income")]
    pub cash_income: Option<Value>,
    #[serde(default, alias = "card_total")]
    pub card_total: Option<Value>,
    #[serde(default, alias = "card_close")]
    pub card_close: Option<Value>,
    #[serde(default)]
    pub tips: Option<Value>,
    /// Attachment file names.
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftExpense {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub details: String,
}

pub fn parse_closing_draft(text: &str) -> Result<ClosingDraft, String> {
    serde_json::from_str(text).map_err(|e| format!("Invalid close-out draft: {e}"))
}

/// Raw text the cashier would have typed. Numbers keep their JSON spelling;
/// anything that is not a number or string becomes empty (which reads as 0).
fn raw_input(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

impl ClosingDraft {
    pub fn shift(&self) -> Shift {
        self.shift.unwrap_or_default()
    }

    /// Form actions reproducing this draft on a freshly opened session.
    ///
    /// Expense ids assume the ledger still holds only its initial item (id 1),
    /// which is how a new session starts.
    pub fn into_actions(&self) -> Result<Vec<Action>, String> {
        let mut actions = Vec::new();

        if let Some(mode) = self.count_mode {
            actions.push(Action::SetCountMode(mode));
        }
        for (label, count) in &self.denominations {
            let denomination = Denomination::from_label(label)
                .ok_or_else(|| format!("Unknown denomination: {label}"))?;
            actions.push(Action::SetDenominationCount(denomination, raw_input(count)));
        }
        if let Some(aggregate) = &self.aggregate {
            actions.push(Action::SetAggregateCount(raw_input(aggregate)));
        }
        if let Some(withdrawal) = &self.withdrawal {
            actions.push(Action::SetWithdrawal(raw_input(withdrawal)));
        }

        for (index, expense) in self.expenses.iter().enumerate() {
            if index > 0 {
                actions.push(Action::AddExpense);
            }
            let id = index as u32 + 1;
            actions.push(Action::UpdateExpense(
                id,
                ExpenseField::Category(expense.category.trim().to_string()),
            ));
            if let Some(amount) = &expense.amount {
                actions.push(Action::UpdateExpense(
                    id,
                    ExpenseField::Amount(raw_input(amount)),
                ));
            }
            if !expense.details.is_empty() {
                actions.push(Action::UpdateExpense(
                    id,
                    ExpenseField::Details(expense.details.clone()),
                ));
            }
        }

        for (field, value) in [
            (ClosingField::Sales, &self.sales),
            (ClosingField::CashIncome, &self.cash_income),
            (ClosingField::CardTotal, &self.card_total),
            (ClosingField::CardClose, &self.card_close),
            (ClosingField::Tips, &self.tips),
        ] {
            if let Some(value) = value {
                actions.push(Action::SetClosingFigure(field, raw_input(value)));
            }
        }

        for name in &self.attachments {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            actions.push(Action::AddAttachment(name.to_string()));
        }

        Ok(actions)
    }
}
