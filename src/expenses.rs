//! Expense ledger ("gastos"): a cash withdrawal plus itemized outflows.
//!
//! Items are created empty and filled in field by field. Amounts stay as
//! typed; an amount that does not parse contributes nothing to the total.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::AmountInput;

/// Categories offered when the backend has none to give.
pub const DEFAULT_EXPENSE_CATEGORIES: &[&str] =
    &["Productos", "Material", "Servicios", "Proveedores", "Otros"];

/// Selector value for a free-text category outside the catalogue.
pub const CUSTOM_CATEGORY: &str = "custom";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseItem {
    pub id: u32,
    /// Empty until the cashier picks one.
    pub category: String,
    pub amount: AmountInput,
    pub details: String,
}

impl ExpenseItem {
    fn empty(id: u32) -> Self {
        Self {
            id,
            category: String::new(),
            amount: AmountInput::default(),
            details: String::new(),
        }
    }
}

/// One editable field of an [`ExpenseItem`], carrying its new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseField {
    Category(String),
    Amount(String),
    Details(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseLedger {
    pub withdrawal: AmountInput,
    items: Vec<ExpenseItem>,
}

impl Default for ExpenseLedger {
    /// A fresh ledger holds one empty item with id 1.
    fn default() -> Self {
        Self {
            withdrawal: AmountInput::default(),
            items: vec![ExpenseItem::empty(1)],
        }
    }
}

impl ExpenseLedger {
    pub fn items(&self) -> &[ExpenseItem] {
        &self.items
    }

    pub fn item(&self, id: u32) -> Option<&ExpenseItem> {
        self.items.iter().find(|e| e.id == id)
    }

    pub fn set_withdrawal(&mut self, raw: impl Into<String>) {
        self.withdrawal = AmountInput::new(raw);
    }

    /// Append an empty item and return its id (current max + 1, or 1).
    pub fn add_item(&mut self) -> u32 {
        let id = self.next_id();
        self.items.push(ExpenseItem::empty(id));
        id
    }

    /// Remove the item with `id`. Removing the last item leaves the ledger empty.
    pub fn remove_item(&mut self, id: u32) -> bool {
        let before = self.items.len();
        self.items.retain(|e| e.id != id);
        self.items.len() != before
    }

    /// Apply one field edit. Returns false when no item has `id`.
    pub fn update_item(&mut self, id: u32, field: ExpenseField) -> bool {
        let Some(item) = self.items.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        match field {
            ExpenseField::Category(category) => item.category = category,
            ExpenseField::Amount(raw) => item.amount = AmountInput::new(raw),
            ExpenseField::Details(details) => item.details = details,
        }
        true
    }

    /// Σ of item amounts, unparsable amounts counted as 0.
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(|e| e.amount.value()).sum()
    }

    /// Withdrawal plus every itemized expense.
    pub fn total_expenses(&self) -> Decimal {
        self.withdrawal.value() + self.items_total()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn next_id(&self) -> u32 {
        self.items.iter().map(|e| e.id).max().map_or(1, |max| max + 1)
    }
}

/// True when `category` is neither empty, a catalogue entry, nor the custom marker.
pub fn is_free_text_category(category: &str, catalogue: &[String]) -> bool {
    !category.is_empty() && category != CUSTOM_CATEGORY && !catalogue.iter().any(|c| c == category)
}

pub fn default_categories() -> Vec<String> {
    DEFAULT_EXPENSE_CATEGORIES
        .iter()
        .map(|c| c.to_string())
        .collect()
}
