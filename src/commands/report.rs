//! Plain-text close-out report, two decimals throughout.

use std::fmt::Write as _;

use rust_decimal::Decimal;

use crate::denominations::{Denomination, DenominationKind};
use crate::expenses::is_free_text_category;
use crate::money::format_amount;
use crate::recuento::CountMode;
use crate::state::TillState;
use crate::validation::FormErrors;

const LABEL_WIDTH: usize = 22;
const VALUE_WIDTH: usize = 12;

fn amount_line(out: &mut String, label: &str, value: Decimal) {
    let _ = writeln!(
        out,
        "{:<lw$}{:>vw$}",
        label,
        format_amount(value),
        lw = LABEL_WIDTH,
        vw = VALUE_WIDTH
    );
}

fn denomination_lines(out: &mut String, state: &TillState, kind: DenominationKind, title: &str) {
    let lines: Vec<(Denomination, u32)> = state
        .recuento
        .ledger
        .lines_of(kind)
        .filter(|(_, count)| *count > 0)
        .collect();
    if lines.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {title}");
    for (denomination, count) in lines {
        let _ = writeln!(
            out,
            "    {:>6} x {:<5}{:>11}",
            denomination.label(),
            count,
            format_amount(state.recuento.ledger.line_total(denomination))
        );
    }
    amount_line(
        out,
        &format!("  {title} subtotal"),
        state.recuento.ledger.subtotal_of(kind),
    );
}

pub fn render_report(state: &TillState) -> String {
    let summary = state.summary();
    let closing = &state.closing;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Till close-out: {} {} {}",
        state.context.shift, state.context.date, state.context.time
    );
    let _ = writeln!(out);

    match state.recuento.mode {
        CountMode::Itemized => {
            let _ = writeln!(out, "Cash count (itemized)");
            denomination_lines(&mut out, state, DenominationKind::Coin, "Coins");
            denomination_lines(&mut out, state, DenominationKind::Bill, "Bills");
        }
        CountMode::Aggregate => {
            let _ = writeln!(out, "Cash count (single figure)");
        }
    }
    amount_line(&mut out, "Counted", summary.recuento_total);
    let _ = writeln!(out);

    let _ = writeln!(out, "Expenses");
    amount_line(&mut out, "  Withdrawal", state.gastos.withdrawal.value());
    for item in state.gastos.items() {
        if item.category.is_empty() && item.amount.is_zero() && item.details.is_empty() {
            continue;
        }
        let category = if item.category.is_empty() {
            "(no category)".to_string()
        } else if is_free_text_category(&item.category, &state.categories) {
            format!("{} (other)", item.category)
        } else {
            item.category.clone()
        };
        amount_line(&mut out, &format!("  #{} {category}", item.id), item.amount.value());
        if !item.details.is_empty() {
            let _ = writeln!(out, "      {}", item.details);
        }
    }
    amount_line(&mut out, "Total expenses", summary.total_expenses);
    let _ = writeln!(out);

    amount_line(&mut out, "Opening value", closing.opening_value);
    amount_line(&mut out, "Sales", closing.sales.value());
    amount_line(&mut out, "Cash income", closing.cash_income.value());
    amount_line(&mut out, "Expected total", summary.expected_total);
    amount_line(&mut out, "Cash discrepancy", summary.cash_discrepancy);
    let _ = writeln!(out);

    amount_line(&mut out, "Card total", closing.card_total.value());
    amount_line(&mut out, "Tips", closing.tips.value());
    amount_line(&mut out, "Card terminal close", closing.card_close.value());
    amount_line(&mut out, "Card discrepancy", summary.card_discrepancy);
    let _ = writeln!(out);

    let _ = writeln!(out, "Attachments: {}", state.attachments.len());
    for attachment in state.attachments.iter() {
        let _ = writeln!(out, "  [{}] {}", attachment.id, attachment.name);
    }

    out
}

pub fn render_errors(errors: &FormErrors) -> String {
    let fields: Vec<String> = errors.iter().map(|f| f.to_string()).collect();
    format!("Missing required fields: {}", fields.join(", "))
}
