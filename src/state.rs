//! Application state and the reducer that drives it.
//!
//! All close-out data lives in one [`TillState`]. Every user action and every
//! async completion is an [`Action`]; [`reduce`] turns the current state and
//! one action into the next state plus the [`Effect`]s the caller must run
//! (fetches, submission). The reducer itself never performs I/O.
//!
//! Key rules enforced here:
//! - **Edits only while idle**: form actions are ignored while a dialog or a
//!   submission is pending, so a payload in flight always matches the form.
//! - **Generation-tagged opening value**: every shift change bumps a counter;
//!   an opening value loaded under an older generation is dropped.
//! - **No data loss**: only an acknowledged success clears entered figures.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::attachments::Attachments;
use crate::closing::{ClosingField, ClosingFigures, ClosingSummary};
use crate::denominations::Denomination;
use crate::expenses::{default_categories, ExpenseField, ExpenseLedger};
use crate::money::clamp_amount;
use crate::payload::SubmissionPayload;
use crate::recuento::{CashCount, CountMode};
use crate::shift::{Shift, ShiftContext};
use crate::validation::{self, FormErrors};
use crate::workflow::{next_phase, Discrepancies, WorkflowEvent, WorkflowPhase};

/// Bookkeeping for the opening-value fetch of the selected shift.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpeningFetch {
    pub generation: u64,
    pub pending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TillState {
    pub context: ShiftContext,
    pub opening: OpeningFetch,
    pub recuento: CashCount,
    pub gastos: ExpenseLedger,
    pub closing: ClosingFigures,
    pub attachments: Attachments,
    pub categories: Vec<String>,
    pub errors: FormErrors,
    pub phase: WorkflowPhase,
}

impl Default for TillState {
    fn default() -> Self {
        Self {
            context: ShiftContext::default(),
            opening: OpeningFetch::default(),
            recuento: CashCount::default(),
            gastos: ExpenseLedger::default(),
            closing: ClosingFigures::default(),
            attachments: Attachments::default(),
            categories: default_categories(),
            errors: FormErrors::default(),
            phase: WorkflowPhase::Idle,
        }
    }
}

impl TillState {
    /// Fresh state for `shift`, with the fetches it needs to get going.
    pub fn open(shift: Shift, now: NaiveDateTime) -> Transition {
        let state = Self {
            context: ShiftContext::new(shift, now),
            opening: OpeningFetch {
                generation: 1,
                pending: true,
            },
            ..Default::default()
        };
        Transition {
            state,
            effects: vec![
                Effect::FetchOpeningValue {
                    shift,
                    generation: 1,
                },
                Effect::FetchCategories,
            ],
            phases: Vec::new(),
        }
    }

    pub fn recuento_total(&self) -> Decimal {
        self.recuento.total()
    }

    pub fn total_expenses(&self) -> Decimal {
        self.gastos.total_expenses()
    }

    pub fn expected_total(&self) -> Decimal {
        crate::closing::expected_total(&self.closing, &self.gastos)
    }

    pub fn cash_discrepancy(&self) -> Decimal {
        crate::closing::cash_discrepancy(&self.recuento, &self.closing, &self.gastos)
    }

    pub fn card_discrepancy(&self) -> Decimal {
        crate::closing::card_discrepancy(&self.closing)
    }

    pub fn summary(&self) -> ClosingSummary {
        ClosingSummary::derive(&self.recuento, &self.gastos, &self.closing)
    }

    /// Back to an empty close-out. Shift, clock and opening value are kept.
    fn reset(&mut self) {
        self.recuento.reset();
        self.gastos.reset();
        self.closing.reset_entered();
        self.attachments.clear();
        self.errors = FormErrors::default();
    }
}

// ---------------------------------------------------------------------------
// Actions and effects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SelectShift(Shift),
    /// `value` is `None` when the fetch failed.
    OpeningValueLoaded {
        generation: u64,
        value: Option<Decimal>,
    },
    CategoriesLoaded(Vec<String>),
    ClockTick(NaiveDateTime),
    SetCountMode(CountMode),
    SetDenominationCount(Denomination, String),
    SetAggregateCount(String),
    SetWithdrawal(String),
    AddExpense,
    RemoveExpense(u32),
    UpdateExpense(u32, ExpenseField),
    SetClosingFigure(ClosingField, String),
    AddAttachment(String),
    RemoveAttachment(u32),
    Submit,
    AcknowledgeErrors,
    CancelSubmit,
    ConfirmSubmit,
    SubmissionFinished(Result<(), String>),
    AcknowledgeSuccess,
}

impl Action {
    /// Actions that change what the cashier has entered.
    fn is_edit(&self) -> bool {
        matches!(
            self,
            Action::SelectShift(_)
                | Action::SetCountMode(_)
                | Action::SetDenominationCount(..)
                | Action::SetAggregateCount(_)
                | Action::SetWithdrawal(_)
                | Action::AddExpense
                | Action::RemoveExpense(_)
                | Action::UpdateExpense(..)
                | Action::SetClosingFigure(..)
                | Action::AddAttachment(_)
                | Action::RemoveAttachment(_)
        )
    }
}

/// Side effects requested by the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchOpeningValue { shift: Shift, generation: u64 },
    FetchCategories,
    Submit(Box<SubmissionPayload>),
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub state: TillState,
    pub effects: Vec<Effect>,
    /// Workflow phases entered while handling the action, in order.
    pub phases: Vec<WorkflowPhase>,
}

// ---------------------------------------------------------------------------
// Reducer
// ---------------------------------------------------------------------------

/// Apply one action to `state`.
pub fn reduce(state: TillState, action: Action) -> Transition {
    let mut step = Step {
        state,
        effects: Vec::new(),
        phases: Vec::new(),
    };

    if action.is_edit() && !step.state.phase.accepts_edits() {
        debug!(
            phase = step.state.phase.name(),
            action = ?action,
            "Ignoring form edit while workflow is busy"
        );
        return step.finish();
    }

    match action {
        Action::SelectShift(shift) => step.select_shift(shift),
        Action::OpeningValueLoaded { generation, value } => {
            step.opening_value_loaded(generation, value)
        }
        Action::CategoriesLoaded(categories) => {
            if categories.is_empty() {
                debug!("Empty category list received, keeping current catalogue");
            } else {
                step.state.categories = categories;
            }
        }
        Action::ClockTick(now) => step.state.context.stamp(now),
        Action::SetCountMode(mode) => step.state.recuento.set_mode(mode),
        Action::SetDenominationCount(denomination, raw) => {
            step.state.recuento.set_count(denomination, &raw)
        }
        Action::SetAggregateCount(raw) => step.state.recuento.set_aggregate(raw),
        Action::SetWithdrawal(raw) => step.state.gastos.set_withdrawal(raw),
        Action::AddExpense => {
            step.state.gastos.add_item();
        }
        Action::RemoveExpense(id) => {
            if !step.state.gastos.remove_item(id) {
                debug!(expense_id = id, "Remove ignored, no such expense");
            }
        }
        Action::UpdateExpense(id, field) => {
            if !step.state.gastos.update_item(id, field) {
                debug!(expense_id = id, "Update ignored, no such expense");
            }
        }
        Action::SetClosingFigure(field, raw) => step.state.closing.set(field, raw),
        Action::AddAttachment(name) => {
            let id = step.state.attachments.add(name);
            debug!(attachment_id = id, "Attachment added");
        }
        Action::RemoveAttachment(id) => {
            step.state.attachments.remove(id);
        }
        Action::Submit => step.submit(),
        Action::AcknowledgeErrors => {
            if step.state.phase == WorkflowPhase::ErrorShown {
                step.advance(WorkflowEvent::Acknowledged);
            }
        }
        Action::CancelSubmit => {
            if step.advance(WorkflowEvent::Cancelled) {
                info!("Close-out submission cancelled at discrepancy prompt");
            }
        }
        Action::ConfirmSubmit => {
            if step.advance(WorkflowEvent::Confirmed) {
                step.begin_submission();
            }
        }
        Action::SubmissionFinished(result) => step.submission_finished(result),
        Action::AcknowledgeSuccess => {
            if step.state.phase == WorkflowPhase::SuccessShown
                && step.advance(WorkflowEvent::Acknowledged)
            {
                step.state.reset();
                info!(shift = %step.state.context.shift, "Close-out form reset");
            }
        }
    }

    step.finish()
}

struct Step {
    state: TillState,
    effects: Vec<Effect>,
    phases: Vec<WorkflowPhase>,
}

impl Step {
    fn finish(self) -> Transition {
        Transition {
            state: self.state,
            effects: self.effects,
            phases: self.phases,
        }
    }

    /// Move the workflow along; false (and nothing changes) if `event` is not
    /// valid in the current phase.
    fn advance(&mut self, event: WorkflowEvent) -> bool {
        match next_phase(self.state.phase, event) {
            Some(next) => {
                debug!(from = self.state.phase.name(), to = next.name(), "Workflow transition");
                self.state.phase = next;
                self.phases.push(next);
                true
            }
            None => {
                debug!(
                    phase = self.state.phase.name(),
                    event = ?event,
                    "Workflow event ignored"
                );
                false
            }
        }
    }

    fn select_shift(&mut self, shift: Shift) {
        if self.state.context.shift == shift {
            return;
        }
        self.state.context.shift = shift;
        self.state.opening.generation += 1;
        self.state.opening.pending = true;
        self.state.closing.opening_value = Decimal::ZERO;
        info!(
            shift = %shift,
            generation = self.state.opening.generation,
            "Shift changed, refetching opening value"
        );
        self.effects.push(Effect::FetchOpeningValue {
            shift,
            generation: self.state.opening.generation,
        });
        self.effects.push(Effect::FetchCategories);
    }

    fn opening_value_loaded(&mut self, generation: u64, value: Option<Decimal>) {
        if generation != self.state.opening.generation {
            debug!(
                generation,
                current = self.state.opening.generation,
                "Discarding stale opening value"
            );
            return;
        }
        let value = value.map(clamp_amount).unwrap_or(Decimal::ZERO);
        self.state.closing.opening_value = value;
        self.state.opening.pending = false;
        info!(
            shift = %self.state.context.shift,
            opening_value = %value,
            "Opening value set"
        );
    }

    fn submit(&mut self) {
        if !self.advance(WorkflowEvent::SubmitRequested) {
            return;
        }

        self.state.errors = validation::validate(&self.state);
        if !self.state.errors.is_empty() {
            let fields: Vec<String> = self.state.errors.iter().map(|f| f.to_string()).collect();
            info!(fields = ?fields, "Close-out incomplete");
            self.advance(WorkflowEvent::ValidationFailed);
            return;
        }

        let summary = self.state.summary();
        if summary.is_balanced() {
            self.advance(WorkflowEvent::Balanced);
            self.begin_submission();
        } else {
            let discrepancies = Discrepancies {
                cash: summary.cash_discrepancy,
                card: summary.card_discrepancy,
            };
            info!(
                cash = %discrepancies.cash,
                card = %discrepancies.card,
                "Close-out has a discrepancy, awaiting confirmation"
            );
            self.advance(WorkflowEvent::DiscrepancyFound(discrepancies));
        }
    }

    fn begin_submission(&mut self) {
        let payload = SubmissionPayload::from_state(&self.state);
        info!(
            shift = %payload.shift,
            expected_total = %payload.cierre.expected_total,
            recuento_total = %payload.cierre.recuento_total,
            "Submitting close-out"
        );
        self.effects.push(Effect::Submit(Box::new(payload)));
    }

    fn submission_finished(&mut self, result: Result<(), String>) {
        match result {
            Ok(()) => {
                if self.advance(WorkflowEvent::SubmissionSucceeded) {
                    info!(shift = %self.state.context.shift, "Close-out submitted");
                }
            }
            Err(e) => {
                if self.advance(WorkflowEvent::SubmissionFailed) {
                    warn!(error = %e, "Close-out submission failed, form left intact");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FormField;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(22, 30, 0)
            .unwrap()
    }

    fn apply(state: TillState, actions: Vec<Action>) -> TillState {
        actions
            .into_iter()
            .fold(state, |state, action| reduce(state, action).state)
    }

    /// Complete, balanced close-out: opening 100, sales 50, 150 counted,
    /// card 80 + tips 5 = terminal 85, one attachment.
    fn balanced_state() -> TillState {
        let opened = TillState::open(Shift::Night, now());
        apply(
            opened.state,
            vec![
                Action::OpeningValueLoaded {
                    generation: 1,
                    value: Some(dec!(100)),
                },
                Action::SetDenominationCount(Denomination::Bill100, "1".into()),
                Action::SetDenominationCount(Denomination::Bill50, "1".into()),
                Action::SetClosingFigure(ClosingField::Sales, "50".into()),
                Action::SetClosingFigure(ClosingField::CardTotal, "80".into()),
                Action::SetClosingFigure(ClosingField::Tips, "5".into()),
                Action::SetClosingFigure(ClosingField::CardClose, "85".into()),
                Action::AddAttachment("datafono.jpg".into()),
            ],
        )
    }

    #[test]
    fn test_open_requests_initial_fetches() {
        let opened = TillState::open(Shift::Morning, now());
        assert_eq!(opened.state.context.date, "16-Oct-2026");
        assert!(opened.state.opening.pending);
        assert_eq!(
            opened.effects,
            vec![
                Effect::FetchOpeningValue {
                    shift: Shift::Morning,
                    generation: 1
                },
                Effect::FetchCategories,
            ]
        );
    }

    #[test]
    fn test_balanced_submit_skips_confirmation() {
        let state = balanced_state();
        assert_eq!(state.cash_discrepancy(), Decimal::ZERO);
        assert_eq!(state.card_discrepancy(), Decimal::ZERO);

        let t = reduce(state, Action::Submit);
        assert_eq!(
            t.phases,
            vec![WorkflowPhase::Validating, WorkflowPhase::Submitting]
        );
        assert_eq!(t.effects.len(), 1);
        assert!(matches!(t.effects[0], Effect::Submit(_)));

        let t = reduce(t.state, Action::SubmissionFinished(Ok(())));
        assert_eq!(t.phases, vec![WorkflowPhase::SuccessShown]);
    }

    #[test]
    fn test_incomplete_form_shows_errors_and_keeps_data() {
        let state = apply(
            TillState::default(),
            vec![
                Action::SetClosingFigure(ClosingField::CardClose, "10".into()),
                Action::SetClosingFigure(ClosingField::Sales, "20".into()),
            ],
        );
        let t = reduce(state, Action::Submit);
        assert_eq!(
            t.phases,
            vec![WorkflowPhase::Validating, WorkflowPhase::ErrorShown]
        );
        assert!(t.effects.is_empty());
        assert!(t.state.errors.contains(FormField::CardTotal));
        assert!(t.state.errors.contains(FormField::Attachments));
        assert_eq!(t.state.errors.len(), 2);

        let before = t.state.clone();
        let t = reduce(t.state, Action::AcknowledgeErrors);
        assert_eq!(t.state.phase, WorkflowPhase::Idle);
        assert_eq!(t.state.closing, before.closing);
        assert_eq!(t.state.errors, before.errors);
    }

    #[test]
    fn test_errors_are_recomputed_not_accumulated() {
        let state = apply(
            TillState::default(),
            vec![Action::Submit, Action::AcknowledgeErrors],
        );
        assert_eq!(state.errors.len(), 4);

        let state = apply(
            state,
            vec![
                Action::SetClosingFigure(ClosingField::CardTotal, "1".into()),
                Action::SetClosingFigure(ClosingField::CardClose, "1".into()),
                Action::SetClosingFigure(ClosingField::Sales, "1".into()),
                Action::Submit,
            ],
        );
        assert_eq!(state.phase, WorkflowPhase::ErrorShown);
        assert_eq!(state.errors.iter().collect::<Vec<_>>(), vec![FormField::Attachments]);
    }

    #[test]
    fn test_card_discrepancy_prompt_cancel_and_confirm() {
        let state = apply(
            balanced_state(),
            vec![Action::SetClosingFigure(ClosingField::CardClose, "90".into())],
        );

        let t = reduce(state, Action::Submit);
        let prompt = WorkflowPhase::DiscrepancyConfirm(Discrepancies {
            cash: Decimal::ZERO,
            card: dec!(5),
        });
        assert_eq!(t.phases, vec![WorkflowPhase::Validating, prompt]);
        assert!(t.effects.is_empty());

        let before = t.state.clone();
        let t = reduce(t.state, Action::CancelSubmit);
        assert_eq!(t.state.phase, WorkflowPhase::Idle);
        assert!(t.effects.is_empty());
        assert_eq!(t.state.closing, before.closing);
        assert_eq!(t.state.recuento, before.recuento);
        assert_eq!(t.state.attachments, before.attachments);

        let t = reduce(t.state, Action::Submit);
        assert_eq!(t.state.phase, prompt);
        let t = reduce(t.state, Action::ConfirmSubmit);
        assert_eq!(t.phases, vec![WorkflowPhase::Submitting]);
        match &t.effects[..] {
            [Effect::Submit(payload)] => {
                assert_eq!(payload.cierre.card_discrepancy, dec!(5));
            }
            other => panic!("unexpected effects: {other:?}"),
        }
    }

    #[test]
    fn test_submit_is_not_reentrant() {
        let t = reduce(balanced_state(), Action::Submit);
        assert_eq!(t.state.phase, WorkflowPhase::Submitting);

        let again = reduce(t.state, Action::Submit);
        assert!(again.phases.is_empty());
        assert!(again.effects.is_empty());
        assert_eq!(again.state.phase, WorkflowPhase::Submitting);
    }

    #[test]
    fn test_edits_ignored_while_submitting() {
        let t = reduce(balanced_state(), Action::Submit);
        let before = t.state.clone();
        let state = apply(
            t.state,
            vec![
                Action::SetClosingFigure(ClosingField::Sales, "999".into()),
                Action::AddExpense,
                Action::SelectShift(Shift::Morning),
            ],
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_failed_submission_returns_to_form_intact() {
        let t = reduce(balanced_state(), Action::Submit);
        let before = t.state.clone();
        let t = reduce(
            t.state,
            Action::SubmissionFinished(Err("Connection refused".into())),
        );
        assert_eq!(t.phases, vec![WorkflowPhase::Idle]);
        assert_eq!(t.state.recuento, before.recuento);
        assert_eq!(t.state.closing, before.closing);
        assert_eq!(t.state.attachments, before.attachments);

        // Resubmitting is the retry.
        let t = reduce(t.state, Action::Submit);
        assert_eq!(t.state.phase, WorkflowPhase::Submitting);
    }

    #[test]
    fn test_acknowledged_success_resets_form() {
        let state = apply(
            balanced_state(),
            vec![
                Action::SetWithdrawal("10".into()),
                Action::AddExpense,
                Action::SetAggregateCount("7".into()),
                Action::SetClosingFigure(ClosingField::CashIncome, "10".into()),
            ],
        );
        let state = apply(
            state,
            vec![
                Action::Submit,
                Action::SubmissionFinished(Ok(())),
                Action::AcknowledgeSuccess,
            ],
        );

        assert_eq!(state.phase, WorkflowPhase::Idle);
        assert!(state.recuento.ledger.is_empty());
        assert!(state.recuento.aggregate.is_zero());
        assert_eq!(state.gastos, ExpenseLedger::default());
        assert_eq!(state.gastos.items()[0].id, 1);
        assert!(state.attachments.is_empty());
        assert!(state.closing.sales.is_zero());
        assert!(state.closing.card_close.is_zero());
        assert!(state.errors.is_empty());
        assert_eq!(state.context.shift, Shift::Night);
        assert_eq!(state.closing.opening_value, dec!(100));
    }

    #[test]
    fn test_success_needs_acknowledgment() {
        let state = apply(
            balanced_state(),
            vec![Action::Submit, Action::SubmissionFinished(Ok(()))],
        );
        assert_eq!(state.phase, WorkflowPhase::SuccessShown);

        // Acknowledging errors is not the same answer.
        let state = apply(state, vec![Action::AcknowledgeErrors, Action::Submit]);
        assert_eq!(state.phase, WorkflowPhase::SuccessShown);
        assert_eq!(state.attachments.len(), 1);
    }

    #[test]
    fn test_shift_change_invalidates_opening_value() {
        let state = balanced_state();
        assert_eq!(state.closing.opening_value, dec!(100));

        let t = reduce(state, Action::SelectShift(Shift::Afternoon));
        assert_eq!(t.state.opening.generation, 2);
        assert!(t.state.opening.pending);
        assert_eq!(t.state.closing.opening_value, Decimal::ZERO);
        assert_eq!(
            t.effects,
            vec![
                Effect::FetchOpeningValue {
                    shift: Shift::Afternoon,
                    generation: 2
                },
                Effect::FetchCategories,
            ]
        );

        // Same shift again: nothing to refetch.
        let again = reduce(t.state, Action::SelectShift(Shift::Afternoon));
        assert!(again.effects.is_empty());
        assert_eq!(again.state.opening.generation, 2);
    }

    #[test]
    fn test_stale_opening_value_is_discarded() {
        let state = apply(
            TillState::open(Shift::Night, now()).state,
            vec![
                Action::SelectShift(Shift::Morning),
                Action::SelectShift(Shift::Afternoon),
                Action::OpeningValueLoaded {
                    generation: 3,
                    value: Some(dec!(300)),
                },
                Action::OpeningValueLoaded {
                    generation: 2,
                    value: Some(dec!(200)),
                },
            ],
        );
        assert_eq!(state.closing.opening_value, dec!(300));
        assert!(!state.opening.pending);
    }

    #[test]
    fn test_failed_opening_fetch_defaults_to_zero() {
        let state = apply(
            TillState::open(Shift::Night, now()).state,
            vec![Action::OpeningValueLoaded {
                generation: 1,
                value: None,
            }],
        );
        assert_eq!(state.closing.opening_value, Decimal::ZERO);
        assert!(!state.opening.pending);
    }

    #[test]
    fn test_out_of_range_opening_value_reads_as_zero() {
        let huge: Decimal = "70000000000000000000000000000".parse().unwrap();
        let state = apply(
            TillState::open(Shift::Night, now()).state,
            vec![
                Action::OpeningValueLoaded {
                    generation: 1,
                    value: Some(huge),
                },
                Action::SetClosingFigure(ClosingField::Sales, huge.to_string()),
                Action::SetClosingFigure(ClosingField::CashIncome, huge.to_string()),
                Action::Submit,
            ],
        );
        assert_eq!(state.closing.opening_value, Decimal::ZERO);
        assert_eq!(state.expected_total(), Decimal::ZERO);
        assert_eq!(state.phase, WorkflowPhase::ErrorShown);
    }

    #[test]
    fn test_categories_and_clock() {
        let later = NaiveDate::from_ymd_opt(2026, 10, 17)
            .unwrap()
            .and_hms_opt(0, 1, 0)
            .unwrap();
        let state = apply(
            TillState::open(Shift::Night, now()).state,
            vec![
                Action::CategoriesLoaded(vec!["Limpieza".into()]),
                Action::CategoriesLoaded(vec![]),
                Action::ClockTick(later),
            ],
        );
        assert_eq!(state.categories, vec!["Limpieza".to_string()]);
        assert_eq!(state.context.date, "17-Oct-2026");
        assert_eq!(state.context.time, "00:01");
    }
}
