//! Submission workflow state machine.
//!
//! ```text
//! Idle -> Validating -> ErrorShown ---------------(ack)------> Idle
//!                    -> DiscrepancyConfirm -(cancel)---------> Idle
//!                                          -(confirm)-> Submitting
//!                    -> Submitting -(ok)--> SuccessShown -(ack)-> Idle
//!                                  -(failed)-------------------> Idle
//! ```
//!
//! Completeness is always checked before balance, and a balance mismatch
//! never blocks on its own: it waits for an explicit confirm or cancel.
//! The table in [`next_phase`] is the only place transitions are defined;
//! anything it does not list is rejected.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::money::format_amount;

/// Both discrepancy values shown in the confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancies {
    pub cash: Decimal,
    pub card: Decimal,
}

impl Discrepancies {
    pub fn describe(&self) -> String {
        format!(
            "cash {} / card {}",
            format_amount(self.cash),
            format_amount(self.card)
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum WorkflowPhase {
    #[default]
    Idle,
    Validating,
    ErrorShown,
    DiscrepancyConfirm(Discrepancies),
    Submitting,
    SuccessShown,
}

impl WorkflowPhase {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowPhase::Idle => "idle",
            WorkflowPhase::Validating => "validating",
            WorkflowPhase::ErrorShown => "error_shown",
            WorkflowPhase::DiscrepancyConfirm(_) => "discrepancy_confirm",
            WorkflowPhase::Submitting => "submitting",
            WorkflowPhase::SuccessShown => "success_shown",
        }
    }

    /// Form edits are only accepted while no dialog or submission is pending.
    pub fn accepts_edits(&self) -> bool {
        matches!(self, WorkflowPhase::Idle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEvent {
    SubmitRequested,
    ValidationFailed,
    DiscrepancyFound(Discrepancies),
    Balanced,
    Acknowledged,
    Cancelled,
    Confirmed,
    SubmissionSucceeded,
    SubmissionFailed,
}

/// Transition table. `None` means the event is not valid in `phase`.
pub fn next_phase(phase: WorkflowPhase, event: WorkflowEvent) -> Option<WorkflowPhase> {
    use WorkflowEvent as E;
    use WorkflowPhase as P;

    match (phase, event) {
        (P::Idle, E::SubmitRequested) => Some(P::Validating),
        (P::Validating, E::ValidationFailed) => Some(P::ErrorShown),
        (P::Validating, E::DiscrepancyFound(d)) => Some(P::DiscrepancyConfirm(d)),
        (P::Validating, E::Balanced) => Some(P::Submitting),
        (P::ErrorShown, E::Acknowledged) => Some(P::Idle),
        (P::DiscrepancyConfirm(_), E::Cancelled) => Some(P::Idle),
        (P::DiscrepancyConfirm(_), E::Confirmed) => Some(P::Submitting),
        (P::Submitting, E::SubmissionSucceeded) => Some(P::SuccessShown),
        (P::Submitting, E::SubmissionFailed) => Some(P::Idle),
        (P::SuccessShown, E::Acknowledged) => Some(P::Idle),
        _ => None,
    }
}
