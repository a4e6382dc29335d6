//! Close-out command: replay a draft through a session, report, submit.

pub mod draft;
pub mod report;

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::api::TillBackend;
use crate::session::TillSession;
use crate::state::Action;
use crate::validation::FormErrors;
use crate::workflow::{Discrepancies, WorkflowPhase};

pub use draft::{parse_closing_draft, ClosingDraft, DraftExpense};
pub use report::{render_errors, render_report};

#[derive(Debug, Clone, Copy, Default)]
pub struct CloseOutOptions {
    /// Answer "yes" at the discrepancy prompt.
    pub confirm_discrepancy: bool,
    /// Stop after the report; nothing is submitted.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutOutcome {
    Submitted,
    DryRun,
    Incomplete(FormErrors),
    DiscrepancyDeclined(Discrepancies),
    SubmitFailed,
}

impl CloseOutOutcome {
    /// Process exit code for the command-line driver.
    pub fn exit_code(&self) -> u8 {
        match self {
            CloseOutOutcome::Submitted | CloseOutOutcome::DryRun => 0,
            CloseOutOutcome::Incomplete(_) | CloseOutOutcome::DiscrepancyDeclined(_) => 1,
            CloseOutOutcome::SubmitFailed => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CloseOut {
    pub report: String,
    pub outcome: CloseOutOutcome,
}

/// Open a session for the draft's shift, wait for the opening value, replay
/// the draft and walk the submission workflow to its end.
pub async fn close_out<B: TillBackend + 'static>(
    backend: Arc<B>,
    draft: &ClosingDraft,
    options: CloseOutOptions,
    now: NaiveDateTime,
) -> Result<CloseOut, String> {
    let actions = draft.into_actions()?;

    let mut session = TillSession::new(backend, draft.shift(), now);
    session.settle().await;
    for action in actions {
        session.dispatch(action);
    }

    let report = render_report(session.state());
    if options.dry_run {
        info!(shift = %draft.shift(), "Dry run, close-out not submitted");
        return Ok(CloseOut {
            report,
            outcome: CloseOutOutcome::DryRun,
        });
    }

    session.dispatch(Action::Submit);
    let phase = session.state().phase;
    match phase {
        WorkflowPhase::ErrorShown => {
            let errors = session.state().errors.clone();
            session.dispatch(Action::AcknowledgeErrors);
            return Ok(CloseOut {
                report,
                outcome: CloseOutOutcome::Incomplete(errors),
            });
        }
        WorkflowPhase::DiscrepancyConfirm(discrepancies) => {
            if !options.confirm_discrepancy {
                session.dispatch(Action::CancelSubmit);
                return Ok(CloseOut {
                    report,
                    outcome: CloseOutOutcome::DiscrepancyDeclined(discrepancies),
                });
            }
            info!(discrepancies = %discrepancies.describe(), "Discrepancy confirmed");
            session.dispatch(Action::ConfirmSubmit);
        }
        _ => {}
    }

    session.settle().await;
    let outcome = if session.state().phase == WorkflowPhase::SuccessShown {
        session.dispatch(Action::AcknowledgeSuccess);
        CloseOutOutcome::Submitted
    } else {
        warn!(phase = session.state().phase.name(), "Close-out was not accepted");
        CloseOutOutcome::SubmitFailed
    };

    Ok(CloseOut { report, outcome })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::payload::SubmissionPayload;
    use crate::shift::Shift;
    use crate::validation::FormField;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    struct StubBackend {
        opening: Decimal,
        accept: bool,
        submitted: Mutex<Vec<SubmissionPayload>>,
    }

    impl StubBackend {
        fn new(opening: Decimal, accept: bool) -> Arc<Self> {
            Arc::new(Self {
                opening,
                accept,
                submitted: Mutex::new(Vec::new()),
            })
        }

        fn submissions(&self) -> usize {
            self.submitted.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TillBackend for StubBackend {
        async fn fetch_opening_value(&self, _shift: Shift) -> Result<Decimal, ApiError> {
            Ok(self.opening)
        }

        async fn fetch_expense_categories(&self) -> Result<Vec<String>, ApiError> {
            Err(ApiError::Connect("http://localhost:8080".into()))
        }

        async fn submit_closing(&self, payload: &SubmissionPayload) -> Result<(), ApiError> {
            if !self.accept {
                return Err(ApiError::Rejected);
            }
            self.submitted.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap()
    }

    /// Opening 100 + sales 50 = 150 counted; card 80 + tips 5 = 85.
    fn balanced_draft() -> ClosingDraft {
        parse_closing_draft(
            r#"{
                "shift": "mañana",
                "denominations": { "100": 1, "50": 1 },
                "sales": 50,
                "cardTotal": 80,
                "tips": 5,
                "cardClose": 85,
                "attachments": ["z.jpg"]
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_balanced_draft_is_submitted() {
        let backend = StubBackend::new(dec!(100), true);
        let result = close_out(
            Arc::clone(&backend),
            &balanced_draft(),
            CloseOutOptions::default(),
            now(),
        )
        .await
        .unwrap();

        assert_eq!(result.outcome, CloseOutOutcome::Submitted);
        assert_eq!(result.outcome.exit_code(), 0);
        assert!(result.report.contains("Till close-out: mañana 16-Oct-2026 15:00"));
        assert_eq!(backend.submissions(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_submits_nothing() {
        let backend = StubBackend::new(dec!(100), true);
        let options = CloseOutOptions {
            dry_run: true,
            ..Default::default()
        };
        let result = close_out(Arc::clone(&backend), &balanced_draft(), options, now())
            .await
            .unwrap();
        assert_eq!(result.outcome, CloseOutOutcome::DryRun);
        assert_eq!(backend.submissions(), 0);
    }

    #[tokio::test]
    async fn test_incomplete_draft() {
        let backend = StubBackend::new(dec!(100), true);
        let draft = parse_closing_draft(r#"{ "cardClose": 10, "sales": 20 }"#).unwrap();
        let result = close_out(Arc::clone(&backend), &draft, CloseOutOptions::default(), now())
            .await
            .unwrap();

        match &result.outcome {
            CloseOutOutcome::Incomplete(errors) => {
                assert!(errors.contains(FormField::CardTotal));
                assert!(errors.contains(FormField::Attachments));
                assert_eq!(errors.len(), 2);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(result.outcome.exit_code(), 1);
        assert_eq!(backend.submissions(), 0);
    }

    #[tokio::test]
    async fn test_discrepancy_needs_confirmation() {
        // Opening value 90 leaves 10 more cash than expected.
        let backend = StubBackend::new(dec!(90), true);
        let declined = close_out(
            Arc::clone(&backend),
            &balanced_draft(),
            CloseOutOptions::default(),
            now(),
        )
        .await
        .unwrap();
        assert_eq!(
            declined.outcome,
            CloseOutOutcome::DiscrepancyDeclined(Discrepancies {
                cash: dec!(10),
                card: Decimal::ZERO,
            })
        );
        assert_eq!(backend.submissions(), 0);

        let options = CloseOutOptions {
            confirm_discrepancy: true,
            ..Default::default()
        };
        let confirmed = close_out(Arc::clone(&backend), &balanced_draft(), options, now())
            .await
            .unwrap();
        assert_eq!(confirmed.outcome, CloseOutOutcome::Submitted);
        assert_eq!(backend.submissions(), 1);
    }

    #[tokio::test]
    async fn test_rejected_submission() {
        let backend = StubBackend::new(dec!(100), false);
        let result = close_out(backend, &balanced_draft(), CloseOutOptions::default(), now())
            .await
            .unwrap();
        assert_eq!(result.outcome, CloseOutOutcome::SubmitFailed);
        assert_eq!(result.outcome.exit_code(), 2);
    }
}
