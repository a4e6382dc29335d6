//! Async session: owns the [`TillState`], runs the reducer's effects against a
//! [`TillBackend`] and feeds their results back in as actions.
//!
//! Key design goals:
//! - **Single owner**: one task holds the state; background work only ever
//!   produces an [`Action`], it never touches state directly.
//! - **Cancellable opening fetch**: selecting a new shift cancels the previous
//!   fetch; a result that still slips through is dropped by the generation
//!   check in the reducer.
//! - **Non-fatal collaborators**: a failed fetch is logged and degrades to a
//!   default; a failed submission returns the form to idle.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::TillBackend;
use crate::shift::Shift;
use crate::state::{reduce, Action, Effect, TillState, Transition};
use crate::workflow::WorkflowPhase;

/// Interval between clock refreshes of the date/time stamp.
pub const CLOCK_TICK: Duration = Duration::from_secs(60);

pub struct TillSession<B: TillBackend + 'static> {
    backend: Arc<B>,
    state: TillState,
    tasks: JoinSet<Option<Action>>,
    opening_cancel: Option<CancellationToken>,
}

impl<B: TillBackend + 'static> TillSession<B> {
    /// Open a session for `shift`. Must be called inside a tokio runtime; the
    /// initial fetches start immediately.
    pub fn new(backend: Arc<B>, shift: Shift, now: NaiveDateTime) -> Self {
        let Transition { state, effects, .. } = TillState::open(shift, now);
        info!(shift = %shift, date = %state.context.date, "Till session opened");
        let mut session = Self {
            backend,
            state,
            tasks: JoinSet::new(),
            opening_cancel: None,
        };
        for effect in effects {
            session.run_effect(effect);
        }
        session
    }

    pub fn state(&self) -> &TillState {
        &self.state
    }

    /// Number of background operations still running.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Apply one action and start whatever it asks for. Returns the workflow
    /// phases entered.
    pub fn dispatch(&mut self, action: Action) -> Vec<WorkflowPhase> {
        let state = std::mem::take(&mut self.state);
        let Transition {
            state,
            effects,
            phases,
        } = reduce(state, action);
        self.state = state;
        for effect in effects {
            self.run_effect(effect);
        }
        phases
    }

    /// Refresh the date/time stamp from the local clock.
    pub fn tick(&mut self) {
        self.dispatch(Action::ClockTick(Local::now().naive_local()));
    }

    /// Wait for every background operation (and any follow-up it triggers)
    /// to finish. Returns the workflow phases entered along the way.
    pub async fn settle(&mut self) -> Vec<WorkflowPhase> {
        let mut phases = Vec::new();
        while let Some(joined) = self.tasks.join_next().await {
            phases.extend(self.complete(joined));
        }
        phases
    }

    /// Event loop: apply actions from `actions` as they arrive, completions
    /// as they land and a clock tick every minute. Returns the final state
    /// once the sender side is closed and outstanding work has settled.
    pub async fn run(mut self, mut actions: mpsc::Receiver<Action>) -> TillState {
        let mut clock = tokio::time::interval(CLOCK_TICK);
        clock.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                maybe = actions.recv() => match maybe {
                    Some(action) => {
                        self.dispatch(action);
                    }
                    None => break,
                },
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    self.complete(joined);
                }
                _ = clock.tick() => self.tick(),
            }
        }

        debug!(pending = self.tasks.len(), "Action channel closed, settling");
        self.settle().await;
        self.state
    }

    fn complete(&mut self, joined: Result<Option<Action>, JoinError>) -> Vec<WorkflowPhase> {
        match joined {
            Ok(Some(action)) => self.dispatch(action),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Background task ended abnormally");
                Vec::new()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Effects
    // -----------------------------------------------------------------------

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::FetchOpeningValue { shift, generation } => {
                self.fetch_opening_value(shift, generation)
            }
            Effect::FetchCategories => {
                let backend = Arc::clone(&self.backend);
                self.tasks.spawn(async move {
                    match backend.fetch_expense_categories().await {
                        Ok(categories) => Some(Action::CategoriesLoaded(categories)),
                        Err(e) => {
                            warn!(error = %e, "Expense category fetch failed, keeping catalogue");
                            None
                        }
                    }
                });
            }
            Effect::Submit(payload) => {
                let backend = Arc::clone(&self.backend);
                self.tasks.spawn(async move {
                    let result = backend
                        .submit_closing(&payload)
                        .await
                        .map_err(|e| e.to_string());
                    Some(Action::SubmissionFinished(result))
                });
            }
        }
    }

    fn fetch_opening_value(&mut self, shift: Shift, generation: u64) {
        if let Some(previous) = self.opening_cancel.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        self.opening_cancel = Some(token.clone());

        let backend = Arc::clone(&self.backend);
        self.tasks.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(shift = %shift, generation, "Opening value fetch cancelled");
                    None
                }
                result = backend.fetch_opening_value(shift) => {
                    let value = match result {
                        Ok(value) => Some(value),
                        Err(e) => {
                            warn!(shift = %shift, error = %e, "Opening value fetch failed, using 0");
                            None
                        }
                    };
                    Some(Action::OpeningValueLoaded { generation, value })
                }
            }
        });
    }
}
