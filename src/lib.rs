//! Till Close - end-of-shift cash register reconciliation.
//!
//! The crate is split into an exact calculation core (denominations, cash
//! count, expenses, closing figures), a submission workflow driven by a pure
//! reducer (`state`, `workflow`), and the plumbing that runs it against the
//! backend (`api`, `session`, `commands`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use tracing::info;

pub mod api;
pub mod attachments;
pub mod closing;
pub mod commands;
pub mod config;
pub mod denominations;
pub mod diagnostics;
pub mod expenses;
pub mod money;
pub mod payload;
pub mod recuento;
pub mod session;
pub mod shift;
pub mod state;
pub mod validation;
pub mod workflow;

pub use api::{ApiError, HttpBackend, TillBackend};
pub use commands::{close_out, CloseOut, CloseOutOptions, CloseOutOutcome, ClosingDraft};
pub use config::TillConfig;
pub use session::TillSession;
pub use shift::Shift;
pub use state::{reduce, Action, Effect, TillState, Transition};
pub use workflow::WorkflowPhase;

use commands::{parse_closing_draft, render_errors};

/// Options collected by the command-line driver.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub draft_path: PathBuf,
    pub shift: Option<Shift>,
    pub backend_url: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub close_out: CloseOutOptions,
}

// ============================================================================
// App entry point
// ============================================================================

/// Run one close-out from a draft file. Returns the process exit code.
pub async fn run(options: RunOptions) -> anyhow::Result<u8> {
    let mut config = TillConfig::from_env();
    if let Some(url) = options.backend_url.as_deref() {
        config.backend_url = config::normalize_base_url(url);
    }
    if let Some(dir) = options.log_dir.clone() {
        config.log_dir = dir;
    }

    // Dropping the guard flushes the file writer, so it lives until we return.
    let _guard = diagnostics::init_tracing(&config.log_dir);

    info!("Starting Till Close {}", diagnostics::about_line());
    info!(
        backend = %config.backend_url,
        log_dir = %config.log_dir.display(),
        "Configuration loaded"
    );

    let text = std::fs::read_to_string(&options.draft_path)
        .with_context(|| format!("Cannot read draft {}", options.draft_path.display()))?;
    let mut draft = parse_closing_draft(&text).map_err(anyhow::Error::msg)?;
    if let Some(shift) = options.shift {
        draft.shift = Some(shift);
    }

    let backend = HttpBackend::new(&config).context("Failed to set up backend client")?;
    let result = close_out(
        Arc::new(backend),
        &draft,
        options.close_out,
        Local::now().naive_local(),
    )
    .await
    .map_err(anyhow::Error::msg)?;

    println!("{}", result.report);
    match &result.outcome {
        CloseOutOutcome::Submitted => println!("Close-out submitted."),
        CloseOutOutcome::DryRun => println!("Dry run: nothing was submitted."),
        CloseOutOutcome::Incomplete(errors) => println!("{}", render_errors(errors)),
        CloseOutOutcome::DiscrepancyDeclined(d) => println!(
            "Discrepancy found ({}). Re-run with --confirm-discrepancy to submit anyway.",
            d.describe()
        ),
        CloseOutOutcome::SubmitFailed => {
            println!("Submission failed; the close-out was not recorded.")
        }
    }

    Ok(result.outcome.exit_code())
}
