use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use till_close_lib::{CloseOutOptions, RunOptions, Shift};

/// Close out a till shift from a JSON draft and submit it to the backend.
#[derive(Debug, Parser)]
#[command(name = "till-close", version, about)]
struct Cli {
    /// Close-out draft (JSON).
    #[arg(short, long)]
    draft: PathBuf,

    /// Override the draft's shift (mañana, tarde, noche).
    #[arg(long)]
    shift: Option<Shift>,

    /// Backend base URL.
    #[arg(long, env = "TILL_BACKEND_URL")]
    backend_url: Option<String>,

    /// Directory for rolling log files.
    #[arg(long, env = "TILL_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Submit even when cash or card figures do not balance.
    #[arg(long)]
    confirm_discrepancy: bool,

    /// Print the report without submitting.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let options = RunOptions {
        draft_path: cli.draft,
        shift: cli.shift,
        backend_url: cli.backend_url,
        log_dir: cli.log_dir,
        close_out: CloseOutOptions {
            confirm_discrepancy: cli.confirm_discrepancy,
            dry_run: cli.dry_run,
        },
    };

    match till_close_lib::run(options).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("till-close: {e:#}");
            ExitCode::from(1)
        }
    }
}
