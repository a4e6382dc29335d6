//! Diagnostics for the till close-out tool.
//!
//! Provides:
//! - **About info**: version, build timestamp, git SHA, platform
//! - **Logging setup**: console + daily rolling file, used by `lib.rs`
//! - **Log rotation helpers**: keep the log directory bounded

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of log files to retain.
pub const MAX_LOG_FILES: usize = 10;

/// Prefix of the rolling log files (`till.YYYY-MM-DD`).
pub const LOG_FILE_PREFIX: &str = "till";

const DEFAULT_FILTER: &str = "info,till_close_lib=debug";

// ---------------------------------------------------------------------------
// About info
// ---------------------------------------------------------------------------

/// Returns version, build timestamp, git SHA, and platform info.
pub fn get_about_info() -> Value {
    json!({
        "version": env!("CARGO_PKG_VERSION"),
        "buildTimestamp": env!("BUILD_TIMESTAMP"),
        "gitSha": env!("BUILD_GIT_SHA"),
        "platform": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
    })
}

/// One-line build summary for the start-up log, e.g.
/// `v0.4.2 (3f2a9c1, built 2026-10-16T08:00:00Z, linux/x86_64)`.
pub fn about_line() -> String {
    let about = get_about_info();
    let field = |key: &str| about[key].as_str().unwrap_or("unknown").to_string();
    format!(
        "v{} ({}, built {}, {}/{})",
        field("version"),
        field("gitSha"),
        field("buildTimestamp"),
        field("platform"),
        field("arch")
    )
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install the global subscriber. The returned guard flushes the file
/// writer when dropped, so the caller keeps it alive until exit.
pub fn init_tracing(log_dir: &Path) -> WorkerGuard {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("Cannot create log directory {}: {e}", log_dir.display());
    }
    prune_old_logs(log_dir);

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

// ---------------------------------------------------------------------------
// Log rotation
// ---------------------------------------------------------------------------

/// Returns the default log directory path.
pub fn get_log_dir() -> PathBuf {
    let base = std::env::var("LOCALAPPDATA")
        .or_else(|_| std::env::var("XDG_DATA_HOME"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            #[cfg(target_os = "windows")]
            {
                PathBuf::from(std::env::var("USERPROFILE").unwrap_or_else(|_| ".".into()))
                    .join("AppData")
                    .join("Local")
            }
            #[cfg(not(target_os = "windows"))]
            {
                PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()))
                    .join(".local")
                    .join("share")
            }
        });
    base.join("till-close").join("logs")
}

fn is_log_file(name: &str) -> bool {
    name == LOG_FILE_PREFIX
        || name
            .strip_prefix(LOG_FILE_PREFIX)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// Prune old log files in `log_dir`, keeping only the most recent `MAX_LOG_FILES`.
/// Returns how many files were removed.
pub fn prune_old_logs(log_dir: &Path) -> usize {
    if !log_dir.exists() {
        return 0;
    }

    let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
    if let Ok(entries) = fs::read_dir(log_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if is_log_file(name) {
                    let modified = entry
                        .metadata()
                        .ok()
                        .and_then(|m| m.modified().ok())
                        .unwrap_or(std::time::UNIX_EPOCH);
                    log_files.push((path, modified));
                }
            }
        }
    }

    // Newest first; ties broken by name so dated files keep their order.
    log_files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

    let mut removed = 0;
    for (path, _) in log_files.iter().skip(MAX_LOG_FILES) {
        match fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to prune log file {}: {e}", path.display()),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "till-close-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_about_info_has_required_fields() {
        let info = get_about_info();
        assert!(info.get("version").is_some());
        assert!(info.get("buildTimestamp").is_some());
        assert!(info.get("gitSha").is_some());
        assert!(info.get("platform").is_some());
    }

    #[test]
    fn test_about_line_carries_build_metadata() {
        let line = about_line();
        assert!(line.starts_with(&format!("v{} (", env!("CARGO_PKG_VERSION"))));
        assert!(line.contains(env!("BUILD_GIT_SHA")));
        assert!(line.contains(&format!("built {}", env!("BUILD_TIMESTAMP"))));
        assert!(line.ends_with(&format!(
            "{}/{})",
            std::env::consts::OS,
            std::env::consts::ARCH
        )));
        assert!(!line.contains("unknown/"));
    }

    #[test]
    fn test_log_dir_is_stable() {
        let d1 = get_log_dir();
        let d2 = get_log_dir();
        assert_eq!(d1, d2);
        assert!(d1.ends_with("till-close/logs"));
    }

    #[test]
    fn test_is_log_file() {
        assert!(is_log_file("till.2026-10-16"));
        assert!(is_log_file("till"));
        assert!(!is_log_file("tiller.log"));
        assert!(!is_log_file("notes.txt"));
    }

    #[test]
    fn test_prune_keeps_newest_log_files() {
        let dir = scratch_dir("prune");
        for day in 1..=(MAX_LOG_FILES + 3) {
            fs::write(dir.join(format!("till.2026-10-{day:02}")), "x").unwrap();
        }
        fs::write(dir.join("keep-me.txt"), "x").unwrap();

        let removed = prune_old_logs(&dir);
        assert_eq!(removed, 3);

        let remaining: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .flatten()
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        assert_eq!(remaining.len(), MAX_LOG_FILES + 1);
        assert!(remaining.contains(&"keep-me.txt".to_string()));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_prune_missing_dir_is_noop() {
        let dir = std::env::temp_dir().join("till-close-does-not-exist-xyz");
        assert_eq!(prune_old_logs(&dir), 0);
    }
}
