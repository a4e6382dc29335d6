//! Runtime configuration, read from `TILL_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::diagnostics::get_log_dir;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
pub const DEFAULT_SUBMIT_PATH: &str = "/api/submit";

/// Default timeout for backend requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TillConfig {
    pub backend_url: String,
    pub http_timeout: Duration,
    pub submit_path: String,
    pub categories_path: Option<String>,
    pub log_dir: PathBuf,
}

impl Default for TillConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            http_timeout: DEFAULT_TIMEOUT,
            submit_path: DEFAULT_SUBMIT_PATH.to_string(),
            categories_path: None,
            log_dir: get_log_dir(),
        }
    }
}

impl TillConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(url) = env_value("TILL_BACKEND_URL") {
            config.backend_url = normalize_base_url(&url);
        }
        if let Some(raw) = env_value("TILL_HTTP_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.http_timeout = Duration::from_secs(secs),
                _ => warn!(value = %raw, "Ignoring invalid TILL_HTTP_TIMEOUT_SECS"),
            }
        }
        if let Some(path) = env_value("TILL_SUBMIT_PATH") {
            config.submit_path = normalize_path(&path);
        }
        config.categories_path = env_value("TILL_CATEGORIES_PATH").map(|p| normalize_path(&p));
        if let Some(dir) = env_value("TILL_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        config
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalise the backend URL:
/// - ensure a scheme is present (https, or http for localhost)
/// - strip trailing slashes
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

/// Paths are appended to the base URL, so they always start with one slash.
fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim().trim_start_matches('/'))
}
