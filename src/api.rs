//! Backend API client.
//!
//! The till talks to one backend for three things: the opening cash value of
//! a shift, the expense category catalogue, and the final close-out
//! submission. [`TillBackend`] is the seam; [`HttpBackend`] is the reqwest
//! implementation used in production.

use std::str::FromStr;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use rust_decimal::prelude::*;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::TillConfig;
use crate::expenses::default_categories;
use crate::payload::SubmissionPayload;
use crate::shift::Shift;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Cannot reach backend at {0}")]
    Connect(String),

    #[error("Connection to {0} timed out")]
    Timeout(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Network error communicating with {url}: {message}")]
    Network { url: String, message: String },

    #[error("{message}")]
    Status { code: u16, message: String },

    #[error("Invalid response from backend: {0}")]
    InvalidBody(String),

    #[error("Backend rejected the close-out")]
    Rejected,
}

/// Classify a `reqwest::Error` the way the cashier-facing messages need it.
fn friendly_error(url: &str, err: &reqwest::Error) -> ApiError {
    if err.is_connect() {
        return ApiError::Connect(url.to_string());
    }
    if err.is_timeout() {
        return ApiError::Timeout(url.to_string());
    }
    if err.is_builder() {
        return ApiError::InvalidUrl(url.to_string());
    }
    ApiError::Network {
        url: url.to_string(),
        message: err.to_string(),
    }
}

/// Convert an HTTP status code into a readable error.
fn status_error(status: StatusCode) -> ApiError {
    let code = status.as_u16();
    let message = match code {
        404 => "Backend endpoint not found (HTTP 404)".to_string(),
        s if s >= 500 => format!("Backend server error (HTTP {s})"),
        s => format!("Unexpected response from backend (HTTP {s})"),
    };
    ApiError::Status { code, message }
}

// ---------------------------------------------------------------------------
// Body parsing
// ---------------------------------------------------------------------------

/// Read the opening-value body: a bare number, possibly quoted.
pub fn parse_opening_value(body: &str) -> Result<Decimal, ApiError> {
    let trimmed = body.trim();
    let unquoted = trimmed.trim_matches('"').trim();
    if let Ok(value) = Decimal::from_str(unquoted) {
        return Ok(value);
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Number(n)) => n
            .as_f64()
            .and_then(Decimal::from_f64)
            .ok_or_else(|| ApiError::InvalidBody(format!("not a number: {trimmed}"))),
        _ => Err(ApiError::InvalidBody(format!("not a number: {trimmed}"))),
    }
}

/// A submission is accepted only when the body says `"success": true`.
pub fn parse_submission_ack(body: &str) -> Result<(), ApiError> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::InvalidBody(format!("submission response: {e}")))?;
    match json.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(()),
        _ => Err(ApiError::Rejected),
    }
}

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

#[async_trait]
pub trait TillBackend: Send + Sync {
    async fn fetch_opening_value(&self, shift: Shift) -> Result<Decimal, ApiError>;

    async fn fetch_expense_categories(&self) -> Result<Vec<String>, ApiError>;

    async fn submit_closing(&self, payload: &SubmissionPayload) -> Result<(), ApiError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

pub struct HttpBackend {
    client: Client,
    base_url: String,
    submit_path: String,
    categories_path: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &TillConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ApiError::Network {
                url: config.backend_url.clone(),
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: config.backend_url.clone(),
            submit_path: config.submit_path.clone(),
            categories_path: config.categories_path.clone(),
        })
    }

    /// `{base}/inicial/{shift}` with the shift name percent-encoded.
    pub fn opening_value_url(&self, shift: Shift) -> Result<Url, ApiError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push("inicial")
            .push(shift.as_str());
        Ok(url)
    }

    fn path_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_text(&self, url: &str) -> Result<String, ApiError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| friendly_error(&self.base_url, &e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(status_error(status));
        }
        resp.text()
            .await
            .map_err(|e| ApiError::InvalidBody(e.to_string()))
    }
}

#[async_trait]
impl TillBackend for HttpBackend {
    async fn fetch_opening_value(&self, shift: Shift) -> Result<Decimal, ApiError> {
        let url = self.opening_value_url(shift)?;
        let body = self.get_text(url.as_str()).await?;
        let value = parse_opening_value(&body)?;
        debug!(shift = %shift, value = %value, "Fetched opening value");
        Ok(value)
    }

    async fn fetch_expense_categories(&self) -> Result<Vec<String>, ApiError> {
        let Some(path) = self.categories_path.as_deref() else {
            return Ok(default_categories());
        };
        let body = self.get_text(&self.path_url(path)).await?;
        let categories: Vec<String> = serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidBody(format!("category list: {e}")))?;
        Ok(categories
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect())
    }

    async fn submit_closing(&self, payload: &SubmissionPayload) -> Result<(), ApiError> {
        let url = self.path_url(&self.submit_path);
        let resp = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| friendly_error(&self.base_url, &e))?;
        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            return Err(ApiError::Rejected);
        }
        if !status.is_success() {
            return Err(status_error(status));
        }
        let body = resp.text().await.unwrap_or_default();
        parse_submission_ack(&body)?;
        info!(shift = %payload.shift, "Backend accepted close-out");
        Ok(())
    }
}
