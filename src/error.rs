//! # error
//!
//! Error types for every collaborator plus the HTTP-facing [`AppError`].
//!
//! Collaborator errors stay typed so callers can tell a version conflict apart
//! from a dead network. Manager handlers return `Result<_, AppError>` and the
//! `IntoResponse` impl turns them into `{"ok": false, "error": ...}` bodies.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration key `{0}`")]
    Missing(&'static str),

    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ─── Watchlist Store ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    /// The version token presented on write is stale: someone else wrote first.
    #[error("watchlist changed since it was read (version conflict)")]
    Conflict,

    #[error("store unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("stored watchlist could not be decoded: {0}")]
    Decode(String),

    #[error("watchlist could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

// ─── Quote Provider ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("quote provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("quote provider returned HTTP {0}")]
    Http(u16),

    #[error("no price data for {0}")]
    NoData(String),

    #[error("quote provider error: {0}")]
    Upstream(String),
}

// ─── Notification Sender ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification channel unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("notification rejected: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

// ─── HTTP (Interactive Manager) ───────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AppError {
    /// The request payload was syntactically correct but semantically invalid.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The named watchlist entry does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate name, or the stored document moved under us.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store or provider failure.
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => AppError::Conflict(
                "watchlist was modified concurrently — reload and retry".into(),
            ),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NoData(ticker) => AppError::NotFound(format!("no price data for {ticker}")),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
        };

        let body = Json(json!({
            "ok":    false,
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflict_maps_to_http_409() {
        let resp = AppError::from(StoreError::Conflict).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn store_http_failure_maps_to_bad_gateway() {
        let err = StoreError::Http { status: 500, body: "boom".into() };
        let resp = AppError::from(err).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn missing_price_data_maps_to_not_found() {
        let resp = AppError::from(ProviderError::NoData("XXXX.T".into())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
