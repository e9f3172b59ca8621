//! # routes::quote
//!
//! Ad-hoc period-low check for any ticker, on the watchlist or not.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::AppError,
    market::check_period_low,
    models::LookbackWindow,
    state::SharedState,
};

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub period: Option<String>,
}

// ─── GET /api/quote/:ticker ───────────────────────────────────────────────────

pub async fn check_quote(
    State(state): State<SharedState>,
    Path(ticker): Path<String>,
    Query(params): Query<QuoteParams>,
) -> Result<impl IntoResponse, AppError> {
    let ticker = ticker.trim().to_ascii_uppercase();
    let period = match params.period.as_deref() {
        None => LookbackWindow::YearToDate,
        Some(raw) => raw.parse::<LookbackWindow>().map_err(AppError::BadRequest)?,
    };

    let check = check_period_low(state.provider.as_ref(), &ticker, period).await?;
    tracing::debug!(ticker = %ticker, period = period.label(), at_low = check.at_low, "Ad-hoc quote check");

    Ok(Json(json!({ "ok": true, "check": check })))
}
