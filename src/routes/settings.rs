//! # routes::settings
//!
//! The `_settings` block of the watchlist document. Unknown settings keys
//! are never touched.

use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{
    error::AppError,
    models::entry::DEFAULT_ALERT_PCT,
    state::SharedState,
    store::Transaction,
};

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub default_alert_pct: f64,
}

// ─── GET /api/settings ────────────────────────────────────────────────────────

pub async fn get_settings(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let doc = state.store.read().await?.value;
    let effective = doc.settings.default_alert_pct.unwrap_or(DEFAULT_ALERT_PCT);

    Ok(Json(json!({
        "ok":                          true,
        "settings":                    doc.settings,
        "effective_default_alert_pct": effective,
    })))
}

// ─── PUT /api/settings ────────────────────────────────────────────────────────

pub async fn update_settings(
    State(state): State<SharedState>,
    Json(req): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pct = req.default_alert_pct;
    if !pct.is_finite() || pct <= 0.0 {
        return Err(AppError::BadRequest(format!(
            "default_alert_pct must be a positive number (got {pct})"
        )));
    }

    let mut txn = Transaction::begin(state.store.as_ref()).await?;
    txn.document_mut().settings.default_alert_pct = Some(pct);
    let settings = txn.document().settings.clone();
    txn.commit(state.store.as_ref(), "Update watchlist settings").await?;

    info!(default_alert_pct = pct, "⚙️ Settings updated");

    Ok(Json(json!({ "ok": true, "settings": settings })))
}
