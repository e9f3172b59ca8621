//! # routes::watchlist
//!
//! Watchlist CRUD plus the on-demand recheck. Every mutation is one
//! [`Transaction`]: read fresh, change, conditional write. A concurrent
//! writer (batch run, another browser tab) turns into HTTP 409.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    engine::{cost::Lot, portfolio, reconcile},
    error::AppError,
    models::{entry::is_reserved_name, Origin, WatchlistEntry},
    state::SharedState,
    store::{CommitOutcome, Transaction},
};

// ─── Request Bodies ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddEntryRequest {
    pub name:      String,
    pub ticker:    String,
    #[serde(default)]
    pub qty:       f64,
    #[serde(default)]
    pub avg_cost:  f64,
    pub alert_pct: Option<f64>,
}

/// All fields optional. `qty` + `avg_cost` together record an additional
/// purchase, merged into the existing position at weighted-average cost.
#[derive(Debug, Default, Deserialize)]
pub struct EditEntryRequest {
    pub ticker:    Option<String>,
    pub alert_pct: Option<f64>,
    pub qty:       Option<f64>,
    pub avg_cost:  Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CheckParams {
    #[serde(default)]
    pub persist: bool,
    #[serde(default = "default_notify")]
    pub notify:  bool,
}

fn default_notify() -> bool {
    true
}

// ─── Validation ───────────────────────────────────────────────────────────────

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    if is_reserved_name(name) {
        return Err(AppError::BadRequest(format!(
            "name '{name}' is reserved (names must not start with '_')"
        )));
    }
    Ok(())
}

fn normalise_ticker(ticker: &str) -> Result<String, AppError> {
    let ticker = ticker.trim().to_ascii_uppercase();
    if ticker.is_empty() {
        return Err(AppError::BadRequest("ticker must not be empty".into()));
    }
    Ok(ticker)
}

fn validate_amount(field: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::BadRequest(format!(
            "{field} must be a non-negative number (got {value})"
        )));
    }
    Ok(())
}

fn validate_alert_pct(value: f64) -> Result<(), AppError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::BadRequest(format!(
            "alert_pct must be a positive number (got {value})"
        )));
    }
    Ok(())
}

// ─── GET /api/watchlist ───────────────────────────────────────────────────────

/// Portfolio view over cached values. Never calls the quote provider.
pub async fn list_entries(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let doc = state.store.read().await?.value;
    let view = portfolio::portfolio_view(&doc);

    Ok(Json(json!({
        "ok":       true,
        "entries":  view.entries,
        "totals":   view.totals,
        "settings": doc.settings,
    })))
}

// ─── POST /api/watchlist ──────────────────────────────────────────────────────

pub async fn add_entry(
    State(state): State<SharedState>,
    Json(req): Json<AddEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = req.name.trim().to_string();
    validate_name(&name)?;
    let ticker = normalise_ticker(&req.ticker)?;
    validate_amount("qty", req.qty)?;
    validate_amount("avg_cost", req.avg_cost)?;
    if let Some(pct) = req.alert_pct {
        validate_alert_pct(pct)?;
    }

    let mut txn = Transaction::begin(state.store.as_ref()).await?;
    if txn.document().entry(&name).is_some() {
        return Err(AppError::Conflict(format!("'{name}' is already on the watchlist")));
    }

    let mut entry = WatchlistEntry::new(ticker, req.qty, req.avg_cost);
    if let Some(pct) = req.alert_pct {
        entry = entry.with_alert_pct(pct);
    }
    txn.document_mut().entries.insert(name.clone(), entry.clone());
    txn.commit(state.store.as_ref(), &format!("Add {name} to watchlist")).await?;

    info!(name = %name, ticker = %entry.ticker_symbol, "➕ Watchlist entry added");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "name": name, "entry": entry })),
    ))
}

// ─── PUT /api/watchlist/:name ─────────────────────────────────────────────────

pub async fn edit_entry(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Json(req): Json<EditEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ticker = req.ticker.as_deref().map(normalise_ticker).transpose()?;
    if let Some(pct) = req.alert_pct {
        validate_alert_pct(pct)?;
    }
    let purchase = match (req.qty, req.avg_cost) {
        (None, None) => None,
        (Some(qty), Some(cost)) => {
            validate_amount("qty", qty)?;
            validate_amount("avg_cost", cost)?;
            Some(Lot::new(qty, cost))
        }
        _ => {
            return Err(AppError::BadRequest(
                "an additional purchase needs both qty and avg_cost".into(),
            ))
        }
    };

    let mut txn = Transaction::begin(state.store.as_ref()).await?;
    let Some(entry) = txn.document_mut().entries.get_mut(&name) else {
        return Err(AppError::NotFound(format!("'{name}' is not on the watchlist")));
    };

    if let Some(ticker) = ticker {
        if ticker != entry.ticker_symbol {
            // Cached values belong to the old symbol.
            entry.ticker_symbol = ticker;
            entry.cache = Default::default();
        }
    }
    if let Some(pct) = req.alert_pct {
        entry.alert_threshold_pct = Some(pct);
    }
    if let Some(purchase) = purchase {
        let merged = Lot::new(entry.quantity, entry.average_cost).merge(purchase);
        entry.quantity = merged.qty;
        entry.average_cost = merged.avg_cost;
    }
    let updated = entry.clone();

    let outcome = txn.commit(state.store.as_ref(), &format!("Update {name}")).await?;
    if matches!(outcome, CommitOutcome::Written(_)) {
        info!(name = %name, qty = updated.quantity, avg_cost = updated.average_cost, "✏️ Watchlist entry updated");
    }

    Ok(Json(json!({ "ok": true, "name": name, "entry": updated })))
}

// ─── DELETE /api/watchlist/:name ──────────────────────────────────────────────

pub async fn remove_entry(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut txn = Transaction::begin(state.store.as_ref()).await?;
    if txn.document_mut().entries.remove(&name).is_none() {
        return Err(AppError::NotFound(format!("'{name}' is not on the watchlist")));
    }
    txn.commit(state.store.as_ref(), &format!("Remove {name} from watchlist")).await?;

    info!(name = %name, "🗑️ Watchlist entry removed");

    Ok(Json(json!({ "ok": true, "name": name })))
}

// ─── POST /api/watchlist/:name/check ──────────────────────────────────────────

/// Reconcile one entry right now. Alerts go out unless `notify=false`;
/// the refreshed cache is written back only with `persist=true`.
pub async fn check_entry(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Query(params): Query<CheckParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut txn = Transaction::begin(state.store.as_ref()).await?;
    let Some(entry) = txn.document().entry(&name).cloned() else {
        return Err(AppError::NotFound(format!("'{name}' is not on the watchlist")));
    };
    if entry.ticker_symbol.is_empty() {
        return Err(AppError::BadRequest(format!("'{name}' has no ticker")));
    }
    let settings = txn.document().settings.clone();

    let snapshot = state.provider.snapshot(&entry.ticker_symbol, &entry.cache).await;
    let outcome = reconcile(&name, &entry, &snapshot, &settings);

    let mut notified = 0usize;
    if params.notify {
        for alert in &outcome.alerts {
            match state.notifier.send(&alert.notification_text(Origin::Manual)).await {
                Ok(()) => notified += 1,
                Err(e) => warn!(name = %name, error = %e, "⚠️ Notification failed"),
            }
        }
    }

    let mut persisted = false;
    if params.persist && outcome.entry != entry {
        txn.document_mut().entries.insert(name.clone(), outcome.entry.clone());
        let written = txn
            .commit(state.store.as_ref(), &format!("Update {name} quote cache (manual check)"))
            .await?;
        persisted = matches!(written, CommitOutcome::Written(_));
    }

    info!(
        name      = %name,
        ticker    = %entry.ticker_symbol,
        live      = snapshot.is_live,
        alerts    = outcome.alerts.len(),
        notified,
        persisted,
        "🔎 Manual check"
    );

    Ok(Json(json!({
        "ok":         true,
        "name":       name,
        "snapshot":   snapshot,
        "profit_pct": outcome.profit_pct,
        "alerts":     outcome.alerts,
        "notified":   notified,
        "persisted":  persisted,
    })))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
