//! # engine::reconcile
//!
//! **Reconciliation Engine**: merges one freshly fetched [`QuoteSnapshot`]
//! into one persisted [`WatchlistEntry`] and decides what to alert on.
//!
//! ```text
//! snapshot live?
//!     │ no  → entry unchanged, no alerts (never alert on stale data)
//!     │
//!     ├─ [1] Period low   → 5y, else 3y, else YTD  (first match only)
//!     ├─ [2] Profit/loss  → |profit %| ≥ threshold (independent of [1])
//!     └─ [3] Cache        → overwrite every cached field from the snapshot
//! ```
//!
//! Pure: no I/O, no errors. Degenerate inputs just suppress an alert class.

use tracing::debug;

use crate::engine::{cost::profit_pct, format};
use crate::models::{
    AlertEvent, AlertKind, GlobalSettings, LowPeriod, PnlDirection, QuoteSnapshot, WatchlistEntry,
};

/// Absorbs float noise so that a move of exactly the threshold still fires.
const THRESHOLD_EPSILON: f64 = 1e-9;

/// Result of reconciling one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub entry:      WatchlistEntry,
    pub alerts:     Vec<AlertEvent>,
    /// Unrealised P/L against the live price, when both exist.
    pub profit_pct: Option<f64>,
}

pub fn reconcile(
    name: &str,
    entry: &WatchlistEntry,
    snapshot: &QuoteSnapshot,
    settings: &GlobalSettings,
) -> Reconciliation {
    let unchanged = || Reconciliation {
        entry:      entry.clone(),
        alerts:     Vec::new(),
        profit_pct: None,
    };

    if !snapshot.is_live {
        debug!(name, ticker = %entry.ticker_symbol, "Snapshot not live, skipping entry");
        return unchanged();
    }
    let Some(price) = snapshot.current_price else {
        debug!(name, ticker = %entry.ticker_symbol, "Live snapshot without a price, skipping entry");
        return unchanged();
    };

    let mut alerts = Vec::new();

    // ── [1] Period-low breach ────────────────────────────────────────────────
    if let Some((period, low)) = breached_low(price, snapshot) {
        debug!(name, price, low, period = period.label(), "📉 period low breached");
        alerts.push(AlertEvent {
            kind:          AlertKind::PeriodLow { period, low },
            entry_name:    name.to_string(),
            ticker_symbol: entry.ticker_symbol.clone(),
            message_body:  format!(
                "{name} ({ticker}) hit its {label}\nPrice: {price} (low {low})",
                ticker = entry.ticker_symbol,
                label = period.label(),
                price = format::price(price),
                low = format::price(low),
            ),
        });
    }

    // ── [2] Profit/loss threshold ────────────────────────────────────────────
    let pnl = profit_pct(entry.average_cost, price);
    let threshold = settings.threshold_for(entry);
    if let Some(actual) = pnl {
        if actual.abs() + THRESHOLD_EPSILON >= threshold {
            let direction = if actual > 0.0 { PnlDirection::Gain } else { PnlDirection::Loss };
            let verb = match direction {
                PnlDirection::Gain => "is up",
                PnlDirection::Loss => "is down",
            };
            debug!(name, actual, threshold, ?direction, "💹 threshold reached");
            alerts.push(AlertEvent {
                kind: AlertKind::Threshold {
                    direction,
                    threshold_pct: threshold,
                    actual_pct: actual,
                },
                entry_name:    name.to_string(),
                ticker_symbol: entry.ticker_symbol.clone(),
                message_body:  format!(
                    "{name} ({ticker}) {verb} {actual} (alert at ±{threshold})\nPrice: {price} / avg cost {cost}",
                    ticker = entry.ticker_symbol,
                    actual = format::signed_pct(actual),
                    threshold = format::pct(threshold),
                    price = format::price(price),
                    cost = format::price(entry.average_cost),
                ),
            });
        }
    }

    // ── [3] Cache refresh (every live run) ───────────────────────────────────
    let mut updated = entry.clone();
    updated.cache = snapshot.to_cache();

    Reconciliation {
        entry: updated,
        alerts,
        profit_pct: pnl,
    }
}

/// Most severe breached period low; the 5y low implies the others.
fn breached_low(price: f64, snapshot: &QuoteSnapshot) -> Option<(LowPeriod, f64)> {
    [
        (LowPeriod::FiveYear, snapshot.low_5y),
        (LowPeriod::ThreeYear, snapshot.low_3y),
        (LowPeriod::YearToDate, snapshot.low_year_to_date),
    ]
    .into_iter()
    .find_map(|(period, low)| low.filter(|&low| price <= low).map(|low| (period, low)))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
