//! # engine::portfolio
//!
//! Read-only portfolio view over cached values, served by
//! `GET /api/watchlist`. Never calls the provider.

use serde::Serialize;

use crate::engine::cost::profit_pct;
use crate::models::{WatchlistDocument, WatchlistEntry};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryView {
    pub name:               String,
    pub ticker:             String,
    pub qty:                f64,
    pub avg_cost:           f64,
    /// Threshold actually in force (entry → settings → default).
    pub alert_pct:          f64,
    pub last_price:         Option<f64>,
    pub low_ytd:            Option<f64>,
    pub low_3y:             Option<f64>,
    pub low_5y:             Option<f64>,
    pub sector:             Option<String>,
    pub annual_div:         Option<f64>,
    pub cost_basis:         f64,
    pub market_value:       Option<f64>,
    pub profit_pct:         Option<f64>,
    pub dividend_yield_pct: Option<f64>,
    /// How far above the 5-year low the last price sits, in percent.
    pub above_5y_low_pct:   Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioTotals {
    /// Cost of entries that have a cached price.
    pub cost_basis:     f64,
    pub market_value:   f64,
    pub unrealised_pnl: f64,
    pub pnl_pct:        Option<f64>,
    /// Entries left out of the totals for lack of a cached price.
    pub unpriced:       usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioView {
    pub entries: Vec<EntryView>,
    pub totals:  PortfolioTotals,
}

pub fn entry_view(name: &str, entry: &WatchlistEntry, alert_pct: f64) -> EntryView {
    let last = entry.cache.last_price;
    EntryView {
        name:               name.to_string(),
        ticker:             entry.ticker_symbol.clone(),
        qty:                entry.quantity,
        avg_cost:           entry.average_cost,
        alert_pct,
        last_price:         last,
        low_ytd:            entry.cache.low_ytd,
        low_3y:             entry.cache.low_3y,
        low_5y:             entry.cache.low_5y,
        sector:             entry.cache.sector.clone(),
        annual_div:         entry.cache.annual_dividend,
        cost_basis:         entry.quantity * entry.average_cost,
        market_value:       last.map(|p| entry.quantity * p),
        profit_pct:         last.and_then(|p| profit_pct(entry.average_cost, p)),
        dividend_yield_pct: match (entry.cache.annual_dividend, last) {
            (Some(div), Some(p)) if p > 0.0 => Some(div * 100.0 / p),
            _ => None,
        },
        above_5y_low_pct:   match (entry.cache.low_5y, last) {
            (Some(low), Some(p)) if low > 0.0 => Some((p - low) * 100.0 / low),
            _ => None,
        },
    }
}

pub fn portfolio_view(doc: &WatchlistDocument) -> PortfolioView {
    let entries: Vec<EntryView> = doc
        .entries
        .iter()
        .map(|(name, entry)| entry_view(name, entry, doc.settings.threshold_for(entry)))
        .collect();

    let mut totals = PortfolioTotals {
        cost_basis:     0.0,
        market_value:   0.0,
        unrealised_pnl: 0.0,
        pnl_pct:        None,
        unpriced:       0,
    };
    for view in &entries {
        match view.market_value {
            Some(value) => {
                totals.cost_basis += view.cost_basis;
                totals.market_value += value;
            }
            None => totals.unpriced += 1,
        }
    }
    totals.unrealised_pnl = totals.market_value - totals.cost_basis;
    totals.pnl_pct = profit_pct(totals.cost_basis, totals.market_value);

    PortfolioView { entries, totals }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuoteCache;

    fn priced(ticker: &str, qty: f64, cost: f64, last: f64) -> WatchlistEntry {
        let mut e = WatchlistEntry::new(ticker, qty, cost);
        e.cache = QuoteCache { last_price: Some(last), ..Default::default() };
        e
    }

    #[test]
    fn totals_skip_unpriced_entries() {
        let mut doc = WatchlistDocument::default();
        doc.entries.insert("A".into(), priced("A.T", 100.0, 1000.0, 1150.0));
        doc.entries.insert("B".into(), priced("B.T", 10.0, 500.0, 400.0));
        doc.entries.insert("C".into(), WatchlistEntry::new("C.T", 5.0, 100.0));

        let view = portfolio_view(&doc);

        assert_eq!(view.entries.len(), 3);
        assert_eq!(view.totals.cost_basis, 105_000.0);
        assert_eq!(view.totals.market_value, 119_000.0);
        assert_eq!(view.totals.unrealised_pnl, 14_000.0);
        assert_eq!(view.totals.unpriced, 1);
        assert!((view.totals.pnl_pct.unwrap() - 13.333333).abs() < 1e-4);
    }

    #[test]
    fn entry_view_derivations() {
        let mut e = priced("7203.T", 100.0, 1000.0, 1250.0);
        e.cache.annual_dividend = Some(50.0);
        e.cache.low_5y = Some(1000.0);

        let v = entry_view("Toyota", &e, 10.0);

        assert_eq!(v.market_value, Some(125_000.0));
        assert_eq!(v.profit_pct, Some(25.0));
        assert_eq!(v.dividend_yield_pct, Some(4.0));
        assert_eq!(v.above_5y_low_pct, Some(25.0));
    }

    #[test]
    fn watch_only_entry_has_no_profit() {
        let v = entry_view("Watch", &priced("X.T", 0.0, 0.0, 10.0), 10.0);
        assert_eq!(v.profit_pct, None);
        assert_eq!(v.market_value, Some(0.0));
    }
}
