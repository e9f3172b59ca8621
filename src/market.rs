//! # market — Quote Provider
//!
//! Daily price history per ticker, condensed into a [`QuoteSnapshot`].
//!
//! ## Data Source
//! Yahoo chart API (`/v8/finance/chart/{ticker}`), daily bars, dividend
//! events included. Sector comes from `quoteSummary` on a best-effort basis.
//!
//! The snapshot path never fails outward: any history failure turns into a
//! non-live snapshot built from the entry's cached values.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::models::{DailyBar, Dividend, LookbackWindow, PriceHistory, QuoteCache, QuoteSnapshot};

// ─── Provider Trait ───────────────────────────────────────────────────────────

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Daily bars covering at least `window`, oldest first.
    async fn history(&self, ticker: &str, window: LookbackWindow)
        -> Result<PriceHistory, ProviderError>;

    /// Sector classification, if the provider knows one.
    async fn sector(&self, _ticker: &str) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }

    /// Everything one reconciliation needs. Falls back to `cache` (non-live)
    /// when the history cannot be fetched.
    async fn snapshot(&self, ticker: &str, cache: &QuoteCache) -> QuoteSnapshot {
        let history = match self.history(ticker, LookbackWindow::FiveYears).await {
            Ok(history) => history,
            Err(e) => {
                warn!(ticker, error = %e, "⚠️ Quote fetch failed — using cached values");
                return QuoteSnapshot::fallback(cache);
            }
        };

        let sector = match self.sector(ticker).await {
            Ok(sector) => sector,
            Err(e) => {
                debug!(ticker, error = %e, "Sector lookup failed — keeping cached sector");
                None
            }
        };

        QuoteSnapshot::from_history(&history, sector, cache).unwrap_or_else(|| {
            warn!(ticker, "⚠️ Quote history empty — using cached values");
            QuoteSnapshot::fallback(cache)
        })
    }
}

// ─── Single-period check (ad-hoc) ─────────────────────────────────────────────

/// Latest close vs. the low of one window — the dashboard's "check now".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodCheck {
    pub ticker:     String,
    pub period:     LookbackWindow,
    pub price:      f64,
    pub period_low: f64,
    pub as_of:      NaiveDate,
    pub at_low:     bool,
}

pub async fn check_period_low(
    provider: &dyn QuoteProvider,
    ticker: &str,
    period: LookbackWindow,
) -> Result<PeriodCheck, ProviderError> {
    let history = provider.history(ticker, period).await?;
    let latest = history
        .latest()
        .ok_or_else(|| ProviderError::NoData(ticker.to_string()))?;
    let period_low = history
        .period_low(period)
        .ok_or_else(|| ProviderError::NoData(ticker.to_string()))?;

    Ok(PeriodCheck {
        ticker: ticker.to_string(),
        period,
        price: latest.close,
        period_low,
        as_of: latest.date,
        at_low: latest.close <= period_low,
    })
}

// ─── Yahoo ────────────────────────────────────────────────────────────────────

pub struct YahooQuoteProvider {
    client:   reqwest::Client,
    base_url: String,
}

impl YahooQuoteProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Yahoo has no `3y` range; fetch `5y` and let the window cut it.
fn yahoo_range(window: LookbackWindow) -> &'static str {
    match window {
        LookbackWindow::YearToDate => "ytd",
        LookbackWindow::OneYear => "1y",
        LookbackWindow::ThreeYears | LookbackWindow::FiveYears => "5y",
    }
}

#[async_trait]
impl QuoteProvider for YahooQuoteProvider {
    async fn history(
        &self,
        ticker: &str,
        window: LookbackWindow,
    ) -> Result<PriceHistory, ProviderError> {
        let url = format!("{}/v8/finance/chart/{ticker}", self.base_url);
        debug!(ticker, range = yahoo_range(window), "Fetching chart...");

        let resp = self
            .client
            .get(&url)
            .query(&[("range", yahoo_range(window)), ("interval", "1d"), ("events", "div")])
            .send()
            .await?;

        let status = resp.status();
        // Yahoo answers unknown symbols with 404 + a chart.error body.
        if !status.is_success() && status.as_u16() != 404 {
            return Err(ProviderError::Http(status.as_u16()));
        }

        let envelope: ChartEnvelope = resp.json().await?;
        parse_chart(ticker, envelope)
    }

    async fn sector(&self, ticker: &str) -> Result<Option<String>, ProviderError> {
        let url = format!("{}/v10/finance/quoteSummary/{ticker}", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[("modules", "assetProfile")])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ProviderError::Http(resp.status().as_u16()));
        }

        let body: SummaryEnvelope = resp.json().await?;
        Ok(body
            .quote_summary
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|r| r.asset_profile)
            .and_then(|p| p.sector)
            .filter(|s| !s.is_empty()))
    }
}

// ─── Yahoo wire format ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error:  Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code:        String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta:       ChartMeta,
    #[serde(default)]
    timestamp:  Vec<i64>,
    indicators: Indicators,
    events:     Option<ChartEvents>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    low:   Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartEvents {
    #[serde(default)]
    dividends: HashMap<String, DividendEvent>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date:   i64,
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<SummaryResult>>,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    #[serde(rename = "assetProfile")]
    asset_profile: Option<AssetProfile>,
}

#[derive(Debug, Deserialize)]
struct AssetProfile {
    sector: Option<String>,
}

fn local_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmtoffset, 0).map(|dt| dt.date_naive())
}

fn parse_chart(ticker: &str, envelope: ChartEnvelope) -> Result<PriceHistory, ProviderError> {
    if let Some(err) = envelope.chart.error {
        return Err(if err.code == "Not Found" {
            ProviderError::NoData(ticker.to_string())
        } else {
            ProviderError::Upstream(format!("{}: {}", err.code, err.description))
        });
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ProviderError::NoData(ticker.to_string()))?;

    let offset = result.meta.gmtoffset;
    let series = result.indicators.quote.into_iter().next().unwrap_or_default();
    let at = |v: &Vec<Option<f64>>, i: usize| v.get(i).copied().flatten();

    let mut bars: Vec<DailyBar> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            // Halted days come back as nulls.
            Some(DailyBar {
                date:  local_date(ts, offset)?,
                low:   at(&series.low, i)?,
                close: at(&series.close, i)?,
            })
        })
        .collect();
    bars.sort_by_key(|b| b.date);

    if bars.is_empty() {
        return Err(ProviderError::NoData(ticker.to_string()));
    }

    let mut dividends: Vec<Dividend> = result
        .events
        .map(|e| e.dividends.into_values().collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|d| {
            Some(Dividend {
                date:   local_date(d.date, offset)?,
                amount: d.amount,
            })
        })
        .collect();
    dividends.sort_by_key(|d| d.date);

    Ok(PriceHistory { bars, dividends })
}

// ─── Tests ────────────────────────────────────────────────────────────────────
