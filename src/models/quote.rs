//! # models::quote
//!
//! Market data as handed over by the quote provider: raw daily bars
//! ([`PriceHistory`]) and the per-run digest the engine consumes
//! ([`QuoteSnapshot`]).

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::entry::QuoteCache;

// ─── LookbackWindow ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookbackWindow {
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "3y")]
    ThreeYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl LookbackWindow {
    /// First calendar day covered by the window, counted back from `as_of`
    /// (the date of the most recent bar).
    pub fn start(self, as_of: NaiveDate) -> NaiveDate {
        let months_back = match self {
            LookbackWindow::YearToDate => {
                return NaiveDate::from_ymd_opt(as_of.year(), 1, 1).unwrap_or(as_of);
            }
            LookbackWindow::OneYear => 12,
            LookbackWindow::ThreeYears => 36,
            LookbackWindow::FiveYears => 60,
        };
        // Exclusive of the day exactly N months back, as a rolling window.
        as_of
            .checked_sub_months(Months::new(months_back))
            .and_then(|d| d.succ_opt())
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn label(self) -> &'static str {
        match self {
            LookbackWindow::YearToDate => "ytd",
            LookbackWindow::OneYear => "1y",
            LookbackWindow::ThreeYears => "3y",
            LookbackWindow::FiveYears => "5y",
        }
    }
}

impl std::str::FromStr for LookbackWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ytd" => Ok(LookbackWindow::YearToDate),
            "1y" => Ok(LookbackWindow::OneYear),
            "3y" => Ok(LookbackWindow::ThreeYears),
            "5y" => Ok(LookbackWindow::FiveYears),
            other => Err(format!("unknown lookback window '{other}' (use ytd, 1y, 3y or 5y)")),
        }
    }
}

// ─── History ──────────────────────────────────────────────────────────────────

/// One trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyBar {
    pub date:  NaiveDate,
    pub low:   f64,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dividend {
    pub date:   NaiveDate,
    pub amount: f64,
}

/// Time-ordered bars (oldest first) plus dividend events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    pub bars:      Vec<DailyBar>,
    pub dividends: Vec<Dividend>,
}

impl PriceHistory {
    pub fn latest(&self) -> Option<&DailyBar> {
        self.bars.last()
    }

    /// Lowest intraday low inside `window`, anchored at the latest bar.
    pub fn period_low(&self, window: LookbackWindow) -> Option<f64> {
        let as_of = self.latest()?.date;
        let start = window.start(as_of);
        self.bars
            .iter()
            .filter(|b| b.date >= start)
            .map(|b| b.low)
            .reduce(f64::min)
    }

    /// Sum of dividends paid in the twelve months up to the latest bar.
    pub fn trailing_annual_dividend(&self) -> Option<f64> {
        let as_of = self.latest()?.date;
        let start = LookbackWindow::OneYear.start(as_of);
        Some(
            self.dividends
                .iter()
                .filter(|d| d.date >= start && d.date <= as_of)
                .map(|d| d.amount)
                .sum(),
        )
    }
}

// ─── QuoteSnapshot ────────────────────────────────────────────────────────────

/// What the engine knows about one ticker for one run.
///
/// `is_live == false` means the provider call failed and every value below is
/// the entry's cached fallback (possibly absent).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteSnapshot {
    pub current_price:        Option<f64>,
    pub low_year_to_date:     Option<f64>,
    pub low_3y:               Option<f64>,
    pub low_5y:               Option<f64>,
    pub sector:               Option<String>,
    pub annual_dividend_rate: Option<f64>,
    pub is_live:              bool,
}

impl QuoteSnapshot {
    /// Degraded snapshot built from cached values.
    pub fn fallback(cache: &QuoteCache) -> Self {
        Self {
            current_price:        cache.last_price,
            low_year_to_date:     cache.low_ytd,
            low_3y:               cache.low_3y,
            low_5y:               cache.low_5y,
            sector:               cache.sector.clone(),
            annual_dividend_rate: cache.annual_dividend,
            is_live:              false,
        }
    }

    /// Live snapshot from freshly fetched history. `None` when the history
    /// holds no bars. Sector falls back to the cache because it does not come
    /// from the price series.
    pub fn from_history(
        history: &PriceHistory,
        sector: Option<String>,
        cache: &QuoteCache,
    ) -> Option<Self> {
        let latest = history.latest()?;
        Some(Self {
            current_price:        Some(latest.close),
            low_year_to_date:     history.period_low(LookbackWindow::YearToDate),
            low_3y:               history.period_low(LookbackWindow::ThreeYears),
            low_5y:               history.period_low(LookbackWindow::FiveYears),
            sector:               sector.or_else(|| cache.sector.clone()),
            annual_dividend_rate: history.trailing_annual_dividend(),
            is_live:              true,
        })
    }

    /// The cache a live run leaves behind.
    pub fn to_cache(&self) -> QuoteCache {
        QuoteCache {
            last_price:      self.current_price,
            low_ytd:         self.low_year_to_date,
            low_3y:          self.low_3y,
            low_5y:          self.low_5y,
            sector:          self.sector.clone(),
            annual_dividend: self.annual_dividend_rate,
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bar(date: NaiveDate, low: f64, close: f64) -> DailyBar {
        DailyBar { date, low, close }
    }

    fn history() -> PriceHistory {
        PriceHistory {
            bars: vec![
                bar(d(2021, 3, 1), 700.0, 720.0),   // only inside 5y
                bar(d(2023, 6, 1), 850.0, 870.0),   // inside 3y
                bar(d(2025, 12, 30), 880.0, 900.0), // inside 1y, not ytd
                bar(d(2026, 1, 5), 950.0, 980.0),
                bar(d(2026, 2, 2), 990.0, 1000.0),
            ],
            dividends: vec![
                Dividend { date: d(2025, 3, 28), amount: 30.0 },
                Dividend { date: d(2025, 9, 29), amount: 35.0 },
                Dividend { date: d(2024, 9, 27), amount: 25.0 },
            ],
        }
    }

    #[test]
    fn window_starts() {
        let as_of = d(2026, 2, 2);
        assert_eq!(LookbackWindow::YearToDate.start(as_of), d(2026, 1, 1));
        assert_eq!(LookbackWindow::OneYear.start(as_of), d(2025, 2, 3));
        assert_eq!(LookbackWindow::ThreeYears.start(as_of), d(2023, 2, 3));
        assert_eq!(LookbackWindow::FiveYears.start(as_of), d(2021, 2, 3));
    }

    #[test]
    fn period_lows_are_anchored_at_latest_bar() {
        let h = history();
        assert_eq!(h.period_low(LookbackWindow::YearToDate), Some(950.0));
        assert_eq!(h.period_low(LookbackWindow::OneYear), Some(880.0));
        assert_eq!(h.period_low(LookbackWindow::ThreeYears), Some(850.0));
        assert_eq!(h.period_low(LookbackWindow::FiveYears), Some(700.0));
    }

    #[test]
    fn trailing_dividend_sums_last_twelve_months() {
        assert_eq!(history().trailing_annual_dividend(), Some(65.0));
    }

    #[test]
    fn empty_history_has_no_snapshot() {
        let snap = QuoteSnapshot::from_history(&PriceHistory::default(), None, &QuoteCache::default());
        assert!(snap.is_none());
    }

    #[test]
    fn live_snapshot_keeps_cached_sector_when_unknown() {
        let cache = QuoteCache { sector: Some("Industrials".into()), ..Default::default() };
        let snap = QuoteSnapshot::from_history(&history(), None, &cache).unwrap();

        assert!(snap.is_live);
        assert_eq!(snap.current_price, Some(1000.0));
        assert_eq!(snap.low_5y, Some(700.0));
        assert_eq!(snap.sector.as_deref(), Some("Industrials"));
    }

    #[test]
    fn fallback_mirrors_cache() {
        let cache = QuoteCache { last_price: Some(1000.0), low_3y: Some(800.0), ..Default::default() };
        let snap = QuoteSnapshot::fallback(&cache);

        assert!(!snap.is_live);
        assert_eq!(snap.to_cache(), cache);
    }

    #[test]
    fn window_parsing() {
        assert_eq!("YTD".parse::<LookbackWindow>(), Ok(LookbackWindow::YearToDate));
        assert_eq!("3y".parse::<LookbackWindow>(), Ok(LookbackWindow::ThreeYears));
        assert!("2y".parse::<LookbackWindow>().is_err());
    }
}
