//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{NotifyError, ProviderError, StoreError};
use crate::market::QuoteProvider;
use crate::models::{LookbackWindow, PriceHistory, QuoteCache, QuoteSnapshot, WatchlistDocument};
use crate::notify::Notifier;
use crate::store::{VersionToken, Versioned, WatchlistStore};

// ─── Store ────────────────────────────────────────────────────────────────────

struct StoreState {
    doc:     WatchlistDocument,
    version: u64,
    writes:  usize,
}

/// Versioned store whose token is a write counter.
pub struct MemoryStore {
    state:     Mutex<StoreState>,
    fail_read: bool,
}

impl MemoryStore {
    pub fn new(doc: WatchlistDocument) -> Self {
        Self {
            state:     Mutex::new(StoreState { doc, version: 1, writes: 0 }),
            fail_read: false,
        }
    }

    pub fn with_json(value: serde_json::Value) -> Self {
        Self::new(serde_json::from_value(value).expect("valid watchlist json"))
    }

    pub fn unreadable() -> Self {
        Self { fail_read: true, ..Self::new(WatchlistDocument::default()) }
    }

    pub fn snapshot(&self) -> WatchlistDocument {
        self.state.lock().unwrap().doc.clone()
    }

    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    /// Unconditional write by "someone else": bumps the version.
    pub fn overwrite(&self, doc: WatchlistDocument) {
        let mut state = self.state.lock().unwrap();
        state.doc = doc;
        state.version += 1;
    }
}

#[async_trait]
impl WatchlistStore for MemoryStore {
    async fn read(&self) -> Result<Versioned<WatchlistDocument>, StoreError> {
        if self.fail_read {
            return Err(StoreError::Http { status: 503, body: "unavailable".into() });
        }
        let state = self.state.lock().unwrap();
        Ok(Versioned {
            value:   state.doc.clone(),
            version: VersionToken::new(state.version.to_string()),
        })
    }

    async fn write(
        &self,
        doc: &WatchlistDocument,
        version: &VersionToken,
        _message: &str,
    ) -> Result<VersionToken, StoreError> {
        let mut state = self.state.lock().unwrap();
        if version.as_str() != Some(state.version.to_string().as_str()) {
            return Err(StoreError::Conflict);
        }
        state.doc = doc.clone();
        state.version += 1;
        state.writes += 1;
        Ok(VersionToken::new(state.version.to_string()))
    }
}

// ─── Provider ─────────────────────────────────────────────────────────────────

/// Hands out preset live snapshots per ticker; unknown tickers fail.
#[derive(Default)]
pub struct ScriptedProvider {
    snapshots: HashMap<String, QuoteSnapshot>,
    histories: HashMap<String, PriceHistory>,
    calls:     Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(mut self, ticker: &str, price: f64, ytd: f64, low_3y: f64, low_5y: f64) -> Self {
        self.snapshots.insert(
            ticker.to_string(),
            QuoteSnapshot {
                current_price:        Some(price),
                low_year_to_date:     Some(ytd),
                low_3y:               Some(low_3y),
                low_5y:               Some(low_5y),
                sector:               None,
                annual_dividend_rate: None,
                is_live:              true,
            },
        );
        self
    }

    pub fn with_history(mut self, ticker: &str, history: PriceHistory) -> Self {
        self.histories.insert(ticker.to_string(), history);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuoteProvider for ScriptedProvider {
    async fn history(
        &self,
        ticker: &str,
        _window: LookbackWindow,
    ) -> Result<PriceHistory, ProviderError> {
        self.histories
            .get(ticker)
            .cloned()
            .ok_or_else(|| ProviderError::NoData(ticker.to_string()))
    }

    async fn snapshot(&self, ticker: &str, cache: &QuoteCache) -> QuoteSnapshot {
        self.calls.lock().unwrap().push(ticker.to_string());
        self.snapshots
            .get(ticker)
            .cloned()
            .unwrap_or_else(|| QuoteSnapshot::fallback(cache))
    }
}

// ─── Notifier ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    sent:    Mutex<Vec<String>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send is rejected (still recorded as attempted).
    pub fn failing() -> Self {
        Self { failing: true, ..Self::default() }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(text.to_string());
        if self.failing {
            return Err(NotifyError::Rejected { status: 500, body: "down".into() });
        }
        Ok(())
    }
}
