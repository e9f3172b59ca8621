//! # models::entry
//!
//! The persisted watchlist: [`WatchlistDocument`] holding one
//! [`WatchlistEntry`] per display name plus typed [`GlobalSettings`].
//!
//! ## Wire format
//! ```json
//! {
//!   "Toyota":   { "ticker": "7203.T", "qty": 100, "avg_cost": 2500, "alert_pct": 10,
//!                 "last_price": 2710.5, "low_ytd": 2400, "low_3y": 1800, "low_5y": 1400,
//!                 "sector": "Consumer Cyclical", "annual_div": 75 },
//!   "Nintendo": "7974.T",
//!   "_settings": { "default_alert_pct": 8 }
//! }
//! ```
//! Keys starting with `_` never reach the entry map: `_settings` becomes
//! [`GlobalSettings`], any other reserved key is carried through untouched.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::lenient;

/// Threshold used when neither the entry nor `_settings` names one.
pub const DEFAULT_ALERT_PCT: f64 = 10.0;

/// Prefix marking configuration pseudo-entries.
pub const RESERVED_PREFIX: char = '_';

pub const SETTINGS_KEY: &str = "_settings";

pub fn is_reserved_name(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

// ─── QuoteCache ───────────────────────────────────────────────────────────────

/// Last successfully observed market values for one entry.
///
/// Only a live reconciliation ever rewrites these; they are the fallback
/// whenever the provider cannot be reached.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuoteCache {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_price:      Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_ytd:         Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_3y:          Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_5y:          Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector:          Option<String>,
    #[serde(rename = "annual_div", skip_serializing_if = "Option::is_none")]
    pub annual_dividend: Option<f64>,
}

// ─── WatchlistEntry ───────────────────────────────────────────────────────────

/// One tracked position. The display name is the key in
/// [`WatchlistDocument::entries`], not a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistEntry {
    #[serde(rename = "ticker")]
    pub ticker_symbol:       String,
    /// Shares held. `0` = pure price watch, no cost basis.
    #[serde(rename = "qty")]
    pub quantity:            f64,
    /// Weighted-average acquisition price per share.
    #[serde(rename = "avg_cost")]
    pub average_cost:        f64,
    #[serde(rename = "alert_pct", skip_serializing_if = "Option::is_none")]
    pub alert_threshold_pct: Option<f64>,
    #[serde(flatten)]
    pub cache:               QuoteCache,
    /// Keys this version does not know about, written back verbatim.
    #[serde(flatten)]
    pub extra:               BTreeMap<String, Value>,
}

impl WatchlistEntry {
    pub fn new(ticker: impl Into<String>, quantity: f64, average_cost: f64) -> Self {
        Self {
            ticker_symbol:       ticker.into(),
            quantity,
            average_cost,
            alert_threshold_pct: None,
            cache:               QuoteCache::default(),
            extra:               BTreeMap::new(),
        }
    }

    /// Price-watch entry without a position.
    pub fn watch(ticker: impl Into<String>) -> Self {
        Self::new(ticker, 0.0, 0.0)
    }

    pub fn with_alert_pct(mut self, pct: f64) -> Self {
        self.alert_threshold_pct = Some(pct);
        self
    }
}

/// Accepted on-disk shapes of an entry.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    /// Earliest scheduled script stored `"Name": "TICKER"`.
    Ticker(String),
    Record(EntryRecord),
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct EntryRecord {
    #[serde(deserialize_with = "lenient::text")]
    ticker:     Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    qty:        Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    avg_cost:   Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    alert_pct:  Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    last_price: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    low_ytd:    Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    low_3y:     Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    low_5y:     Option<f64>,
    #[serde(deserialize_with = "lenient::text")]
    sector:     Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    annual_div: Option<f64>,
    #[serde(flatten)]
    extra:      BTreeMap<String, Value>,
}

impl<'de> Deserialize<'de> for WatchlistEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawEntry::deserialize(deserializer).map(Into::into)
    }
}

impl From<RawEntry> for WatchlistEntry {
    fn from(raw: RawEntry) -> Self {
        match raw {
            RawEntry::Ticker(ticker) => WatchlistEntry::watch(ticker.trim()),
            RawEntry::Record(r) => WatchlistEntry {
                ticker_symbol:       r.ticker.unwrap_or_default().trim().to_string(),
                quantity:            r.qty.unwrap_or(0.0),
                average_cost:        r.avg_cost.unwrap_or(0.0),
                alert_threshold_pct: r.alert_pct,
                cache: QuoteCache {
                    last_price:      r.last_price,
                    low_ytd:         r.low_ytd,
                    low_3y:          r.low_3y,
                    low_5y:          r.low_5y,
                    sector:          r.sector,
                    annual_dividend: r.annual_div,
                },
                extra: r.extra,
            },
        }
    }
}

// ─── GlobalSettings ───────────────────────────────────────────────────────────

/// Contents of the `_settings` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_alert_pct: Option<f64>,
    /// Settings this version does not know about, written back verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl GlobalSettings {
    pub fn is_empty(&self) -> bool {
        self.default_alert_pct.is_none() && self.extra.is_empty()
    }

    /// Entry threshold → global default → [`DEFAULT_ALERT_PCT`].
    pub fn threshold_for(&self, entry: &WatchlistEntry) -> f64 {
        entry
            .alert_threshold_pct
            .or(self.default_alert_pct)
            .unwrap_or(DEFAULT_ALERT_PCT)
    }
}

// ─── WatchlistDocument ────────────────────────────────────────────────────────

/// The whole persisted watchlist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchlistDocument {
    /// Real entries only, iterated in display-name order.
    pub entries:  BTreeMap<String, WatchlistEntry>,
    pub settings: GlobalSettings,
    /// `_`-prefixed keys other than `_settings`.
    reserved:     BTreeMap<String, Value>,
}

impl WatchlistDocument {
    pub fn entry(&self, name: &str) -> Option<&WatchlistEntry> {
        self.entries.get(name)
    }
}

impl<'de> Deserialize<'de> for WatchlistDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let mut doc = WatchlistDocument::default();

        for (key, value) in raw {
            if key == SETTINGS_KEY {
                doc.settings = serde_json::from_value(value)
                    .map_err(|e| D::Error::custom(format!("invalid {SETTINGS_KEY}: {e}")))?;
            } else if is_reserved_name(&key) {
                doc.reserved.insert(key, value);
            } else {
                let entry = serde_json::from_value(value)
                    .map_err(|e| D::Error::custom(format!("invalid entry '{key}': {e}")))?;
                doc.entries.insert(key, entry);
            }
        }

        Ok(doc)
    }
}

impl Serialize for WatchlistDocument {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        for (name, entry) in &self.entries {
            map.serialize_entry(name, entry)?;
        }
        if !self.settings.is_empty() {
            map.serialize_entry(SETTINGS_KEY, &self.settings)?;
        }
        for (key, value) in &self.reserved {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
