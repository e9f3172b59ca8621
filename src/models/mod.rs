//! Domain models shared across the batch runner and the manager API.

pub mod alert;
pub mod entry;
mod lenient;
pub mod quote;

pub use alert::{AlertEvent, AlertKind, LowPeriod, Origin, PnlDirection};
pub use entry::{GlobalSettings, QuoteCache, WatchlistDocument, WatchlistEntry};
pub use quote::{DailyBar, Dividend, LookbackWindow, PriceHistory, QuoteSnapshot};
