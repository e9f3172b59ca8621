//! # state
//!
//! Shared handles injected into every manager handler. No watchlist data
//! lives here: each request reads the store fresh and writes through a
//! [`crate::store::Transaction`].

use std::sync::Arc;

use crate::market::QuoteProvider;
use crate::notify::Notifier;
use crate::store::WatchlistStore;

#[derive(Clone)]
pub struct AppState {
    pub store:    Arc<dyn WatchlistStore>,
    pub provider: Arc<dyn QuoteProvider>,
    pub notifier: Arc<dyn Notifier>,
    /// `X-API-Key` expected on every request except `/health`; `None` = open.
    pub api_key:  Option<String>,
}

pub type SharedState = Arc<AppState>;

pub fn build_state(
    store: Arc<dyn WatchlistStore>,
    provider: Arc<dyn QuoteProvider>,
    notifier: Arc<dyn Notifier>,
    api_key: Option<String>,
) -> SharedState {
    Arc::new(AppState { store, provider, notifier, api_key })
}
