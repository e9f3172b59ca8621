//! # runner — Batch Runner
//!
//! One full pass over the watchlist:
//!
//! ```text
//! read document (one version token)
//!   for each entry, in name order:
//!     1. quote snapshot (cached values as fallback)
//!     2. reconcile → updated entry + alerts
//!     3. push each alert immediately
//!     4. pause (provider rate limit)
//! write back once, only if something changed
//! ```
//!
//! Notifications are not transactional with persistence: a failed write-back
//! leaves already-sent alerts standing and discards the in-memory state.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::engine::reconcile;
use crate::error::StoreError;
use crate::market::QuoteProvider;
use crate::models::{AlertEvent, Origin};
use crate::notify::Notifier;
use crate::store::{CommitOutcome, Transaction, WatchlistStore};

const COMMIT_MESSAGE: &str = "Update watchlist quote cache (scheduled run)";

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to load watchlist: {0}")]
    Load(#[source] StoreError),

    #[error("watchlist write-back failed after {alerts_sent} alert(s) were sent: {source}")]
    Persist {
        alerts_sent: usize,
        #[source]
        source:      StoreError,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub entries:       usize,
    /// Entries whose snapshot was a cached fallback.
    pub degraded:      usize,
    pub skipped:       usize,
    pub updated:       usize,
    pub alerts_sent:   usize,
    pub alerts_failed: usize,
    pub written:       bool,
}

pub struct BatchRunner<'a> {
    store:       &'a dyn WatchlistStore,
    provider:    &'a dyn QuoteProvider,
    notifier:    &'a dyn Notifier,
    entry_delay: Duration,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        store: &'a dyn WatchlistStore,
        provider: &'a dyn QuoteProvider,
        notifier: &'a dyn Notifier,
        entry_delay: Duration,
    ) -> Self {
        Self { store, provider, notifier, entry_delay }
    }

    pub async fn run(&self) -> Result<RunReport, RunError> {
        let mut txn = Transaction::begin(self.store).await.map_err(RunError::Load)?;
        let settings = txn.document().settings.clone();
        let names: Vec<String> = txn.document().entries.keys().cloned().collect();

        let mut report = RunReport { entries: names.len(), ..Default::default() };
        info!(entries = names.len(), "🔎 Batch run starting");

        for (i, name) in names.iter().enumerate() {
            if i > 0 && !self.entry_delay.is_zero() {
                tokio::time::sleep(self.entry_delay).await;
            }

            let Some(entry) = txn.document().entry(name).cloned() else {
                continue;
            };
            if entry.ticker_symbol.is_empty() {
                warn!(name = %name, "Entry has no ticker — skipped");
                report.skipped += 1;
                continue;
            }

            info!(name = %name, ticker = %entry.ticker_symbol, "Checking...");
            let snapshot = self.provider.snapshot(&entry.ticker_symbol, &entry.cache).await;
            if !snapshot.is_live {
                report.degraded += 1;
            }

            let outcome = reconcile(name, &entry, &snapshot, &settings);

            for alert in &outcome.alerts {
                if self.dispatch(alert).await {
                    report.alerts_sent += 1;
                } else {
                    report.alerts_failed += 1;
                }
            }

            if outcome.entry != entry {
                report.updated += 1;
                txn.document_mut().entries.insert(name.clone(), outcome.entry);
            }
        }

        match txn.commit(self.store, COMMIT_MESSAGE).await {
            Ok(CommitOutcome::Unchanged) => {}
            Ok(CommitOutcome::Written(version)) => {
                debug!(version = ?version.as_str(), "Batch results persisted");
                report.written = true;
            }
            Err(source) => {
                error!(error = %source, alerts_sent = report.alerts_sent, "❌ Watchlist write-back failed");
                return Err(RunError::Persist { alerts_sent: report.alerts_sent, source });
            }
        }

        info!(
            entries  = report.entries,
            degraded = report.degraded,
            skipped  = report.skipped,
            updated  = report.updated,
            alerts   = report.alerts_sent,
            failed   = report.alerts_failed,
            written  = report.written,
            "✅ Batch run complete"
        );
        Ok(report)
    }

    /// Delivery failures are logged, never propagated.
    async fn dispatch(&self, alert: &AlertEvent) -> bool {
        info!(
            name     = %alert.entry_name,
            ticker   = %alert.ticker_symbol,
            severity = alert.severity_label(),
            period_low = alert.is_period_low(),
            "🚨 Alert"
        );
        match self.notifier.send(&alert.notification_text(Origin::Scheduled)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(name = %alert.entry_name, error = %e, "⚠️ Notification failed — continuing");
                false
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
