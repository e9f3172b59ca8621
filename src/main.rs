//! # Stock Monitor — Personal Watchlist Alerts
//!
//! ## Architecture Overview
//!
//! ```text
//!  ┌──────────────┐  read (sha)   ┌──────────────────────┐  history   ┌──────────────┐
//!  │  GitHub      │ ─────────────▶│   BatchRunner        │◀───────────│  Yahoo chart │
//!  │  watchlist   │               │   ─ reconcile()      │            │  API         │
//!  │  .json       │ ◀─────────────│   ─ one write-back   │            └──────────────┘
//!  └──────────────┘  write (sha)  └──────────────────────┘
//!         ▲                                │ alerts
//!         │ Transaction per mutation       ▼
//!  ┌──────────────┐               ┌──────────────────────┐
//!  │  Manager API │               │  LINE push           │
//!  │  (axum)      │──────────────▶│                      │
//!  └──────────────┘  manual check └──────────────────────┘
//! ```
//!
//! ## Commands
//!
//! | Invocation            | Behaviour                                        |
//! |-----------------------|--------------------------------------------------|
//! | `stock-monitor`       | one batch pass (scheduler entry point)           |
//! | `stock-monitor run`   | same as above                                    |
//! | `stock-monitor serve` | interactive manager API on `BIND_ADDR`           |
//!
//! Configuration keys are listed in [`config`].

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod auth;
mod config;
mod engine;
mod error;
mod market;
mod models;
mod notify;
mod routes;
mod runner;
mod state;
mod store;

#[cfg(test)]
mod testing;

use config::Config;
use market::YahooQuoteProvider;
use notify::LinePushNotifier;
use runner::BatchRunner;
use state::build_state;
use store::GithubStore;

const USER_AGENT: &str = concat!("stock-monitor/", env!("CARGO_PKG_VERSION"));

enum Command {
    Run,
    Serve,
}

fn parse_command() -> anyhow::Result<Command> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["run"] => Ok(Command::Run),
        ["serve"] => Ok(Command::Serve),
        other => bail!("unknown arguments {other:?} (usage: stock-monitor [run|serve])"),
    }
}

// ─── Entry Point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env (optional; the scheduler can use real env vars) ────────
    dotenvy::dotenv().ok();

    // ── 2. Initialise structured logging ─────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env()
            .add_directive("stock_monitor=debug".parse()?)
            .add_directive("tower_http=info".parse()?)
            .add_directive("reqwest=warn".parse()?))
        .init();

    let command = parse_command()?;

    // ── 3. Configuration (fatal before any entry is touched) ─────────────────
    let config = Config::from_env().context("failed to load configuration")?;

    // ── 4. Collaborators ─────────────────────────────────────────────────────
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.http_timeout)
        .build()
        .context("failed to build HTTP client")?;

    let store = GithubStore::new(client.clone(), config.store.clone());
    let provider = YahooQuoteProvider::new(client.clone(), config.quote_api_url.clone());
    let notifier = LinePushNotifier::new(client, &config.notify);

    match command {
        Command::Run => {
            info!(repo = %config.store.repo, path = %config.store.path, "📈 Stock monitor — batch run");
            let report = BatchRunner::new(&store, &provider, &notifier, config.entry_delay)
                .run()
                .await
                .context("batch run failed")?;
            info!(?report, "Done");
        }
        Command::Serve => {
            info!(
                r#"

  ╔═══════════════════════════════════════════════╗
  ║        STOCK MONITOR — Manager API            ║
  ║        Rust + Axum  ·  Watchlist & Alerts     ║
  ╚═══════════════════════════════════════════════╝"#
            );

            let state = build_state(
                Arc::new(store),
                Arc::new(provider),
                Arc::new(notifier),
                config.api_key.clone(),
            );
            if state.api_key.is_none() {
                tracing::warn!("⚠️ API_KEY not set — manager API is open to anyone who can reach it");
            }
            let app = routes::router(state);

            info!(addr = ?config.bind_addr, "🚀 Manager API starting");
            let listener = tokio::net::TcpListener::bind(config.bind_addr)
                .await
                .with_context(|| format!("failed to bind {}", config.bind_addr))?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
