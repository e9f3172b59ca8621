//! # routes — Interactive Manager API
//!
//! | Method | Path                              | Description                          |
//! |--------|-----------------------------------|--------------------------------------|
//! | GET    | `/health`                         | liveness                             |
//! | GET    | `/api/watchlist`                  | portfolio view                       |
//! | POST   | `/api/watchlist`                  | add entry                            |
//! | PUT    | `/api/watchlist/:name`            | edit entry / record extra purchase   |
//! | DELETE | `/api/watchlist/:name`            | remove entry                         |
//! | POST   | `/api/watchlist/:name/check`      | on-demand recheck                    |
//! | GET    | `/api/quote/:ticker?period=`      | ad-hoc period-low check              |
//! | GET    | `/api/settings`                   | global settings                      |
//! | PUT    | `/api/settings`                   | update global settings               |

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{require_api_key, HEALTH_PATH};
use crate::state::SharedState;

pub mod quote;
pub mod settings;
pub mod watchlist;

pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(HEALTH_PATH,                    get(health_check))
        // ── Watchlist ────────────────────────────────────────────────────────
        .route("/api/watchlist",               get(watchlist::list_entries).post(watchlist::add_entry))
        .route("/api/watchlist/:name",         put(watchlist::edit_entry).delete(watchlist::remove_entry))
        .route("/api/watchlist/:name/check",   post(watchlist::check_entry))
        // ── Ad-hoc quotes ────────────────────────────────────────────────────
        .route("/api/quote/:ticker",           get(quote::check_quote))
        // ── Settings ─────────────────────────────────────────────────────────
        .route("/api/settings",                get(settings::get_settings).put(settings::update_settings))
        // ── Middleware ───────────────────────────────────────────────────────
        .layer(axum::middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "service": "stock-monitor" }))
}

// ─── Test helpers ─────────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::test_support::{call, harness};
    use crate::testing::ScriptedProvider;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn api_key_guards_everything_but_health() {
        let h = harness(json!({}), ScriptedProvider::new(), Some("secret"));

        let (status, _) = call(&h.app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&h.app, "GET", "/api/watchlist", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn open_when_no_api_key_configured() {
        let h = harness(json!({}), ScriptedProvider::new(), None);
        let (status, _) = call(&h.app, "GET", "/api/watchlist", None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
