use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use wow_tools_backend::api::{self, AppState};
use wow_tools_backend::config::Config;
use wow_tools_backend::metrics;
use wow_tools_backend::raiderio::RaiderIoClient;
use wow_tools_backend::roster::RosterStore;
use wow_tools_backend::warband::WarbandOptions;
use wow_tools_backend::warcraftlogs::{CombatLogLookup, WarcraftLogsClient};

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "wow-tools-backend" }))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::load();
    metrics::register_metrics();

    let raiderio = Arc::new(RaiderIoClient::new(
        &config.raiderio_base_url,
        &config.user_agent,
        config.http_timeout,
    ));

    let combat_logs: Option<Arc<dyn CombatLogLookup>> = match config.warcraftlogs.clone() {
        Some(credentials) => Some(Arc::new(WarcraftLogsClient::new(
            credentials,
            &config.warcraftlogs_token_url,
            &config.warcraftlogs_api_url,
            &config.user_agent,
            config.http_timeout,
        ))),
        None => {
            tracing::warn!("WarcraftLogs credentials not set; combat-log endpoints disabled");
            None
        }
    };

    let state = AppState {
        characters: raiderio.clone(),
        affixes: raiderio.clone(),
        runs: raiderio,
        combat_logs,
        rosters: RosterStore::new(),
        warband: WarbandOptions {
            concurrency: config.warband_concurrency,
            candidate_timeout: config.warband_candidate_timeout,
        },
    };

    let mut app = Router::new()
        .route("/health", get(health_check))
        .merge(api::router(state));

    // Serve the built frontend, falling back to index.html for client routes.
    if let Some(dir) = &config.static_dir {
        tracing::info!("Serving static files from {}", dir.display());
        let index = dir.join("index.html");
        app = app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    let app = app.layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!("WoW tools backend listening on {addr}");
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
