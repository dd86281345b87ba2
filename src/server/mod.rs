//! HTTP surface: axum server exposing the analysis endpoints and the
//! login/logout relay to the upstream game API.

mod analyze;
mod auth;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::history::FileStore;
use crate::upstream::UpstreamClient;

/// Holds the forwarded upstream session cookie pairs (percent-encoded,
/// since the pairs themselves contain `;` and `=`).
pub const SESSION_COOKIE: &str = "upstream_session";
/// Which configured user is logged in. Readable by the UI.
pub const USER_COOKIE: &str = "authenticated_user";

/// Shared state accessible by all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub client: Arc<UpstreamClient>,
    pub store: Arc<FileStore>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = UpstreamClient::new(&config.upstream)?;
        let store = FileStore::new(&config.data);
        Ok(Self {
            config: Arc::new(config),
            client: Arc::new(client),
            store: Arc::new(store),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/analyzeTeam", get(analyze::analyze_team))
        .route("/api/recompute", post(analyze::recompute_ledger))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState) -> Result<()> {
    let addr = format!(
        "{}:{}",
        state.config.server.bind, state.config.server.port
    );
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, router(state))
        .await
        .context("Server error")
}

/// Read one cookie from the request headers.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// The forwarded upstream session, decoded back to raw cookie pairs.
/// Empty when the user never logged in against the upstream.
pub(crate) fn upstream_session(headers: &HeaderMap) -> String {
    cookie_value(headers, SESSION_COOKIE)
        .and_then(|raw| urlencoding::decode(&raw).ok().map(|s| s.into_owned()))
        .unwrap_or_default()
}
