use axum::{extract::State, response::Response, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::webserver::{state::AppState, utils::success_response, ws::HubMetricsSnapshot};

/// Runtime statistics
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub version: String,
    pub uptime_seconds: u64,
    pub components: Vec<String>,
    pub active_connections: usize,
    pub hub: HubMetricsSnapshot,
}

pub fn routes(path: &str) -> Router<Arc<AppState>> {
    Router::new().route(path, get(stats))
}

/// GET <stats_path>
async fn stats(State(state): State<Arc<AppState>>) -> Response {
    let clients = state.mist.clients();

    success_response(StatsResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        components: state.mist.components().names().await,
        active_connections: clients.len().await,
        hub: clients.metrics().snapshot(),
    })
}
