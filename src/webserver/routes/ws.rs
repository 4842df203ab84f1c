/// WebSocket endpoint
///
/// Upgrades the request and hands the socket to the connection handler.
use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
    routing::get,
    Router,
};

use crate::{
    logger::{self, LogTag},
    webserver::{state::AppState, ws::connection::handle_connection},
};

pub fn routes(path: &str) -> Router<Arc<AppState>> {
    Router::new().route(path, get(ws_upgrade))
}

/// GET <ws_path>
async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    logger::debug(LogTag::Webserver, "WebSocket upgrade requested");

    let clients = state.mist.clients().clone();
    let settings = state.config.websocket.clone();
    ws.on_upgrade(move |socket| handle_connection(socket, clients, settings))
}
