use crate::webserver::state::AppState;
use axum::Router;
use std::sync::Arc;

pub mod components;
pub mod stats;
pub mod ws;

/// Assemble every route; paths come from the webserver configuration
pub fn create_router(state: Arc<AppState>) -> Router {
    let paths = state.config.webserver.clone();

    Router::new()
        .merge(ws::routes(&paths.ws_path))
        .merge(components::routes(&paths.components_path))
        .merge(stats::routes(&paths.stats_path))
        .with_state(state)
}
