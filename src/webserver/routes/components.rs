/// Component collection endpoint
///
/// Renders every instance of a component for the initial page load; live
/// updates then arrive over the WebSocket.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::{
    logger::{self, LogTag},
    webserver::{state::AppState, utils::error_response},
};

pub fn routes(base: &str) -> Router<Arc<AppState>> {
    Router::new().route(
        &format!("{}/:name", base.trim_end_matches('/')),
        get(render_component),
    )
}

/// GET <components_path>/:name
async fn render_component(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    let Some(component) = state.mist.components().get(&name).await else {
        return error_response(
            StatusCode::NOT_FOUND,
            &format!("Component '{}' not found", name),
        );
    };

    let rendered = component
        .render_all(
            state.mist.store().as_ref(),
            state.mist.renderer().as_ref(),
        )
        .await;

    match rendered {
        Ok(Some(html)) => Html(html).into_response(),
        Ok(None) => {
            logger::verbose(
                LogTag::Webserver,
                &format!("No data to render for component '{}'", name),
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            logger::error(
                LogTag::Webserver,
                &format!("Failed to render component '{}': {}", name, e),
            );
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}
