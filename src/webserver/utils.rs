/// Response helpers shared by route handlers
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

/// 200 with a JSON body
pub fn success_response<T: Serialize>(data: T) -> Response {
    Json(data).into_response()
}

/// Status code with `{"error": message}`
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
