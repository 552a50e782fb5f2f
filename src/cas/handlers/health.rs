use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Json},
};
use serde_json::json;
use std::sync::Arc;

use crate::{cas::state::CasState, GIT_COMMIT_HASH};

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is running", content_type = "application/json")
    ),
    tag = "health"
)]
// axum handler for health
pub async fn health(state: Extension<Arc<CasState>>) -> impl IntoResponse {
    let body = Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "build": GIT_COMMIT_HASH,
        "tickets": state.store().len(),
    }));

    let short_hash = GIT_COMMIT_HASH.get(0..7).unwrap_or("");

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&format!(
        "{}:{}:{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_hash
    )) {
        headers.insert("X-App", value);
    }

    (headers, body)
}
