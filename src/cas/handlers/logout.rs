use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{error, info};

use super::client_ip;
use crate::cas::{
    cookies::{clear_cookie, extract_cookie},
    state::CasState,
    tgc::TGC_COOKIE_NAME,
};

#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 200, description = "Session ended (or there was none)", content_type = "text/plain")
    ),
    tag = "cas"
)]
// axum handler for logout
pub async fn logout(headers: HeaderMap, state: Extension<Arc<CasState>>) -> impl IntoResponse {
    let revoked =
        extract_cookie(&headers, TGC_COOKIE_NAME).and_then(|cookie| state.tgc().revoke(&cookie));

    let body = if let Some(tgt) = revoked {
        info!("Logout {} from {}", tgt.user, client_ip(&headers));
        "User has been logged out"
    } else {
        "User is not logged in"
    };

    // Cleared even when nothing was revoked.
    let mut response_headers = HeaderMap::new();
    match clear_cookie(state.config(), TGC_COOKIE_NAME) {
        Ok(value) => {
            response_headers.insert(SET_COOKIE, value);
        }
        Err(err) => error!("Failed to build TGC cookie: {err}"),
    }

    (response_headers, body)
}
