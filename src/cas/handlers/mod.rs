//! CAS endpoints and shared request helpers.

pub mod health;
pub mod login;
pub mod logout;
pub mod validate;

use axum::{
    http::{
        header::{HOST, LOCATION},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use tracing::error;

use super::state::CasConfig;

/// Client address for log lines, taken from common proxy headers.
pub(crate) fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        })
        .unwrap_or("-")
        .to_string()
}

/// Externally visible URL of the broker root, including the base path.
pub(crate) fn local_url(headers: &HeaderMap, config: &CasConfig) -> String {
    let origin = config.public_url().map_or_else(
        || {
            let host = headers
                .get(HOST)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("localhost");
            let scheme = headers
                .get("x-forwarded-proto")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .filter(|value| *value == "https")
                .unwrap_or("http");
            format!("{scheme}://{host}")
        },
        str::to_string,
    );
    format!("{origin}{}", config.base_path())
}

/// Redirect carrying any extra headers (cookies) already collected.
pub(crate) fn redirect(status: StatusCode, location: &str, mut headers: HeaderMap) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            headers.insert(LOCATION, value);
            (status, headers).into_response()
        }
        Err(err) => {
            error!("Invalid redirect location: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
