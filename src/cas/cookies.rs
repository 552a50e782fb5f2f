//! Cookie header helpers.

use axum::http::{header::COOKIE, header::InvalidHeaderValue, HeaderMap, HeaderValue};

use super::state::CasConfig;

/// Value of the cookie called `name`, searching every `Cookie` header.
pub(crate) fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `HttpOnly`, `SameSite=Strict` cookie scoped to the base path.
pub(crate) fn set_cookie(
    config: &CasConfig,
    name: &str,
    value: &str,
    max_age_seconds: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let path = config.cookie_path();
    let mut cookie = format!(
        "{name}={value}; Path={path}; HttpOnly; SameSite=Strict; Max-Age={max_age_seconds}"
    );
    if config.secure_cookie() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn clear_cookie(
    config: &CasConfig,
    name: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    set_cookie(config, name, "deleted", 0)
}
