//! Service URL handling.

use url::Url;

/// Canonical form of a service URL: `scheme://host[:port]path`, exactly as
/// given.
///
/// Only the query string and fragment are cut off; host case, ports and an
/// empty path are left alone so a CAS v1 client can send the same string back.
/// Returns `None` for an empty service or one that does not parse as a URL
/// with a host.
#[must_use]
pub fn canonical(service: &str) -> Option<String> {
    let service = service.trim();
    if service.is_empty() {
        return None;
    }
    Url::parse(service).ok()?.host_str()?;

    let end = service.find(['?', '#']).unwrap_or(service.len());
    Some(service[..end].to_string())
}

/// Location to send the browser to: the canonical service with its original
/// query parameters (minus any stale `ticket`) and the new `ticket` appended.
#[must_use]
pub fn redirect_with_ticket(service: &str, ticket: &str) -> Option<String> {
    let canonical = canonical(service)?;
    let original = Url::parse(service.trim()).ok()?;

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in original.query_pairs().filter(|(key, _)| *key != "ticket") {
        query.append_pair(&key, &value);
    }
    query.append_pair("ticket", ticket);

    Some(format!("{canonical}?{}", query.finish()))
}
