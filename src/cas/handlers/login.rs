use axum::{
    extract::{Extension, Form, Query},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use regex::Regex;
use serde::Deserialize;
use std::{fmt, sync::Arc};
use tracing::{debug, error, info, warn};
use utoipa::{IntoParams, ToSchema};

use super::{client_ip, local_url, redirect};
use crate::{
    cas::{
        cookies::{extract_cookie, set_cookie},
        guard::{self, Status},
        service,
        state::CasState,
        tgc::TGC_COOKIE_NAME,
    },
    tickets::{TicketClass, TicketStore},
};

/// Sealed guard status cookie.
pub const SESSION_COOKIE_NAME: &str = "CASSESSION";

/// Lifetime of the `CASSESSION` cookie in seconds.
pub const SESSION_MAX_AGE: i64 = 86_400;

const MAX_USERNAME_LEN: usize = 64;
const MAX_PASSWORD_LEN: usize = 256;

const LOCKED_BODY: &str = "<html>Too many errors, come back later</html>";
const BAD_CREDENTIALS_BODY: &str = "<html>bad user or pass</html>";

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ServiceQuery {
    /// Service URL the user is logging in for.
    #[serde(default)]
    pub service: String,
}

#[derive(Default, Deserialize, ToSchema)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Login ticket rendered into the form.
    #[serde(default)]
    pub lt: Option<String>,
}

impl LoginForm {
    /// Build the form from raw urlencoded pairs; the first value of a
    /// repeated field wins and unknown fields are ignored.
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        let (mut username, mut password) = (false, false);
        for (key, value) in pairs {
            match key.as_str() {
                "username" if !username => {
                    form.username = value;
                    username = true;
                }
                "password" if !password => {
                    form.password = value;
                    password = true;
                }
                "lt" if form.lt.is_none() => form.lt = Some(value),
                _ => {}
            }
        }
        form
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"***")
            .field("lt", &self.lt)
            .finish()
    }
}

#[utoipa::path(
    get,
    path = "/login",
    params(ServiceQuery),
    responses(
        (status = 200, description = "Login form", content_type = "text/html"),
        (status = 302, description = "Already logged in, redirect to the service with a ticket"),
    ),
    tag = "cas"
)]
// axum handler for the login form
pub async fn login(
    headers: HeaderMap,
    Query(query): Query<ServiceQuery>,
    state: Extension<Arc<CasState>>,
) -> Response {
    if let Some(tgt) =
        extract_cookie(&headers, TGC_COOKIE_NAME).and_then(|cookie| state.tgc().resolve(&cookie))
    {
        info!("TGC for: {}", tgt.user);

        let login_url = format!("{}/login", local_url(&headers, state.config()));
        let target = service::canonical(&query.service)
            .filter(|canonical| service::canonical(&login_url).as_ref() != Some(canonical));

        if let Some(canonical) = target {
            let st = state
                .store()
                .create(TicketClass::Service, &canonical, &tgt.user, false);
            if let Some(location) = service::redirect_with_ticket(&query.service, &st.value) {
                debug!("Redirecting {} to {canonical}", tgt.user);
                return redirect(StatusCode::FOUND, &location, HeaderMap::new());
            }
            state.store().delete(&st.value);
        }
    }

    let lt = state.store().create(TicketClass::Login, "", "", false);
    Html(login_page(state.config().base_path(), &query.service, &lt.value)).into_response()
}

/// Outcome of a credentials post, before the response is rendered.
#[derive(Debug, PartialEq, Eq)]
enum LoginOutcome {
    Locked,
    /// Missing, oversized or illegal credentials.
    MalformedInput,
    BadCredentials,
    Authenticated(String),
}

#[utoipa::path(
    post,
    path = "/login",
    params(ServiceQuery),
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Authentication failed or session locked", content_type = "text/html"),
        (status = 302, description = "Authenticated, redirect to the service with a ticket"),
        (status = 303, description = "Authenticated without a service, redirect to the login page"),
    ),
    tag = "cas"
)]
// axum handler for credentials
pub async fn login_post(
    headers: HeaderMap,
    Query(query): Query<ServiceQuery>,
    state: Extension<Arc<CasState>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let form = LoginForm::from_pairs(pairs);
    let config = state.config();
    let status = guard::advance(
        load_status(&headers, &state),
        guard::unix_now(),
        config.lockout_window_seconds(),
    );

    let username = sanitize_username(&form.username);
    let password = sanitize_password(&form.password);

    let outcome = if status.locked {
        LoginOutcome::Locked
    } else if !login_ticket_accepted(
        state.store(),
        form.lt.as_deref(),
        config.require_login_ticket(),
    ) {
        LoginOutcome::BadCredentials
    } else if username.is_empty() || password.is_empty() {
        LoginOutcome::MalformedInput
    } else if state.backend().validate(&username, &password).await {
        LoginOutcome::Authenticated(username)
    } else {
        LoginOutcome::BadCredentials
    };

    let (status, mut response) = match outcome {
        LoginOutcome::Locked => {
            warn!("Locked session: {}", client_ip(&headers));
            (status, Html(LOCKED_BODY).into_response())
        }
        LoginOutcome::MalformedInput | LoginOutcome::BadCredentials => {
            info!("Bad credentials from {}", client_ip(&headers));
            (status, Html(BAD_CREDENTIALS_BODY).into_response())
        }
        LoginOutcome::Authenticated(user) => {
            info!("Authenticated {user} from {}", client_ip(&headers));
            let response = authenticated(&state, &headers, &query.service, &user);
            (status.authenticated(&user), response)
        }
    };

    if let Some(value) = seal_status(&state, &status) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

/// Issue the TGC and, when a service is named, an ST for it.
fn authenticated(state: &CasState, headers: &HeaderMap, service: &str, user: &str) -> Response {
    let config = state.config();
    let canonical = service::canonical(service);

    let mut cookies = HeaderMap::new();
    match state
        .tgc()
        .issue(canonical.as_deref().unwrap_or_default(), user)
    {
        Ok((_, cookie)) => {
            match set_cookie(config, TGC_COOKIE_NAME, &cookie, config.tgc_max_age_seconds()) {
                Ok(value) => {
                    cookies.append(SET_COOKIE, value);
                }
                Err(err) => error!("Failed to build TGC cookie: {err}"),
            }
        }
        Err(err) => error!("Failed to seal TGC: {err}"),
    }

    if let Some(canonical) = canonical {
        let st = state
            .store()
            .create(TicketClass::Service, &canonical, user, true);
        if let Some(location) = service::redirect_with_ticket(service, &st.value) {
            return redirect(StatusCode::FOUND, &location, cookies);
        }
        state.store().delete(&st.value);
    }

    let location = format!("{}/login", local_url(headers, config));
    redirect(StatusCode::SEE_OTHER, &location, cookies)
}

/// Guard status from the session cookie; anything unreadable starts fresh.
fn load_status(headers: &HeaderMap, state: &CasState) -> Status {
    extract_cookie(headers, SESSION_COOKIE_NAME)
        .and_then(|cookie| {
            state
                .cipher()
                .open(SESSION_COOKIE_NAME, &cookie, SESSION_MAX_AGE)
                .map_err(|err| debug!("Ignoring session cookie: {err}"))
                .ok()
        })
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

fn seal_status(state: &CasState, status: &Status) -> Option<axum::http::HeaderValue> {
    let json = serde_json::to_vec(status)
        .map_err(|err| error!("Failed to serialize session: {err}"))
        .ok()?;
    let sealed = state
        .cipher()
        .seal(SESSION_COOKIE_NAME, &json)
        .map_err(|err| error!("Failed to seal session: {err}"))
        .ok()?;
    set_cookie(state.config(), SESSION_COOKIE_NAME, &sealed, SESSION_MAX_AGE)
        .map_err(|err| error!("Failed to build session cookie: {err}"))
        .ok()
}

/// A presented login ticket must be a live LT, and is spent either way.
fn login_ticket_accepted(store: &dyn TicketStore, lt: Option<&str>, required: bool) -> bool {
    match lt.filter(|value| !value.is_empty()) {
        Some(value) => match store.consume(value) {
            Some(ticket) if ticket.class == TicketClass::Login => true,
            Some(ticket) => {
                warn!("Rejected {} presented as login ticket", ticket.class);
                false
            }
            None => {
                debug!("Unknown or used login ticket");
                false
            }
        },
        None => !required,
    }
}

fn valid_username(username: &str) -> bool {
    username.len() <= MAX_USERNAME_LEN
        && Regex::new(r"^[a-zA-Z0-9.@]+$").is_ok_and(|re| re.is_match(username))
}

fn sanitize_username(username: &str) -> String {
    if username.is_empty() {
        return String::new();
    }
    if valid_username(username) {
        username.to_string()
    } else {
        error!("Invalid username");
        String::new()
    }
}

fn sanitize_password(password: &str) -> String {
    if password.len() > MAX_PASSWORD_LEN {
        error!("Password too long");
        String::new()
    } else {
        password.to_string()
    }
}

fn login_page(base_path: &str, service: &str, lt: &str) -> String {
    let action = if service.is_empty() {
        format!("{base_path}/login")
    } else {
        let encoded: String = url::form_urlencoded::byte_serialize(service.as_bytes()).collect();
        format!("{base_path}/login?service={encoded}")
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Login</title></head>
<body>
<form method="post" action="{action}">
<input type="hidden" name="lt" value="{lt}">
<label>Username <input type="text" name="username" maxlength="{MAX_USERNAME_LEN}" autofocus></label>
<label>Password <input type="password" name="password" maxlength="{MAX_PASSWORD_LEN}"></label>
<button type="submit">Login</button>
</form>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tickets::MemoryTicketStore;

    #[test]
    fn username_rules() {
        assert_eq!(sanitize_username("alice"), "alice");
        assert_eq!(sanitize_username("a.b@example.org"), "a.b@example.org");
        assert_eq!(sanitize_username("alice smith"), "");
        assert_eq!(sanitize_username("alice*)(uid=*"), "");
        assert_eq!(sanitize_username(&"a".repeat(64)), "a".repeat(64));
        assert_eq!(sanitize_username(&"a".repeat(65)), "");
        assert_eq!(sanitize_username(""), "");
    }

    #[test]
    fn password_rules() {
        assert_eq!(sanitize_password("any thing!"), "any thing!");
        assert_eq!(sanitize_password(&"p".repeat(256)), "p".repeat(256));
        assert_eq!(sanitize_password(&"p".repeat(257)), "");
    }

    #[test]
    fn login_ticket_is_single_use() {
        let store = MemoryTicketStore::new();
        let lt = store.create(TicketClass::Login, "", "", false);

        assert!(login_ticket_accepted(&store, Some(&lt.value), true));
        assert!(!login_ticket_accepted(&store, Some(&lt.value), true));
    }

    #[test]
    fn login_ticket_optional_unless_required() {
        let store = MemoryTicketStore::new();
        assert!(login_ticket_accepted(&store, None, false));
        assert!(login_ticket_accepted(&store, Some(""), false));
        assert!(!login_ticket_accepted(&store, None, true));
        assert!(!login_ticket_accepted(&store, Some("LT-unknown"), false));
    }

    #[test]
    fn other_ticket_classes_are_not_login_tickets() {
        let store = MemoryTicketStore::new();
        let st = store.create(TicketClass::Service, "https://svc.example/", "alice", false);
        assert!(!login_ticket_accepted(&store, Some(&st.value), false));
        assert!(store.get(&st.value).is_none());
    }

    #[test]
    fn login_page_carries_lt_and_service() {
        let page = login_page("/cas", "https://svc.example/app?x=1", "LT-abc");
        assert!(page.contains(r#"name="lt" value="LT-abc""#));
        assert!(page.contains(
            r#"action="/cas/login?service=https%3A%2F%2Fsvc.example%2Fapp%3Fx%3D1""#
        ));

        let page = login_page("", "", "LT-abc");
        assert!(page.contains(r#"action="/login""#));
    }

    #[test]
    fn login_form_takes_first_value() {
        let pairs = vec![
            ("username".to_string(), "alice".to_string()),
            ("username".to_string(), "mallory".to_string()),
            ("password".to_string(), "secret".to_string()),
            ("lt".to_string(), "LT-1".to_string()),
            ("lt".to_string(), "LT-2".to_string()),
            ("submit".to_string(), "Login".to_string()),
        ];
        let form = LoginForm::from_pairs(pairs);
        assert_eq!(form.username, "alice");
        assert_eq!(form.password, "secret");
        assert_eq!(form.lt.as_deref(), Some("LT-1"));
    }

    #[test]
    fn login_form_defaults_missing_fields() {
        let form = LoginForm::from_pairs(vec![("lt".to_string(), String::new())]);
        assert!(form.username.is_empty());
        assert!(form.password.is_empty());
        assert_eq!(form.lt.as_deref(), Some(""));
    }

    #[test]
    fn login_form_debug_hides_password() {
        let form = LoginForm {
            username: "alice".to_string(),
            password: "secret".to_string(),
            lt: None,
        };
        let debug = format!("{form:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("secret"));
    }
}
