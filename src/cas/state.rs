//! Broker configuration and shared request state.

use std::sync::Arc;

use super::{cipher::CookieCipher, guard::DEFAULT_WINDOW_SECONDS, tgc::TgcCorrelator};
use crate::{
    backend::AuthenticationGateway,
    tickets::{TicketClass, TicketStore, TicketTtl},
};

#[derive(Clone, Debug)]
pub struct CasConfig {
    base_path: String,
    public_url: Option<String>,
    secure_cookie: bool,
    ticket_ttl: TicketTtl,
    lockout_window_seconds: i64,
    require_login_ticket: bool,
}

impl CasConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_path: String::new(),
            public_url: None,
            secure_cookie: false,
            ticket_ttl: TicketTtl::default(),
            lockout_window_seconds: DEFAULT_WINDOW_SECONDS,
            require_login_ticket: false,
        }
    }

    /// Mount point of every route, e.g. `/cas`. Empty or `/` means the root.
    #[must_use]
    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = normalize_base_path(base_path);
        self
    }

    /// Externally visible origin (e.g. `https://sso.example.org`). When unset the
    /// origin is rebuilt from the `Host` and `X-Forwarded-Proto` headers.
    #[must_use]
    pub fn with_public_url(mut self, public_url: Option<String>) -> Self {
        self.public_url = public_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        self
    }

    #[must_use]
    pub fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.secure_cookie = secure;
        self
    }

    #[must_use]
    pub fn with_ticket_ttl(mut self, ttl: TicketTtl) -> Self {
        self.ticket_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_lockout_window_seconds(mut self, seconds: i64) -> Self {
        self.lockout_window_seconds = seconds.max(1);
        self
    }

    #[must_use]
    pub fn with_require_login_ticket(mut self, require: bool) -> Self {
        self.require_login_ticket = require;
        self
    }

    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Cookie `Path` attribute.
    #[must_use]
    pub fn cookie_path(&self) -> &str {
        if self.base_path.is_empty() {
            "/"
        } else {
            &self.base_path
        }
    }

    #[must_use]
    pub fn public_url(&self) -> Option<&str> {
        self.public_url.as_deref()
    }

    #[must_use]
    pub fn secure_cookie(&self) -> bool {
        self.secure_cookie
    }

    #[must_use]
    pub fn ticket_ttl(&self) -> &TicketTtl {
        &self.ticket_ttl
    }

    /// Lifetime of the `CASTGC` cookie, matching the TGT lifetime.
    #[must_use]
    pub fn tgc_max_age_seconds(&self) -> i64 {
        i64::try_from(self.ticket_ttl.of(TicketClass::Granting).as_secs()).unwrap_or(i64::MAX)
    }

    #[must_use]
    pub fn lockout_window_seconds(&self) -> i64 {
        self.lockout_window_seconds
    }

    #[must_use]
    pub fn require_login_ticket(&self) -> bool {
        self.require_login_ticket
    }
}

impl Default for CasConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Everything a request handler needs, shared behind an `Arc`.
pub struct CasState {
    config: CasConfig,
    store: Arc<dyn TicketStore>,
    tgc: TgcCorrelator,
    cipher: Arc<CookieCipher>,
    backend: Arc<dyn AuthenticationGateway>,
}

impl CasState {
    #[must_use]
    pub fn new(
        config: CasConfig,
        store: Arc<dyn TicketStore>,
        backend: Arc<dyn AuthenticationGateway>,
        cipher: CookieCipher,
    ) -> Self {
        let cipher = Arc::new(cipher);
        let tgc = TgcCorrelator::new(
            Arc::clone(&store),
            Arc::clone(&cipher),
            config.tgc_max_age_seconds(),
        );
        Self {
            config,
            store,
            tgc,
            cipher,
            backend,
        }
    }

    #[must_use]
    pub fn config(&self) -> &CasConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn TicketStore {
        self.store.as_ref()
    }

    /// Owned handle to the store, for background tasks.
    #[must_use]
    pub fn shared_store(&self) -> Arc<dyn TicketStore> {
        Arc::clone(&self.store)
    }

    #[must_use]
    pub fn tgc(&self) -> &TgcCorrelator {
        &self.tgc
    }

    #[must_use]
    pub fn cipher(&self) -> &CookieCipher {
        &self.cipher
    }

    #[must_use]
    pub fn backend(&self) -> &dyn AuthenticationGateway {
        self.backend.as_ref()
    }
}

impl std::fmt::Debug for CasState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CasState")
            .field("config", &self.config)
            .field("tickets", &self.store.len())
            .finish_non_exhaustive()
    }
}
