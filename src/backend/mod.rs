//! Credential backends.
//!
//! The login flow only sees [`AuthenticationGateway`]; which implementation
//! runs is decided once at startup from `--backend`.

mod fixed;
mod ldap;

use async_trait::async_trait;
use std::sync::Arc;

pub use fixed::StaticBackend;
pub use ldap::{LdapBackend, LdapConfig};

#[async_trait]
pub trait AuthenticationGateway: Send + Sync {
    /// True only when the credentials are accepted.
    ///
    /// Backend failures (connectivity, TLS, bind errors) must be logged and
    /// reported as `false`; callers never distinguish them from a wrong password.
    async fn validate(&self, username: &str, password: &str) -> bool;
}

/// Backend selector used by the CLI.
#[derive(Clone, Debug)]
pub enum Backend {
    Static,
    Ldap(LdapConfig),
}

impl Backend {
    #[must_use]
    pub fn build(self) -> Arc<dyn AuthenticationGateway> {
        match self {
            Self::Static => Arc::new(StaticBackend),
            Self::Ldap(config) => Arc::new(LdapBackend::new(config)),
        }
    }
}
