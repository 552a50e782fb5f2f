//! Directory-bind backend.
//!
//! A user is valid when an LDAPS simple bind as `uid=<username>,<base DN>`
//! succeeds with the supplied password. Nothing is searched or cached and a
//! failed attempt is never retried. The configured timeout bounds both the
//! connection and the bind, so a stalled directory turns into a rejection.

use async_trait::async_trait;
use ldap3::{dn_escape, LdapConnAsync, LdapConnSettings, LdapError};
use std::time::Duration;
use tracing::{debug, error, instrument};

use super::AuthenticationGateway;

const DEFAULT_PORT: u16 = 636;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct LdapConfig {
    server: String,
    port: u16,
    base_dn: String,
    skip_verify: bool,
    timeout: Duration,
}

impl LdapConfig {
    #[must_use]
    pub fn new(server: String, base_dn: String) -> Self {
        Self {
            server,
            port: DEFAULT_PORT,
            base_dn,
            skip_verify: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Accept any server certificate. Only meant for development directories.
    #[must_use]
    pub fn with_skip_verify(mut self, skip_verify: bool) -> Self {
        self.skip_verify = skip_verify;
        self
    }

    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout = Duration::from_secs(seconds.max(1));
        self
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("ldaps://{}:{}", self.server, self.port)
    }

    /// Bind DN for `username`, escaped so it cannot add RDN components.
    #[must_use]
    pub fn bind_dn(&self, username: &str) -> String {
        format!("uid={},{}", dn_escape(username), self.base_dn)
    }
}

#[derive(Debug)]
pub struct LdapBackend {
    config: LdapConfig,
}

impl LdapBackend {
    #[must_use]
    pub fn new(config: LdapConfig) -> Self {
        Self { config }
    }

    async fn bind(&self, username: &str, password: &str) -> Result<(), LdapError> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.config.timeout)
            .set_no_tls_verify(self.config.skip_verify);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.config.url()).await?;
        ldap3::drive!(conn);

        let result = ldap
            .with_timeout(self.config.timeout)
            .simple_bind(&self.config.bind_dn(username), password)
            .await
            .and_then(ldap3::LdapResult::success);

        if let Err(err) = ldap.unbind().await {
            debug!("LDAP unbind failed: {err}");
        }

        result.map(|_| ())
    }
}

#[async_trait]
impl AuthenticationGateway for LdapBackend {
    #[instrument(skip(self, password), fields(server = %self.config.server))]
    async fn validate(&self, username: &str, password: &str) -> bool {
        debug!("Validate ldap user <{username}> <****>");

        if username.is_empty() || password.is_empty() {
            return false;
        }

        match self.bind(username, password).await {
            Ok(()) => true,
            Err(LdapError::LdapResult { result }) => {
                debug!("[{username}] bind refused: rc={} {}", result.rc, result.text);
                false
            }
            Err(err) => {
                error!("LDAP backend error: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> LdapConfig {
        LdapConfig::new(
            "ldap.example.org".to_string(),
            "ou=people,dc=example,dc=org".to_string(),
        )
    }

    #[test]
    fn defaults_to_ldaps_port() {
        assert_eq!(config().url(), "ldaps://ldap.example.org:636");
        assert_eq!(config().with_port(1636).url(), "ldaps://ldap.example.org:1636");
    }

    #[test]
    fn bind_dn_uses_base() {
        assert_eq!(
            config().bind_dn("alice"),
            "uid=alice,ou=people,dc=example,dc=org"
        );
    }

    #[test]
    fn bind_dn_escapes_rdn_separators() {
        let dn = config().bind_dn("alice,ou=admins");
        assert!(!dn.contains("alice,ou=admins"));
        assert!(dn.ends_with(",ou=people,dc=example,dc=org"));
    }

    #[tokio::test]
    async fn empty_credentials_never_connect() {
        let backend = LdapBackend::new(config());
        assert!(!backend.validate("", "secret").await);
        assert!(!backend.validate("alice", "").await);
    }

    #[tokio::test]
    async fn unreachable_server_is_rejection() {
        let backend = LdapBackend::new(
            LdapConfig::new("127.0.0.1".to_string(), "dc=example,dc=org".to_string())
                .with_port(1)
                .with_timeout_seconds(1),
        );
        assert!(!backend.validate("alice", "alice").await);
    }

    #[tokio::test]
    async fn silent_server_is_rejection() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let backend = LdapBackend::new(
            LdapConfig::new("127.0.0.1".to_string(), "dc=example,dc=org".to_string())
                .with_port(port)
                .with_timeout_seconds(1),
        );
        let valid = tokio::time::timeout(
            Duration::from_secs(10),
            backend.validate("alice", "alice"),
        )
        .await
        .unwrap();
        assert!(!valid);

        server.abort();
    }
}
