use crate::{
    backend::Backend,
    cas::{self, cipher::CookieCipher, state::CasConfig, state::CasState},
    tickets::{MemoryTicketStore, TicketStore, TicketTtl},
};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub base_path: String,
    pub public_url: Option<String>,
    pub secret: SecretString,
    pub hash_secret: SecretString,
    pub secure_cookie: bool,
    pub backend: Backend,
    pub gc_period_seconds: u64,
    pub lt_ttl_seconds: u64,
    pub tgt_ttl_seconds: u64,
    pub lockout_window_seconds: i64,
    pub require_login_ticket: bool,
}

impl Args {
    /// Broker configuration described by these arguments.
    #[must_use]
    pub fn cas_config(&self) -> CasConfig {
        CasConfig::new()
            .with_base_path(&self.base_path)
            .with_public_url(self.public_url.clone())
            .with_secure_cookie(self.secure_cookie)
            .with_ticket_ttl(
                TicketTtl::new()
                    .with_service_seconds(self.gc_period_seconds)
                    .with_login_seconds(self.lt_ttl_seconds)
                    .with_granting_seconds(self.tgt_ttl_seconds),
            )
            .with_lockout_window_seconds(self.lockout_window_seconds)
            .with_require_login_ticket(self.require_login_ticket)
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = args.cas_config();
    debug!("CAS config: {:?}", config);

    let store: Arc<dyn TicketStore> = Arc::new(MemoryTicketStore::new());
    let cipher = CookieCipher::new(&args.hash_secret, &args.secret);
    let state = Arc::new(CasState::new(config, store, args.backend.build(), cipher));

    cas::new(args.port, state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn args_map_to_config() {
        let args = Args {
            port: 8080,
            base_path: "cas/".to_string(),
            public_url: Some("https://sso.example.org/".to_string()),
            secret: SecretString::from("block-secret"),
            hash_secret: SecretString::from("hash-secret"),
            secure_cookie: true,
            backend: Backend::Static,
            gc_period_seconds: 60,
            lt_ttl_seconds: 120,
            tgt_ttl_seconds: 3600,
            lockout_window_seconds: 45,
            require_login_ticket: true,
        };

        let config = args.cas_config();
        assert_eq!(config.base_path(), "/cas");
        assert_eq!(config.public_url(), Some("https://sso.example.org"));
        assert!(config.secure_cookie());
        assert_eq!(config.ticket_ttl().period(), Duration::from_secs(60));
        assert_eq!(config.tgc_max_age_seconds(), 3600);
        assert_eq!(config.lockout_window_seconds(), 45);
        assert!(config.require_login_ticket());
    }

    #[test]
    fn args_debug_hides_secrets() {
        let args = Args {
            port: 8080,
            base_path: String::new(),
            public_url: None,
            secret: SecretString::from("block-secret"),
            hash_secret: SecretString::from("hash-secret"),
            secure_cookie: false,
            backend: Backend::Static,
            gc_period_seconds: 300,
            lt_ttl_seconds: 300,
            tgt_ttl_seconds: 28_800,
            lockout_window_seconds: 30,
            require_login_ticket: false,
        };
        let debug = format!("{args:?}");
        assert!(!debug.contains("block-secret"));
        assert!(!debug.contains("hash-secret"));
    }
}
