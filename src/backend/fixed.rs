use async_trait::async_trait;
use tracing::debug;

use super::AuthenticationGateway;

/// Test backend: a user authenticates with a password equal to its username.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticBackend;

#[async_trait]
impl AuthenticationGateway for StaticBackend {
    async fn validate(&self, username: &str, password: &str) -> bool {
        debug!("Validate test user <{username}>");
        !username.is_empty() && username == password
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_matching_credentials() {
        assert!(StaticBackend.validate("alice", "alice").await);
    }

    #[tokio::test]
    async fn rejects_mismatch_and_empty() {
        assert!(!StaticBackend.validate("alice", "bob").await);
        assert!(!StaticBackend.validate("", "").await);
        assert!(!StaticBackend.validate("alice", "").await);
    }
}
