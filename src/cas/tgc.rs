//! Ticket-granting cookie correlation.
//!
//! The `CASTGC` cookie carries the sealed value of a TGT. A cookie that fails
//! to open and one whose TGT is gone are the same thing to callers: not logged in.

use std::sync::Arc;
use tracing::debug;

use super::cipher::{CipherError, CookieCipher};
use crate::tickets::{Ticket, TicketClass, TicketStore};

pub const TGC_COOKIE_NAME: &str = "CASTGC";

pub struct TgcCorrelator {
    store: Arc<dyn TicketStore>,
    cipher: Arc<CookieCipher>,
    max_age_seconds: i64,
}

impl TgcCorrelator {
    #[must_use]
    pub fn new(store: Arc<dyn TicketStore>, cipher: Arc<CookieCipher>, max_age_seconds: i64) -> Self {
        Self {
            store,
            cipher,
            max_age_seconds,
        }
    }

    /// Create a TGT for `service` and `user` and return it with the sealed
    /// cookie value.
    ///
    /// # Errors
    /// Returns an error if the value cannot be sealed; no TGT is left behind.
    pub fn issue(&self, service: &str, user: &str) -> Result<(Ticket, String), CipherError> {
        let tgt = self
            .store
            .create(TicketClass::Granting, service, user, false);

        match self.cipher.seal(TGC_COOKIE_NAME, tgt.value.as_bytes()) {
            Ok(cookie) => {
                debug!("New TGC User: <{user}>");
                Ok((tgt, cookie))
            }
            Err(err) => {
                self.store.delete(&tgt.value);
                Err(err)
            }
        }
    }

    /// TGT behind `cookie`, if the cookie opens and the TGT still exists.
    #[must_use]
    pub fn resolve(&self, cookie: &str) -> Option<Ticket> {
        let value = match self.cipher.open(TGC_COOKIE_NAME, cookie, self.max_age_seconds) {
            Ok(bytes) => String::from_utf8(bytes).ok()?,
            Err(err) => {
                debug!("Ignoring TGC: {err}");
                return None;
            }
        };

        self.store
            .get(&value)
            .filter(|ticket| ticket.class == TicketClass::Granting)
    }

    /// Resolve `cookie` and delete its TGT. Returns the revoked ticket.
    pub fn revoke(&self, cookie: &str) -> Option<Ticket> {
        let ticket = self.resolve(cookie)?;
        self.store.delete(&ticket.value);
        Some(ticket)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tickets::MemoryTicketStore;
    use secrecy::SecretString;

    fn correlator(store: Arc<dyn TicketStore>) -> TgcCorrelator {
        let cipher = CookieCipher::new(
            &SecretString::from("hash-secret"),
            &SecretString::from("block-secret"),
        );
        TgcCorrelator::new(store, Arc::new(cipher), 3600)
    }

    const SERVICE: &str = "https://svc.example/app";

    #[test]
    fn issued_cookie_resolves_to_tgt() {
        let store: Arc<dyn TicketStore> = Arc::new(MemoryTicketStore::new());
        let tgc = correlator(store);
        let (tgt, cookie) = tgc.issue(SERVICE, "alice").unwrap();
        assert_eq!(tgt.class, TicketClass::Granting);
        assert_eq!(tgt.user, "alice");
        assert_eq!(tgt.service, "https://svc.example/app");
        assert!(!tgt.renew);
        assert_eq!(tgc.resolve(&cookie), Some(tgt));
    }

    #[test]
    fn garbage_cookie_is_not_logged_in() {
        let store: Arc<dyn TicketStore> = Arc::new(MemoryTicketStore::new());
        let tgc = correlator(store);
        assert_eq!(tgc.resolve(""), None);
        assert_eq!(tgc.resolve("deleted"), None);
        assert_eq!(tgc.revoke("garbage"), None);
    }

    #[test]
    fn revoke_deletes_tgt() {
        let store: Arc<dyn TicketStore> = Arc::new(MemoryTicketStore::new());
        let tgc = correlator(Arc::clone(&store));
        let (tgt, cookie) = tgc.issue(SERVICE, "alice").unwrap();

        assert_eq!(tgc.revoke(&cookie), Some(tgt.clone()));
        assert_eq!(store.get(&tgt.value), None);
        assert_eq!(tgc.resolve(&cookie), None);
        assert_eq!(tgc.revoke(&cookie), None);
    }

    #[test]
    fn cookie_from_other_keys_is_rejected() {
        let store: Arc<dyn TicketStore> = Arc::new(MemoryTicketStore::new());
        let tgc = correlator(Arc::clone(&store));
        let (_, cookie) = tgc.issue(SERVICE, "alice").unwrap();

        let other = TgcCorrelator::new(
            Arc::clone(&store),
            Arc::new(CookieCipher::new(
                &SecretString::from("other-hash"),
                &SecretString::from("block-secret"),
            )),
            3600,
        );
        assert_eq!(other.resolve(&cookie), None);
    }
}
