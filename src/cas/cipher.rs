//! Authenticated encryption for cookie values.
//!
//! Sealed layout (before base64url encoding):
//!
//! ```text
//! timestamp (8, big endian unix seconds) | nonce (12) | ciphertext | hmac-sha256 (32)
//! ```
//!
//! The ciphertext is ChaCha20-Poly1305 under the encryption key with the cookie
//! name as associated data. The trailing MAC covers `name | timestamp | nonce |
//! ciphertext` under the separate authentication key, so a value sealed for one
//! cookie cannot be replayed as another and expired values are rejected before
//! any decryption happens.

use base64ct::{Base64UrlUnpadded, Encoding};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use super::guard::unix_now;

type HmacSha256 = Hmac<Sha256>;

const TIMESTAMP_LEN: usize = 8;
const NONCE_LEN: usize = 12;
const MAC_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CipherError {
    #[error("malformed cookie value")]
    Malformed,
    #[error("cookie authentication failed")]
    BadMac,
    #[error("cookie expired")]
    Expired,
    #[error("cookie decryption failed")]
    Decrypt,
    #[error("cookie encryption failed")]
    Encrypt,
}

pub struct CookieCipher {
    hash_key: [u8; 32],
    block_key: [u8; 32],
}

impl CookieCipher {
    /// Derive the key pair from the configured secrets.
    #[must_use]
    pub fn new(hash_secret: &SecretString, secret: &SecretString) -> Self {
        Self {
            hash_key: derive_key(hash_secret.expose_secret()),
            block_key: derive_key(secret.expose_secret()),
        }
    }

    /// Seal `value` for the cookie called `name`.
    ///
    /// # Errors
    /// Returns `CipherError::Encrypt` if the AEAD refuses the input.
    pub fn seal(&self, name: &str, value: &[u8]) -> Result<String, CipherError> {
        self.seal_at(name, value, unix_now())
    }

    /// Open a value produced by [`seal`](Self::seal) for the same `name`.
    ///
    /// Values older than `max_age_seconds` are refused.
    ///
    /// # Errors
    /// Returns an error for any malformed, tampered, foreign or expired value.
    pub fn open(
        &self,
        name: &str,
        sealed: &str,
        max_age_seconds: i64,
    ) -> Result<Vec<u8>, CipherError> {
        self.open_at(name, sealed, max_age_seconds, unix_now())
    }

    fn seal_at(&self, name: &str, value: &[u8], now: i64) -> Result<String, CipherError> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.block_key));
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: value,
                    aad: name.as_bytes(),
                },
            )
            .map_err(|_| CipherError::Encrypt)?;

        let mut sealed =
            Vec::with_capacity(TIMESTAMP_LEN + NONCE_LEN + ciphertext.len() + MAC_LEN);
        sealed.extend_from_slice(&now.to_be_bytes());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        let tag = self.mac(name, &sealed)?.finalize().into_bytes();
        sealed.extend_from_slice(&tag);

        Ok(Base64UrlUnpadded::encode_string(&sealed))
    }

    fn open_at(
        &self,
        name: &str,
        sealed: &str,
        max_age_seconds: i64,
        now: i64,
    ) -> Result<Vec<u8>, CipherError> {
        let raw = Base64UrlUnpadded::decode_vec(sealed.trim()).map_err(|_| CipherError::Malformed)?;
        if raw.len() < TIMESTAMP_LEN + NONCE_LEN + MAC_LEN {
            return Err(CipherError::Malformed);
        }

        let (body, tag) = raw.split_at(raw.len() - MAC_LEN);
        self.mac(name, body)?
            .verify_slice(tag)
            .map_err(|_| CipherError::BadMac)?;

        let (timestamp, rest) = body.split_at(TIMESTAMP_LEN);
        let mut ts = [0u8; TIMESTAMP_LEN];
        ts.copy_from_slice(timestamp);
        let issued_at = i64::from_be_bytes(ts);
        if now.saturating_sub(issued_at) > max_age_seconds {
            return Err(CipherError::Expired);
        }

        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.block_key));
        cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: name.as_bytes(),
                },
            )
            .map_err(|_| CipherError::Decrypt)
    }

    fn mac(&self, name: &str, body: &[u8]) -> Result<HmacSha256, CipherError> {
        let mut mac =
            <HmacSha256 as Mac>::new_from_slice(&self.hash_key).map_err(|_| CipherError::Encrypt)?;
        mac.update(name.as_bytes());
        mac.update(b"|");
        mac.update(body);
        Ok(mac)
    }
}

impl std::fmt::Debug for CookieCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieCipher")
            .field("hash_key", &"***")
            .field("block_key", &"***")
            .finish()
    }
}

fn derive_key(secret: &str) -> [u8; 32] {
    Sha256::digest(secret.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 24 * 60 * 60;
    const NOW: i64 = 1_700_000_000;

    fn cipher() -> CookieCipher {
        CookieCipher::new(
            &SecretString::from("very-secret"),
            &SecretString::from("0123456789123456"),
        )
    }

    #[test]
    fn open_returns_sealed_value() {
        let cipher = cipher();
        let sealed = cipher.seal_at("CASTGC", b"TGT-abc", NOW).unwrap_or_default();
        assert_eq!(
            cipher.open_at("CASTGC", &sealed, DAY, NOW + 10),
            Ok(b"TGT-abc".to_vec())
        );
    }

    #[test]
    fn sealing_is_randomized() {
        let cipher = cipher();
        let first = cipher.seal_at("CASTGC", b"TGT-abc", NOW);
        let second = cipher.seal_at("CASTGC", b"TGT-abc", NOW);
        assert_ne!(first, second);
    }

    #[test]
    fn value_does_not_leak_into_cookie() {
        let sealed = cipher().seal("CASTGC", b"TGT-plainvalue").unwrap_or_default();
        assert!(!sealed.contains("TGT"));
    }

    #[test]
    fn rejects_other_cookie_name() {
        let cipher = cipher();
        let sealed = cipher.seal_at("CASTGC", b"TGT-abc", NOW).unwrap_or_default();
        assert_eq!(
            cipher.open_at("CASSESSION", &sealed, DAY, NOW),
            Err(CipherError::BadMac)
        );
    }

    #[test]
    fn rejects_tampering() {
        let cipher = cipher();
        let sealed = cipher.seal_at("CASTGC", b"TGT-abc", NOW).unwrap_or_default();
        let mut raw = Base64UrlUnpadded::decode_vec(&sealed).unwrap_or_default();
        if let Some(byte) = raw.get_mut(TIMESTAMP_LEN + NONCE_LEN) {
            *byte ^= 0x01;
        }
        let tampered = Base64UrlUnpadded::encode_string(&raw);
        assert_eq!(
            cipher.open_at("CASTGC", &tampered, DAY, NOW),
            Err(CipherError::BadMac)
        );
    }

    #[test]
    fn rejects_foreign_keys() {
        let sealed = cipher().seal_at("CASTGC", b"TGT-abc", NOW).unwrap_or_default();
        let other = CookieCipher::new(
            &SecretString::from("another-secret"),
            &SecretString::from("0123456789123456"),
        );
        assert_eq!(
            other.open_at("CASTGC", &sealed, DAY, NOW),
            Err(CipherError::BadMac)
        );
    }

    #[test]
    fn rejects_expired() {
        let cipher = cipher();
        let sealed = cipher.seal_at("CASTGC", b"TGT-abc", NOW).unwrap_or_default();
        assert_eq!(
            cipher.open_at("CASTGC", &sealed, 60, NOW + 61),
            Err(CipherError::Expired)
        );
    }

    #[test]
    fn rejects_garbage() {
        let cipher = cipher();
        assert_eq!(
            cipher.open_at("CASTGC", "", DAY, NOW),
            Err(CipherError::Malformed)
        );
        assert_eq!(
            cipher.open_at("CASTGC", "not base64 !!", DAY, NOW),
            Err(CipherError::Malformed)
        );
        assert_eq!(
            cipher.open_at("CASTGC", "deleted", DAY, NOW),
            Err(CipherError::Malformed)
        );
    }

    #[test]
    fn debug_redacts_keys() {
        let rendered = format!("{:?}", cipher());
        assert!(rendered.contains("***"));
        assert!(!rendered.contains("hash_key: ["));
    }
}
