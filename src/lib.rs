//! # Castgate (CAS single sign-on ticket broker)
//!
//! `castgate` speaks the CAS v1 and v2 protocols. A browser authenticates once
//! at `/login` and receives a ticket-granting cookie; services it visits later
//! are handed single-use service tickets, which they redeem at `/validate` or
//! `/serviceValidate` to learn who the user is.
//!
//! ## Tickets
//!
//! Login (`LT-`), ticket-granting (`TGT-`) and service (`ST-`) tickets live in
//! one in-memory store. Every ticket is consumed at most once, and a periodic
//! collector expires each class after its configured lifetime.
//!
//! ## Credentials
//!
//! Passwords are checked by an LDAPS simple bind, or by a fixed test backend.
//! Repeated failures lock the browser session for a short window; the failure
//! counter travels in an encrypted, authenticated cookie.

pub mod backend;
pub mod cas;
pub mod cli;
pub mod tickets;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
