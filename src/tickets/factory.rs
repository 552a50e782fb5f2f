//! Ticket value generation.

use rand::{
    distributions::{Distribution, Uniform},
    rngs::OsRng,
};

use super::TicketClass;

const ALPHABET: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of the random part of every ticket value.
pub const RANDOM_LEN: usize = 32;

/// Produces `<class>-<32 letters>` values from the operating system CSPRNG.
///
/// 32 letters over a 52-symbol alphabet give ~182 bits of entropy, so a valid
/// value cannot be guessed.
#[derive(Clone, Copy, Debug, Default)]
pub struct TicketFactory;

impl TicketFactory {
    #[must_use]
    pub fn new_value(&self, class: TicketClass) -> String {
        let mut value = String::with_capacity(class.as_str().len() + 1 + RANDOM_LEN);
        value.push_str(class.as_str());
        value.push('-');
        value.push_str(&random_letters(RANDOM_LEN));
        value
    }
}

/// `n` letters drawn uniformly from `[a-zA-Z]`.
fn random_letters(n: usize) -> String {
    // Uniform rejects out-of-range samples internally, so there is no modulo bias.
    let index = Uniform::from(0..ALPHABET.len());
    index
        .sample_iter(OsRng)
        .take(n)
        .map(|i| char::from(ALPHABET[i]))
        .collect()
}
