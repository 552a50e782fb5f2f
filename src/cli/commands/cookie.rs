use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use secrecy::SecretString;

pub const ARG_SECRET: &str = "secret";
pub const ARG_HASH_SECRET: &str = "hash-secret";
pub const ARG_SECURE_COOKIE: &str = "secure-cookie";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SECRET)
                .long(ARG_SECRET)
                .help("Secret used to encrypt cookies")
                .env("CASTGATE_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_HASH_SECRET)
                .long(ARG_HASH_SECRET)
                .help("Secret used to authenticate cookies")
                .env("CASTGATE_HASH_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_SECURE_COOKIE)
                .long(ARG_SECURE_COOKIE)
                .help("Mark cookies Secure (only sent over HTTPS)")
                .env("CASTGATE_SECURE_COOKIE")
                .action(ArgAction::SetTrue),
        )
}

pub struct Options {
    pub secret: SecretString,
    pub hash_secret: SecretString,
    pub secure: bool,
}

impl Options {
    /// # Errors
    /// Returns an error if a secret is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let secret = matches
            .get_one::<String>(ARG_SECRET)
            .cloned()
            .context("missing required argument: --secret")?;
        let hash_secret = matches
            .get_one::<String>(ARG_HASH_SECRET)
            .cloned()
            .context("missing required argument: --hash-secret")?;

        Ok(Self {
            secret: SecretString::from(secret),
            hash_secret: SecretString::from(hash_secret),
            secure: matches.get_flag(ARG_SECURE_COOKIE),
        })
    }
}
