use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};

use crate::backend::{Backend, LdapConfig};

pub const ARG_BACKEND: &str = "backend";
pub const ARG_LDAP_SERVER: &str = "ldap-server";
pub const ARG_LDAP_PORT: &str = "ldap-port";
pub const ARG_LDAP_BASE_DN: &str = "ldap-base-dn";
pub const ARG_LDAP_SKIP_VERIFY: &str = "ldap-skip-verify";
pub const ARG_LDAP_TIMEOUT_SECONDS: &str = "ldap-timeout-seconds";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BACKEND)
                .long(ARG_BACKEND)
                .help("Credential backend, `test` accepts username == password")
                .env("CASTGATE_BACKEND")
                .default_value("ldap")
                .value_parser(["ldap", "test"]),
        )
        .arg(
            Arg::new(ARG_LDAP_SERVER)
                .long(ARG_LDAP_SERVER)
                .help("LDAP server host name")
                .env("CASTGATE_LDAP_SERVER"),
        )
        .arg(
            Arg::new(ARG_LDAP_PORT)
                .long(ARG_LDAP_PORT)
                .help("LDAPS port")
                .env("CASTGATE_LDAP_PORT")
                .default_value("636")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_LDAP_BASE_DN)
                .long(ARG_LDAP_BASE_DN)
                .help("Base DN users bind under, example: ou=people,dc=example,dc=org")
                .env("CASTGATE_LDAP_BASE_DN"),
        )
        .arg(
            Arg::new(ARG_LDAP_SKIP_VERIFY)
                .long(ARG_LDAP_SKIP_VERIFY)
                .help("Skip LDAP server certificate verification")
                .env("CASTGATE_LDAP_SKIP_VERIFY")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_LDAP_TIMEOUT_SECONDS)
                .long(ARG_LDAP_TIMEOUT_SECONDS)
                .help("LDAP connect timeout in seconds")
                .env("CASTGATE_LDAP_TIMEOUT_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
}

pub struct Options {
    pub backend: Backend,
}

impl Options {
    /// # Errors
    /// Returns an error if the LDAP backend is selected without a server or base DN.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let backend = match matches.get_one::<String>(ARG_BACKEND).map(String::as_str) {
            Some("test") => Backend::Static,
            _ => {
                let server = matches
                    .get_one::<String>(ARG_LDAP_SERVER)
                    .cloned()
                    .context("missing required argument: --ldap-server")?;
                let base_dn = matches
                    .get_one::<String>(ARG_LDAP_BASE_DN)
                    .cloned()
                    .context("missing required argument: --ldap-base-dn")?;

                Backend::Ldap(
                    LdapConfig::new(server, base_dn)
                        .with_port(matches.get_one::<u16>(ARG_LDAP_PORT).copied().unwrap_or(636))
                        .with_skip_verify(matches.get_flag(ARG_LDAP_SKIP_VERIFY))
                        .with_timeout_seconds(
                            matches
                                .get_one::<u64>(ARG_LDAP_TIMEOUT_SECONDS)
                                .copied()
                                .unwrap_or(5),
                        ),
                )
            }
        };

        Ok(Self { backend })
    }
}
