//! Maps validated CLI matches to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{backend, cookie, tickets, ARG_BASE_PATH, ARG_PORT, ARG_PUBLIC_URL};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let base_path = matches
        .get_one::<String>(ARG_BASE_PATH)
        .cloned()
        .unwrap_or_default();
    let public_url = matches.get_one::<String>(ARG_PUBLIC_URL).cloned();

    let cookie_opts = cookie::Options::parse(matches)?;
    let backend_opts = backend::Options::parse(matches)?;
    let ticket_opts = tickets::Options::parse(matches);

    Ok(Action::Server(Args {
        port,
        base_path,
        public_url,
        secret: cookie_opts.secret,
        hash_secret: cookie_opts.hash_secret,
        secure_cookie: cookie_opts.secure,
        backend: backend_opts.backend,
        gc_period_seconds: ticket_opts.gc_period_seconds,
        lt_ttl_seconds: ticket_opts.lt_ttl_seconds,
        tgt_ttl_seconds: ticket_opts.tgt_ttl_seconds,
        lockout_window_seconds: ticket_opts.lockout_window_seconds,
        require_login_ticket: ticket_opts.require_login_ticket,
    }))
}
