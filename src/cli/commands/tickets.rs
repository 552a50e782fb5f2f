use clap::{Arg, ArgAction, Command};

pub const ARG_GC_PERIOD_SECONDS: &str = "gc-period-seconds";
pub const ARG_LT_TTL_SECONDS: &str = "lt-ttl-seconds";
pub const ARG_TGT_TTL_SECONDS: &str = "tgt-ttl-seconds";
pub const ARG_LOCKOUT_WINDOW_SECONDS: &str = "lockout-window-seconds";
pub const ARG_REQUIRE_LOGIN_TICKET: &str = "require-login-ticket";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_GC_PERIOD_SECONDS)
                .long(ARG_GC_PERIOD_SECONDS)
                .help("Service ticket lifetime and garbage collection period in seconds")
                .env("CASTGATE_GC_PERIOD_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_LT_TTL_SECONDS)
                .long(ARG_LT_TTL_SECONDS)
                .help("Login ticket lifetime in seconds")
                .env("CASTGATE_LT_TTL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_TGT_TTL_SECONDS)
                .long(ARG_TGT_TTL_SECONDS)
                .help("Ticket-granting ticket (and CASTGC cookie) lifetime in seconds")
                .env("CASTGATE_TGT_TTL_SECONDS")
                .default_value("28800")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_LOCKOUT_WINDOW_SECONDS)
                .long(ARG_LOCKOUT_WINDOW_SECONDS)
                .help("Failed login window in seconds")
                .env("CASTGATE_LOCKOUT_WINDOW_SECONDS")
                .default_value("30")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_REQUIRE_LOGIN_TICKET)
                .long(ARG_REQUIRE_LOGIN_TICKET)
                .help("Reject credential posts without a login ticket")
                .env("CASTGATE_REQUIRE_LOGIN_TICKET")
                .action(ArgAction::SetTrue),
        )
}

pub struct Options {
    pub gc_period_seconds: u64,
    pub lt_ttl_seconds: u64,
    pub tgt_ttl_seconds: u64,
    pub lockout_window_seconds: i64,
    pub require_login_ticket: bool,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &clap::ArgMatches) -> Self {
        Self {
            gc_period_seconds: matches
                .get_one::<u64>(ARG_GC_PERIOD_SECONDS)
                .copied()
                .unwrap_or(300),
            lt_ttl_seconds: matches
                .get_one::<u64>(ARG_LT_TTL_SECONDS)
                .copied()
                .unwrap_or(300),
            tgt_ttl_seconds: matches
                .get_one::<u64>(ARG_TGT_TTL_SECONDS)
                .copied()
                .unwrap_or(28_800),
            lockout_window_seconds: matches
                .get_one::<i64>(ARG_LOCKOUT_WINDOW_SECONDS)
                .copied()
                .unwrap_or(30),
            require_login_ticket: matches.get_flag(ARG_REQUIRE_LOGIN_TICKET),
        }
    }
}
