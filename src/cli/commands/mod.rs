pub mod backend;
pub mod cookie;
pub mod logging;
pub mod tickets;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";
pub const ARG_BASE_PATH: &str = "base-path";
pub const ARG_PUBLIC_URL: &str = "public-url";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("castgate")
        .about("CAS single sign-on ticket broker")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("CASTGATE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_BASE_PATH)
                .long(ARG_BASE_PATH)
                .help("Path prefix of every route, example: /cas")
                .default_value("")
                .env("CASTGATE_BASE_PATH"),
        )
        .arg(
            Arg::new(ARG_PUBLIC_URL)
                .long(ARG_PUBLIC_URL)
                .help("Externally visible origin, example: https://sso.example.org")
                .long_help(
                    "Externally visible origin, example: https://sso.example.org. When unset it is rebuilt from the Host and X-Forwarded-Proto headers.",
                )
                .env("CASTGATE_PUBLIC_URL"),
        );

    let command = cookie::with_args(command);
    let command = backend::with_args(command);
    let command = tickets::with_args(command);
    logging::with_args(command)
}
