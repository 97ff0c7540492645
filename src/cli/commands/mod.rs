pub mod auth;
pub mod backend;
pub mod logging;
pub mod station;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const CMD_SETUP: &str = "setup";
pub const CMD_SCAN: &str = "scan";
pub const CMD_LOGOUT: &str = "logout";

pub const ARG_RELEASE_DELAY_MS: &str = "release-delay-ms";

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

    let command = Command::new("checkin")
        .about("Event check-in station")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(CMD_SETUP)
                .about("Fetch the volunteer's name and entry position and store them for scanning"),
        )
        .subcommand(
            Command::new(CMD_SCAN)
                .about("Scan attendee passes; a hand-held scanner types each code followed by Enter")
                .arg(
                    Arg::new(ARG_RELEASE_DELAY_MS)
                        .long(ARG_RELEASE_DELAY_MS)
                        .help("Pause in milliseconds between releasing the scanner and starting it again")
                        .env("CHECKIN_RELEASE_DELAY_MS")
                        .default_value("300")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand(
            Command::new(CMD_LOGOUT).about("Sign out and forget the station assignment"),
        );

    let command = backend::with_args(command);
    let command = auth::with_args(command);
    let command = station::with_args(command);
    logging::with_args(command)
}
