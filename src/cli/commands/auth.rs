use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_ACCESS_TOKEN: &str = "access-token";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_ACCESS_TOKEN)
            .long(ARG_ACCESS_TOKEN)
            .help("Volunteer access token issued by Supabase auth after signing in")
            .env("CHECKIN_ACCESS_TOKEN")
            .hide_env_values(true)
            .global(true),
    )
}

/// Blank tokens count as signed out.
#[must_use]
pub fn parse(matches: &ArgMatches) -> Option<SecretString> {
    matches
        .get_one::<String>(ARG_ACCESS_TOKEN)
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .map(SecretString::from)
}
