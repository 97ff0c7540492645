use crate::api::BackendConfig;
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use std::time::Duration;

pub const ARG_SUPABASE_URL: &str = "supabase-url";
pub const ARG_ANON_KEY: &str = "anon-key";
pub const ARG_TIMEOUT: &str = "timeout";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SUPABASE_URL)
                .long(ARG_SUPABASE_URL)
                .help("Supabase project URL, example: https://<project>.supabase.co")
                .env("CHECKIN_SUPABASE_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_ANON_KEY)
                .long(ARG_ANON_KEY)
                .help("Supabase anon key, sent as the apikey header")
                .env("CHECKIN_SUPABASE_ANON_KEY")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Backend request timeout in seconds")
                .env("CHECKIN_TIMEOUT")
                .default_value("10")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

/// Builds the backend configuration from the parsed arguments.
///
/// # Errors
/// Returns an error if the URL or anon key is missing, or the URL is invalid.
pub fn parse(matches: &ArgMatches) -> Result<BackendConfig> {
    let url = matches
        .get_one::<String>(ARG_SUPABASE_URL)
        .context("missing required argument: --supabase-url")?;
    let anon_key = matches
        .get_one::<String>(ARG_ANON_KEY)
        .cloned()
        .context("missing required argument: --anon-key")?;
    let timeout = matches.get_one::<u64>(ARG_TIMEOUT).copied().unwrap_or(10);

    let config = BackendConfig::new(url, SecretString::from(anon_key))
        .context("invalid CHECKIN_SUPABASE_URL")?
        .with_timeout(Duration::from_secs(timeout));

    Ok(config)
}
