use crate::station::FileStationStore;
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

pub const ARG_STATION_FILE: &str = "station-file";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_STATION_FILE)
            .long(ARG_STATION_FILE)
            .help("Where the station assignment is kept between setup and scan (default: <tmp>/checkin/station.json)")
            .env("CHECKIN_STATION_FILE")
            .global(true)
            .value_parser(clap::value_parser!(PathBuf)),
    )
}

#[must_use]
pub fn parse(matches: &ArgMatches) -> PathBuf {
    matches
        .get_one::<PathBuf>(ARG_STATION_FILE)
        .cloned()
        .unwrap_or_else(FileStationStore::default_path)
}
