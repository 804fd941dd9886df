//! Logging initialization for the roadwatch binary.
//!
//! Logs go to the terminal at warn level by default so they do not fight the
//! progress bar; `--log-file` sends them to `./roadwatch.log` at info level.

use std::path::PathBuf;

use log::LevelFilter;
use roadwatch_logging::{LogDestination, DEFAULT_LOG_FILE};

use crate::Cli;

pub fn initialize(cli: &Cli) {
    let (destination, level) = destination_for(cli);
    if !roadwatch_logging::initialize(destination, level) {
        eprintln!("Warning: logging is disabled");
    }
}

fn destination_for(cli: &Cli) -> (LogDestination, LevelFilter) {
    match (cli.log_file, cli.verbose) {
        (true, true) => (
            LogDestination::File(PathBuf::from(DEFAULT_LOG_FILE)),
            LevelFilter::Debug,
        ),
        (true, false) => (
            LogDestination::File(PathBuf::from(DEFAULT_LOG_FILE)),
            LevelFilter::Info,
        ),
        (false, true) => (LogDestination::Terminal, LevelFilter::Debug),
        (false, false) => (LogDestination::Terminal, LevelFilter::Warn),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn log_file_flag_selects_file_destination() {
        let cli = Cli::parse_from(["roadwatch", "clip.mp4", "--log-file"]);
        assert_eq!(
            destination_for(&cli),
            (
                LogDestination::File(PathBuf::from(DEFAULT_LOG_FILE)),
                LevelFilter::Info
            )
        );

        let cli = Cli::parse_from(["roadwatch", "clip.mp4", "-v"]);
        assert_eq!(
            destination_for(&cli),
            (LogDestination::Terminal, LevelFilter::Debug)
        );
    }
}
