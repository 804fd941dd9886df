mod platform;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Upload a road video for vehicle detection and follow it to completion.
#[derive(Debug, Clone, Parser)]
#[command(name = "roadwatch", version)]
pub struct Cli {
    /// Video to process (MP4, AVI or MOV, at most 500MB).
    pub video: PathBuf,

    /// Backend origin, e.g. http://localhost:8000. Overrides the config file.
    #[arg(long)]
    pub server: Option<String>,

    /// RON config file. Defaults to ./roadwatch.ron when present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Download the processed video into this directory.
    #[arg(long = "download-dir")]
    pub download_dir: Option<PathBuf>,

    /// Open the processed video with the system viewer.
    #[arg(long)]
    pub open: bool,

    /// Write logs to ./roadwatch.log instead of the terminal.
    #[arg(long = "log-file")]
    pub log_file: bool,

    #[arg(long, short)]
    pub verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    platform::logging::initialize(&cli);

    match platform::run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("roadwatch: {err:#}");
            ExitCode::FAILURE
        }
    }
}
