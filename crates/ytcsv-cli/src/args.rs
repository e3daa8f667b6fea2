use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ytcsv")]
#[command(
    author,
    version,
    about = "Download tagged audio for every song in a semicolon-separated list"
)]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Song list, one `Song;Artist` per line
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Settings file path (defaults to youtube-csv-dl/config.json in the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the downloader, ffmpeg and an API key are available
    Doctor,

    /// Show effective settings
    Config,
}
