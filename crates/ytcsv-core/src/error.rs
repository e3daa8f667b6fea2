//! Error types for ytcsv-core

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, YtCsvError>;

#[derive(Error, Debug)]
pub enum YtCsvError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Search failed: {0}")]
    Search(#[from] SearchError),

    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load settings from {path}: {reason}")]
    LoadError { path: PathBuf, reason: String },

    #[error(
        "No YouTube API key configured! Add YOUTUBE_API_KEY to {0} or export it to your environment"
    )]
    MissingApiKey(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Error reading file at path {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing input at line {line}: {reason}")]
    Parse { line: u64, reason: String },

    #[error("Cannot derive an output directory from {0}")]
    NoOutputDir(PathBuf),
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Could not find YouTube videos matching {0:?}")]
    NoResults(String),

    /// Built with `without_url` so the API key never reaches the message
    #[error("Search request failed: {0}")]
    Http(reqwest::Error),

    #[error("Search API returned {status}: {message}")]
    Api { status: u16, message: String },
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("yt-dlp not found. Install with: pip install yt-dlp (or set DOWNLOADER_PATH)")]
    ToolNotFound,

    #[error("Downloader failed with exit code: {0:?}")]
    Failed(Option<i32>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
