//! ytcsv-core: look up songs from a delimited list on YouTube and extract their audio

pub mod batch;
pub mod config;
pub mod downloader;
pub mod error;
pub mod input;
pub mod search;

pub use config::Settings;
pub use error::{Result, YtCsvError};
