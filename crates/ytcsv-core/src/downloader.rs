//! Audio extraction by shelling out to yt-dlp (or legacy youtube-dl)

use crate::config::Settings;
use crate::error::DownloadError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Output name template, relative to the output directory
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Splits "Artist - Title" video titles into artist/title tags.
///
/// Runs after the download so the output filename keeps the full video title.
const TITLE_METADATA: &str = "post_process:title:%(artist)s - %(title)s";

/// youtube-dl spelling of the same title split
const LEGACY_TITLE_METADATA: &str = "%(artist)s - %(title)s";

/// Converts a video URL into a tagged audio file in `output_dir`
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(
        &self,
        url: &str,
        settings: &Settings,
        output_dir: &Path,
    ) -> Result<(), DownloadError>;
}

/// Which command-line dialect the downloader speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    YtDlp,
    YoutubeDl,
}

impl Flavor {
    pub fn for_program(program: &Path) -> Self {
        match program.file_stem().and_then(|s| s.to_str()) {
            Some("youtube-dl") => Flavor::YoutubeDl,
            _ => Flavor::YtDlp,
        }
    }
}

#[derive(Debug)]
pub struct Downloader {
    program: Option<PathBuf>,
}

impl Downloader {
    pub fn new(program: PathBuf) -> Self {
        Self {
            program: Some(program),
        }
    }

    /// Locate the downloader from settings or `PATH`.
    ///
    /// A missing tool is only logged here; each download then fails on its own.
    pub fn locate(settings: &Settings) -> Self {
        match settings.downloader_path() {
            Ok(program) => {
                debug!("Using downloader at {}", program.display());
                Self::new(program)
            }
            Err(e) => {
                warn!("{}", e);
                Self { program: None }
            }
        }
    }

    pub fn program(&self) -> Option<&Path> {
        self.program.as_deref()
    }
}

/// Command-line arguments for one download
pub fn build_args(
    flavor: Flavor,
    url: &str,
    settings: &Settings,
    output_dir: &Path,
) -> Vec<OsString> {
    let quality = settings.audio_quality.to_string();

    let mut args: Vec<OsString> = [
        // Audio only
        "--extract-audio",
        // Don't copy the upload date onto the file
        "--no-mtime",
        "--audio-format",
        settings.audio_format.as_str(),
        "--audio-quality",
        quality.as_str(),
        "--add-metadata",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    match flavor {
        Flavor::YtDlp => {
            args.extend(["--parse-metadata", TITLE_METADATA].map(OsString::from));
        }
        Flavor::YoutubeDl => {
            args.extend(
                [
                    "--metadata-from-title",
                    LEGACY_TITLE_METADATA,
                    // Needed for thumbnail embedding
                    "--prefer-ffmpeg",
                ]
                .map(OsString::from),
            );
        }
    }

    args.push("--embed-thumbnail".into());
    args.push("-o".into());
    args.push(output_dir.join(OUTPUT_TEMPLATE).into_os_string());
    args.push(url.into());
    args
}

#[async_trait]
impl Converter for Downloader {
    async fn convert(
        &self,
        url: &str,
        settings: &Settings,
        output_dir: &Path,
    ) -> Result<(), DownloadError> {
        let program = self.program.as_deref().ok_or(DownloadError::ToolNotFound)?;
        info!("Downloading audio from: {}", url);

        let output = Command::new(program)
            .args(build_args(
                Flavor::for_program(program),
                url,
                settings,
                output_dir,
            ))
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            info!("{}", line);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("{} stderr: {}", program.display(), stderr.trim());
            return Err(DownloadError::Failed(output.status.code()));
        }

        Ok(())
    }
}
