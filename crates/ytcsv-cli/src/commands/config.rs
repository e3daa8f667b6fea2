use anyhow::Result;
use std::path::Path;
use ytcsv_core::config::{default_settings_path, Settings, API_KEY_ENV};

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let settings = Settings::load_unvalidated(config_path)?;

    println!("ytcsv configuration\n");

    println!("  AUDIO_FORMAT    = {:?}", settings.audio_format.as_str());
    println!("  AUDIO_QUALITY   = {}", settings.audio_quality);
    println!("  YOUTUBE_API_KEY = {}", settings.masked_api_key());
    if let Some(ref p) = settings.downloader_path {
        println!("  DOWNLOADER_PATH = {:?}", p);
    } else {
        println!("  DOWNLOADER_PATH = (auto-detect)");
    }

    // Show settings sources
    println!("\nSettings sources (in priority order):");
    match config_path {
        Some(p) => println!("  1. {} (specified)", p.display()),
        None => {
            if let Some(p) = default_settings_path() {
                println!("  1. {}", p.display());
            }
        }
    }
    println!("  2. Environment variable ({})", API_KEY_ENV);

    Ok(())
}
