use anyhow::Result;
use std::path::Path;
use std::process::Command;
use which::which;
use ytcsv_core::{config::Settings, downloader::Downloader};

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    println!("ytcsv dependency check\n");

    let mut all_ok = true;

    // Settings and API key
    print!("api key:       ");
    let settings = match Settings::load(config_path) {
        Ok(settings) => {
            println!("OK ({})", settings.masked_api_key());
            Some(settings)
        }
        Err(e) => {
            println!("ERROR");
            println!("           {}", e);
            all_ok = false;
            None
        }
    };

    // Check downloader
    print!("yt-dlp:        ");
    let downloader = settings
        .as_ref()
        .map(Downloader::locate)
        .and_then(|d| d.program().map(Path::to_path_buf))
        .or_else(|| which("yt-dlp").or_else(|_| which("youtube-dl")).ok());
    match downloader {
        Some(path) => match version_line(&path, "--version") {
            Some(v) => println!("OK ({}, {})", v, path.display()),
            None => {
                println!("FOUND at {} but failed to get version", path.display());
                all_ok = false;
            }
        },
        None => {
            println!("NOT FOUND");
            println!("           Install with: pip install yt-dlp");
            all_ok = false;
        }
    }

    // yt-dlp needs FFmpeg for audio extraction and thumbnail embedding
    print!("ffmpeg:        ");
    match which("ffmpeg") {
        Ok(path) => match version_line(&path, "-version") {
            Some(first_line) => {
                // Extract just version number
                let version_part = first_line.split_whitespace().nth(2).unwrap_or("unknown");
                println!("OK ({})", version_part);
            }
            None => {
                println!("FOUND but failed to get version");
                all_ok = false;
            }
        },
        Err(_) => {
            println!("NOT FOUND");
            println!("           Install with: brew install ffmpeg");
            all_ok = false;
        }
    }

    println!();
    if all_ok {
        println!("All dependencies OK!");
    } else {
        println!("Some dependencies are missing. See above for installation instructions.");
    }

    Ok(())
}

fn version_line(program: &Path, flag: &str) -> Option<String> {
    let out = Command::new(program).arg(flag).output().ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
}
