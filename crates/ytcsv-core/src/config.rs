//! Settings loading for ytcsv
//!
//! Effective settings are merged from, lowest priority first: built-in
//! defaults, the `YOUTUBE_API_KEY` environment variable, and the JSON settings
//! file (`youtube-csv-dl/config.json` under the user config directory unless
//! another path is given).

use crate::error::{ConfigError, DownloadError};
use figment::{
    providers::{Format, Json, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable consulted for the API key.
pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// Highest value accepted by yt-dlp's `--audio-quality` VBR scale.
pub const MAX_AUDIO_QUALITY: u8 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Target audio format passed to the downloader
    pub audio_format: AudioFormat,
    /// VBR quality, 0 (best) to 10 (worst)
    pub audio_quality: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_api_key: Option<String>,
    /// Path to the downloader binary (auto-detected if not set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloader_path: Option<PathBuf>,
}

/// Audio formats understood by yt-dlp's `--audio-format`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Aac,
    Alac,
    Flac,
    M4a,
    Mp3,
    Opus,
    Vorbis,
    Wav,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Aac => "aac",
            AudioFormat::Alac => "alac",
            AudioFormat::Flac => "flac",
            AudioFormat::M4a => "m4a",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Opus => "opus",
            AudioFormat::Vorbis => "vorbis",
            AudioFormat::Wav => "wav",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the on-disk settings file. Keys are upper-case; anything else is
/// ignored.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(
        default,
        rename(deserialize = "AUDIO_FORMAT"),
        skip_serializing_if = "Option::is_none"
    )]
    audio_format: Option<AudioFormat>,
    #[serde(
        default,
        rename(deserialize = "AUDIO_QUALITY"),
        skip_serializing_if = "Option::is_none"
    )]
    audio_quality: Option<u8>,
    #[serde(
        default,
        rename(deserialize = "YOUTUBE_API_KEY"),
        skip_serializing_if = "Option::is_none"
    )]
    youtube_api_key: Option<String>,
    #[serde(
        default,
        rename(deserialize = "DOWNLOADER_PATH"),
        skip_serializing_if = "Option::is_none"
    )]
    downloader_path: Option<PathBuf>,
}

impl SettingsFile {
    /// Blank strings in the file never shadow the environment or defaults.
    fn without_blanks(mut self) -> Self {
        self.youtube_api_key = self.youtube_api_key.filter(|k| !k.trim().is_empty());
        self.downloader_path = self
            .downloader_path
            .filter(|p| !p.as_os_str().is_empty());
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            audio_format: AudioFormat::Mp3,
            audio_quality: 0,
            youtube_api_key: None,
            downloader_path: None,
        }
    }
}

impl Settings {
    /// Load settings from the settings file and the process environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_file, std::env::var(API_KEY_ENV).ok())
    }

    /// Load settings with an explicit value standing in for `YOUTUBE_API_KEY`
    pub fn load_with_env(
        config_file: Option<&Path>,
        env_api_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let (settings, path) = Self::merge(config_file, env_api_key)?;
        settings.validate(path.as_deref())?;
        Ok(settings)
    }

    /// Load settings without requiring an API key or checking ranges, for
    /// inspecting what is configured
    pub fn load_unvalidated(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::merge(config_file, std::env::var(API_KEY_ENV).ok()).map(|(settings, _)| settings)
    }

    fn merge(
        config_file: Option<&Path>,
        env_api_key: Option<String>,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        if let Some(key) = env_api_key.filter(|k| !k.trim().is_empty()) {
            figment = figment.merge(Serialized::default("youtube_api_key", key));
        }

        let path = config_file
            .map(Path::to_path_buf)
            .or_else(default_settings_path);

        if let Some(ref path) = path {
            if path.exists() {
                debug!("Loading settings from {}", path.display());
                let file: SettingsFile = Figment::from(Json::file(path))
                    .extract()
                    .map_err(|e| ConfigError::LoadError {
                        path: path.clone(),
                        reason: e.to_string(),
                    })?;
                figment = figment.merge(Serialized::defaults(file.without_blanks()));
            } else {
                debug!("No settings file at {}, using defaults", path.display());
            }
        }

        let settings: Settings = figment.extract().map_err(|e| ConfigError::LoadError {
            path: path.clone().unwrap_or_default(),
            reason: e.to_string(),
        })?;

        Ok((settings, path))
    }

    fn validate(&self, path: Option<&Path>) -> Result<(), ConfigError> {
        if self.api_key().is_none() {
            let location = path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "the settings file".to_string());
            return Err(ConfigError::MissingApiKey(location));
        }

        if self.audio_quality > MAX_AUDIO_QUALITY {
            return Err(ConfigError::InvalidValue(format!(
                "AUDIO_QUALITY must be between 0 and {}, got {}",
                MAX_AUDIO_QUALITY, self.audio_quality
            )));
        }

        Ok(())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.youtube_api_key.as_deref()
    }

    /// API key with everything but the last four characters hidden
    pub fn masked_api_key(&self) -> String {
        let Some(key) = self.api_key() else {
            return "(not set)".to_string();
        };

        let len = key.chars().count();
        if len <= 4 {
            return "*".repeat(len);
        }
        let visible: String = key.chars().skip(len - 4).collect();
        format!("{}{}", "*".repeat(len - 4), visible)
    }

    /// Get the downloader path, auto-detecting if not configured
    pub fn downloader_path(&self) -> Result<PathBuf, DownloadError> {
        if let Some(ref path) = self.downloader_path {
            return Ok(path.clone());
        }

        which::which("yt-dlp")
            .or_else(|_| which::which("youtube-dl"))
            .map_err(|_| DownloadError::ToolNotFound)
    }
}

/// Default settings file location under the user's config directory
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("youtube-csv-dl/config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_settings(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults_with_env_key() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.json");

        let settings = Settings::load_with_env(Some(missing.as_path()), Some("env-key".into())).unwrap();
        assert_eq!(settings.audio_format, AudioFormat::Mp3);
        assert_eq!(settings.audio_quality, 0);
        assert_eq!(settings.api_key(), Some("env-key"));
        assert!(settings.downloader_path.is_none());
    }

    #[test]
    fn test_file_with_only_format_falls_back_to_env() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(&dir, r#"{ "AUDIO_FORMAT": "flac" }"#);

        let settings = Settings::load_with_env(Some(path.as_path()), Some("env-key".into())).unwrap();
        assert_eq!(settings.audio_format, AudioFormat::Flac);
        assert_eq!(settings.audio_quality, 0);
        assert_eq!(settings.api_key(), Some("env-key"));
    }

    #[test]
    fn test_file_key_overrides_env() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(
            &dir,
            r#"{ "YOUTUBE_API_KEY": "file-key", "AUDIO_QUALITY": 5, "EXTRA": true }"#,
        );

        let settings = Settings::load_with_env(Some(path.as_path()), Some("env-key".into())).unwrap();
        assert_eq!(settings.api_key(), Some("file-key"));
        assert_eq!(settings.audio_quality, 5);
    }

    #[test]
    fn test_blank_file_key_does_not_shadow_env() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(&dir, r#"{ "YOUTUBE_API_KEY": "  " }"#);

        let settings = Settings::load_with_env(Some(path.as_path()), Some("env-key".into())).unwrap();
        assert_eq!(settings.api_key(), Some("env-key"));
    }

    #[test]
    fn test_downloader_path_from_file() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(
            &dir,
            r#"{ "YOUTUBE_API_KEY": "k", "DOWNLOADER_PATH": "/opt/bin/yt-dlp" }"#,
        );

        let settings = Settings::load_with_env(Some(path.as_path()), None).unwrap();
        assert_eq!(
            settings.downloader_path().unwrap(),
            PathBuf::from("/opt/bin/yt-dlp")
        );
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.json");

        let err = Settings::load_with_env(Some(missing.as_path()), None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey(_)));

        let err = Settings::load_with_env(Some(missing.as_path()), Some(String::new())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey(_)));
    }

    #[test]
    fn test_merge_without_api_key_keeps_file_values() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(&dir, r#"{ "AUDIO_FORMAT": "wav", "AUDIO_QUALITY": 12 }"#);

        let (settings, source) = Settings::merge(Some(path.as_path()), None).unwrap();
        assert_eq!(settings.audio_format, AudioFormat::Wav);
        assert_eq!(settings.audio_quality, 12);
        assert_eq!(settings.api_key(), None);
        assert_eq!(source, Some(path));
    }

    #[test]
    fn test_malformed_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(&dir, r#"{ "AUDIO_FORMAT": "mp3", "#);

        let err = Settings::load_with_env(Some(path.as_path()), Some("env-key".into())).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError { .. }));
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(&dir, r#"{ "AUDIO_FORMAT": "midi" }"#);

        let err = Settings::load_with_env(Some(path.as_path()), Some("env-key".into())).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError { .. }));
    }

    #[test]
    fn test_quality_out_of_range() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(&dir, r#"{ "AUDIO_QUALITY": 11 }"#);

        let err = Settings::load_with_env(Some(path.as_path()), Some("env-key".into())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_default_settings_path_is_under_config_dir() {
        if let Some(config_dir) = dirs::config_dir() {
            assert_eq!(
                default_settings_path(),
                Some(config_dir.join("youtube-csv-dl").join("config.json"))
            );
        }
    }

    #[test]
    fn test_masked_api_key() {
        let settings = Settings {
            youtube_api_key: Some("AIzaSyExample1234".into()),
            ..Settings::default()
        };
        assert_eq!(settings.masked_api_key(), "*************1234");
        assert_eq!(Settings::default().masked_api_key(), "(not set)");
    }
}
