//! TOML configuration file loading
//!
//! Supports `~/.config/voice-query/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Server location
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Page element identifiers
    #[serde(default)]
    pub elements: ElementsFileConfig,

    /// Answer playback
    #[serde(default)]
    pub playback: PlaybackFileConfig,

    /// Clip replay
    #[serde(default)]
    pub capture: CaptureFileConfig,
}

/// Server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Base URL (e.g. "http://127.0.0.1:5000")
    pub url: Option<String>,

    /// Endpoint path (e.g. "/process_voice")
    pub endpoint: Option<String>,
}

/// Element identifier overrides
#[derive(Debug, Default, Deserialize)]
pub struct ElementsFileConfig {
    pub record_button: Option<String>,
    pub status: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
}

/// Playback configuration
#[derive(Debug, Default, Deserialize)]
pub struct PlaybackFileConfig {
    /// Play spoken answers
    pub enabled: Option<bool>,
}

/// Capture configuration
#[derive(Debug, Default, Deserialize)]
pub struct CaptureFileConfig {
    /// Fragment size in bytes when replaying a clip
    pub fragment_bytes: Option<usize>,
}

/// Load the config file from disk
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ConfigFile {
    let Some(path) = config_file_path() else {
        return ConfigFile::default();
    };

    if !path.exists() {
        return ConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/voice-query/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("voice-query").join("config.toml"))
}
