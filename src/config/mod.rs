//! Configuration for the voice query widget
//!
//! The browser build uses [`Config::default`], which matches the page
//! contract. Native builds layer `~/.config/voice-query/config.toml` and
//! `VOICE_QUERY_*` environment variables on top (see [`Config::load`]).

#[cfg(not(target_arch = "wasm32"))]
pub mod file;

use url::Url;

use crate::api::PROCESS_VOICE_PATH;
use crate::{Error, Result};

/// Server used by the CLI when none is configured (Flask's default port)
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Size of the fragments a clip is replayed in
pub const DEFAULT_FRAGMENT_BYTES: usize = 16 * 1024;

/// Widget configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the server; the browser uses the page location instead
    pub server_url: Option<String>,

    /// Path (or absolute URL) of the voice endpoint
    pub endpoint: String,

    /// Page element identifiers
    pub elements: ElementIds,

    /// Play spoken answers
    pub playback: bool,

    /// Fragment size when replaying a recorded clip
    pub fragment_bytes: usize,
}

/// Identifiers of the page elements the widget binds to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementIds {
    /// Toggle button
    pub record_button: String,

    /// Status label
    pub status: String,

    /// Question panel (text goes into its first `<p>`)
    pub question: String,

    /// Answer panel (text goes into its first `<p>`)
    pub answer: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            record_button: "recordButton".to_string(),
            status: "status".to_string(),
            question: "question".to_string(),
            answer: "answer".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: None,
            endpoint: PROCESS_VOICE_PATH.to_string(),
            elements: ElementIds::default(),
            playback: true,
            fragment_bytes: DEFAULT_FRAGMENT_BYTES,
        }
    }
}

impl Config {
    /// Resolve the endpoint against `base`
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint is not a valid URL reference
    pub fn endpoint_url(&self, base: &Url) -> Result<Url> {
        Ok(base.join(&self.endpoint)?)
    }

    /// Base URL for native clients
    ///
    /// # Errors
    ///
    /// Returns error if the configured server URL cannot be parsed
    pub fn server_base(&self) -> Result<Url> {
        let raw = self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL);
        let url = Url::parse(raw)?;

        if url.cannot_be_a_base() {
            return Err(Error::Config(format!("server url cannot be a base: {raw}")));
        }

        Ok(url)
    }

    /// Check values that would only fail later
    ///
    /// # Errors
    ///
    /// Returns error if a value is out of range
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::Config("endpoint must not be empty".to_string()));
        }

        if self.fragment_bytes == 0 {
            return Err(Error::Config("fragment_bytes must be positive".to_string()));
        }

        Ok(())
    }

    /// Load configuration from the config file and environment
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        let config = Self::from_sources(fc, |key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Merge defaults, file values and environment lookups (in that order)
    #[cfg(not(target_arch = "wasm32"))]
    fn from_sources<F>(fc: file::ConfigFile, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let elements = ElementIds {
            record_button: fc
                .elements
                .record_button
                .unwrap_or(defaults.elements.record_button),
            status: fc.elements.status.unwrap_or(defaults.elements.status),
            question: fc.elements.question.unwrap_or(defaults.elements.question),
            answer: fc.elements.answer.unwrap_or(defaults.elements.answer),
        };

        let playback = env("VOICE_QUERY_PLAYBACK")
            .and_then(|v| parse_flag(&v))
            .or(fc.playback.enabled)
            .unwrap_or(defaults.playback);

        Self {
            server_url: env("VOICE_QUERY_SERVER").or(fc.server.url),
            endpoint: env("VOICE_QUERY_ENDPOINT")
                .or(fc.server.endpoint)
                .unwrap_or(defaults.endpoint),
            elements,
            playback,
            fragment_bytes: fc.capture.fragment_bytes.unwrap_or(defaults.fragment_bytes),
        }
    }
}

/// Parse a boolean-ish environment value
#[cfg(not(target_arch = "wasm32"))]
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(value, "ignoring unrecognized boolean");
            None
        }
    }
}
