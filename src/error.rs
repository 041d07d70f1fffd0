//! Error types for the voice query widget

use thiserror::Error;

/// Result type alias for widget operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing, uploading or playing back audio
#[derive(Debug, Error)]
pub enum Error {
    /// Host cannot capture audio at all
    #[error("recording unsupported: {0}")]
    Unsupported(String),

    /// User or platform refused microphone access
    #[error("microphone permission denied: {0}")]
    PermissionDenied(String),

    /// No usable capture device
    #[error("microphone unavailable: {0}")]
    DeviceUnavailable(String),

    /// Recorder could not be started or stopped
    #[error("recorder error: {0}")]
    Recorder(String),

    /// Server answered with a body that does not follow the protocol
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Audio reply could not be played
    #[error("playback error: {0}")]
    Playback(String),

    /// Audio device or decoding error
    #[error("audio error: {0}")]
    Audio(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing error
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// TOML parsing error
    #[cfg(not(target_arch = "wasm32"))]
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Coarse grouping of errors by where the attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Environment lacks recording support; the feature stays disabled
    CapabilityMissing,
    /// Microphone acquisition or recorder failure
    Device,
    /// Upload failed or the server reported an error
    NetworkOrServer,
    /// Everything else (config, local IO, playback)
    Local,
}

impl Error {
    /// Classify this error
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Unsupported(_) => ErrorCategory::CapabilityMissing,
            Self::PermissionDenied(_) | Self::DeviceUnavailable(_) | Self::Recorder(_) => {
                ErrorCategory::Device
            }
            Self::Protocol(_) | Self::Http(_) | Self::Serialization(_) => {
                ErrorCategory::NetworkOrServer
            }
            _ => ErrorCategory::Local,
        }
    }

    /// Message without the variant prefix, as shown in the status label
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Unsupported(m)
            | Self::PermissionDenied(m)
            | Self::DeviceUnavailable(m)
            | Self::Recorder(m)
            | Self::Protocol(m)
            | Self::Playback(m)
            | Self::Audio(m)
            | Self::Config(m) => m.clone(),
            Self::Io(e) => e.to_string(),
            Self::Http(e) => e.to_string(),
            Self::Serialization(e) => e.to_string(),
            Self::Url(e) => e.to_string(),
            #[cfg(not(target_arch = "wasm32"))]
            Self::Toml(e) => e.to_string(),
        }
    }
}
