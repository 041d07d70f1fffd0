//! Wire protocol for the `/process_voice` endpoint
//!
//! One request per recording: a multipart form carrying the recorded
//! Opus/WebM clip. The server answers with a JSON object whose `success`
//! flag selects between an answered question and an error message.

mod client;

use serde::{Deserialize, Serialize};

pub use client::VoiceClient;

use crate::voice::SessionId;
use crate::{Error, Result};

/// Default endpoint path, relative to the page or server origin
pub const PROCESS_VOICE_PATH: &str = "/process_voice";

/// Multipart field carrying the recording
pub const AUDIO_FIELD: &str = "audio";

/// File name announced for the recording
pub const AUDIO_FILE_NAME: &str = "recording.webm";

/// Fixed recording encoding (Opus in a `WebM` container)
pub const AUDIO_MIME_TYPE: &str = "audio/webm;codecs=opus";

/// Finalized recording ready to be uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioUpload {
    /// Session the audio was recorded in
    pub session: SessionId,

    /// Concatenated fragments
    pub audio: Vec<u8>,
}

impl AudioUpload {
    /// Size of the payload in bytes
    #[must_use]
    pub const fn len(&self) -> usize {
        self.audio.len()
    }

    /// Whether no audio was captured
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.audio.is_empty()
    }

    /// Build the multipart form sent to the endpoint
    ///
    /// # Errors
    ///
    /// Returns error if the content type cannot be parsed
    pub fn into_form(self) -> Result<reqwest::multipart::Form> {
        let part = reqwest::multipart::Part::bytes(self.audio)
            .file_name(AUDIO_FILE_NAME)
            .mime_str(AUDIO_MIME_TYPE)?;

        Ok(reqwest::multipart::Form::new().part(AUDIO_FIELD, part))
    }
}

/// Question and answer returned for a recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Transcribed question
    pub question: String,

    /// Answer text
    pub answer: String,

    /// Location of the spoken answer
    pub audio_url: String,
}

/// Outcome reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceQueryResult {
    /// `success: true`
    Answered(Answer),

    /// `success: false` with the server's message
    Rejected {
        /// Error text as reported by the server
        error: String,
    },
}

/// Raw JSON body of a `/process_voice` response
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct VoiceQueryResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TryFrom<VoiceQueryResponse> for VoiceQueryResult {
    type Error = Error;

    fn try_from(body: VoiceQueryResponse) -> Result<Self> {
        if !body.success {
            return Ok(Self::Rejected {
                error: body.error.unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        let missing = |field: &str| Error::Protocol(format!("response is missing `{field}`"));

        Ok(Self::Answered(Answer {
            question: body.question.ok_or_else(|| missing("question"))?,
            answer: body.answer.ok_or_else(|| missing("answer"))?,
            audio_url: body.audio_url.ok_or_else(|| missing("audio_url"))?,
        }))
    }
}

impl VoiceQueryResult {
    /// Decode a response body
    ///
    /// # Errors
    ///
    /// Returns error if the body is not JSON or misses required fields
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let raw: VoiceQueryResponse = serde_json::from_slice(body)?;
        raw.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answered() {
        let body = br#"{"success": true, "question": "Q", "answer": "A", "audio_url": "u"}"#;
        let result = VoiceQueryResult::from_json(body).unwrap();

        assert_eq!(
            result,
            VoiceQueryResult::Answered(Answer {
                question: "Q".to_string(),
                answer: "A".to_string(),
                audio_url: "u".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_rejected() {
        let body = br#"{"success": false, "error": "boom"}"#;
        let result = VoiceQueryResult::from_json(body).unwrap();

        assert_eq!(
            result,
            VoiceQueryResult::Rejected {
                error: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_rejected_without_message() {
        let body = br#"{"success": false}"#;
        let result = VoiceQueryResult::from_json(body).unwrap();

        assert!(matches!(result, VoiceQueryResult::Rejected { error } if error == "unknown error"));
    }

    #[test]
    fn test_answered_missing_field_is_protocol_error() {
        let body = br#"{"success": true, "question": "Q", "answer": "A"}"#;
        let err = VoiceQueryResult::from_json(body).unwrap_err();

        assert!(matches!(err, Error::Protocol(ref m) if m.contains("audio_url")));
    }

    #[test]
    fn test_non_json_body() {
        let err = VoiceQueryResult::from_json(b"<html>Internal Server Error</html>").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_upload_len() {
        let upload = AudioUpload {
            session: SessionId::new(1),
            audio: vec![0x1A, 0x45, 0xDF, 0xA3],
        };
        assert_eq!(upload.len(), 4);
        assert!(!upload.is_empty());
    }
}
