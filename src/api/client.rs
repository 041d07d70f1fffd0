//! HTTP client for `/process_voice`

use url::Url;

use super::{AudioUpload, VoiceQueryResult};
use crate::{Error, Result};

/// Uploads recordings and decodes the server's answer
#[derive(Debug, Clone)]
pub struct VoiceClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl VoiceClient {
    /// Create a client posting to `endpoint`
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Create a client reusing an existing `reqwest` client
    #[must_use]
    pub const fn with_client(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// Endpoint this client posts to
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Upload a finalized recording
    ///
    /// The body is decoded as JSON regardless of the HTTP status, since the
    /// server reports failures as `{"success": false, ...}`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body cannot be decoded
    pub async fn submit(&self, upload: AudioUpload) -> Result<VoiceQueryResult> {
        let session = upload.session;
        tracing::debug!(
            %session,
            audio_bytes = upload.len(),
            endpoint = %self.endpoint,
            "uploading recording"
        );

        let form = upload.into_form()?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(%session, error = %e, "upload request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(%session, status = %status, "received response");

        let body = response.bytes().await?;

        match VoiceQueryResult::from_json(&body) {
            Ok(result) => {
                tracing::info!(
                    %session,
                    answered = matches!(result, VoiceQueryResult::Answered(_)),
                    "voice query complete"
                );
                Ok(result)
            }
            Err(_) if !status.is_success() => {
                let text = String::from_utf8_lossy(&body);
                tracing::error!(%session, status = %status, body = %text, "server error");
                Err(Error::Protocol(format!("server returned {status}")))
            }
            Err(e) => {
                tracing::error!(%session, error = %e, "failed to parse response");
                Err(e)
            }
        }
    }
}
