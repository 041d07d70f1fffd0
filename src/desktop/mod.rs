//! Terminal host
//!
//! Runs the recording controller from the command line: a recorded clip
//! stands in for the microphone, status and panels are printed to stdout,
//! and spoken answers go to the default output device.

mod clip;

use url::Url;

use crate::api::VoiceClient;
use crate::voice::{AudioPlayback, Effect, Host, Inbox, Input, STATUS_UNSUPPORTED};
use crate::{Config, Error, Result};

pub use clip::{ClipSource, OpenClip, WEBM_MAGIC};

/// What the terminal currently shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    /// Last status line
    pub status: String,

    /// Revealed question, if any
    pub question: Option<String>,

    /// Revealed answer, if any
    pub answer: Option<String>,

    /// Trigger was disabled by the capability guard
    pub trigger_disabled: bool,
}

/// Host that replays a clip and prints results
pub struct TerminalHost {
    clip: ClipSource,
    opened: Option<OpenClip>,
    client: VoiceClient,
    http: reqwest::Client,
    audio_base: Url,
    screen: Screen,
}

impl TerminalHost {
    /// Create a host for `clip` talking to the configured server
    ///
    /// # Errors
    ///
    /// Returns error if the server or endpoint URL is invalid
    pub fn new(config: &Config, clip: ClipSource) -> Result<Self> {
        Self::with_http(config, clip, reqwest::Client::new())
    }

    /// Like [`TerminalHost::new`], sharing an existing HTTP client
    ///
    /// # Errors
    ///
    /// Returns error if the server or endpoint URL is invalid
    pub fn with_http(config: &Config, clip: ClipSource, http: reqwest::Client) -> Result<Self> {
        let base = config.server_base()?;
        let endpoint = config.endpoint_url(&base)?;

        let client = VoiceClient::with_client(http.clone(), endpoint);
        tracing::debug!(
            endpoint = %client.endpoint(),
            clip = %clip.path().display(),
            "terminal host ready"
        );

        Ok(Self {
            clip,
            opened: None,
            client,
            http,
            audio_base: base,
            screen: Screen::default(),
        })
    }

    /// Whether the clip can be used as a recording source
    #[must_use]
    pub fn capture_supported(&self) -> bool {
        self.clip.is_available()
    }

    /// Current terminal contents
    #[must_use]
    pub const fn screen(&self) -> &Screen {
        &self.screen
    }

    fn acquire(&mut self, inbox: &Inbox) {
        match self.clip.open() {
            Ok(clip) => {
                self.opened = Some(clip);
                inbox.send(Input::MicrophoneReady);
            }
            Err(e) => inbox.send(Input::MicrophoneFailed(e)),
        }
    }

    fn start_recorder(&mut self, mime_type: &str, inbox: &Inbox) {
        let Some(clip) = self.opened.take() else {
            inbox.send(Input::RecorderFailed(Error::Recorder(
                "recorder started without an open clip".to_string(),
            )));
            return;
        };

        tracing::debug!(mime_type, "replaying clip");
        tokio::spawn(clip.replay(inbox.clone()));
    }

    fn upload(&self, upload: crate::api::AudioUpload, inbox: &Inbox) {
        let client = self.client.clone();
        let inbox = inbox.clone();
        tokio::spawn(async move {
            let result = client.submit(upload).await;
            inbox.send(Input::ResponseReceived(result));
        });
    }

    fn play(&self, url: &str, inbox: &Inbox) {
        let target = match self.audio_base.join(url) {
            Ok(target) => target,
            Err(e) => {
                inbox.send(Input::PlaybackFailed(Error::from(e).message()));
                return;
            }
        };

        let http = self.http.clone();
        let inbox = inbox.clone();
        tokio::spawn(async move {
            match fetch_and_play(http, target).await {
                Ok(()) => inbox.send(Input::PlaybackDone),
                Err(e) => inbox.send(Input::PlaybackFailed(e.message())),
            }
        });
    }
}

impl Host for TerminalHost {
    fn perform(&mut self, effect: Effect, inbox: &Inbox) {
        match effect {
            Effect::DisableTrigger => {
                self.screen.trigger_disabled = true;
            }
            Effect::SetStatus(text) => {
                let text = if text == STATUS_UNSUPPORTED {
                    missing_clip_status(&self.clip)
                } else {
                    text
                };
                println!("[{text}]");
                self.screen.status = text;
            }
            Effect::SetRecordingIndicator(on) => {
                tracing::debug!(recording = on, "recording indicator");
            }
            Effect::AcquireMicrophone => self.acquire(inbox),
            Effect::StartRecorder { mime_type } => self.start_recorder(mime_type, inbox),
            Effect::StopRecorder => {
                // Replay has already delivered every fragment by the time it asks to stop
                inbox.send(Input::Finalized);
            }
            Effect::ReleaseMicrophone => {
                self.opened = None;
            }
            Effect::Upload(upload) => self.upload(upload, inbox),
            Effect::RevealQuestion(text) => {
                println!("Question: {text}");
                self.screen.question = Some(text);
            }
            Effect::RevealAnswer(text) => {
                println!("Answer: {text}");
                self.screen.answer = Some(text);
            }
            Effect::PlayAudio(url) => self.play(&url, inbox),
        }
    }
}

/// Terminal wording for a host that has nothing to record from
fn missing_clip_status(clip: &ClipSource) -> String {
    format!("No recording found at {}", clip.path().display())
}

/// Download an MP3 answer and play it on the default output device
async fn fetch_and_play(http: reqwest::Client, url: Url) -> Result<()> {
    tracing::debug!(url = %url, "fetching answer audio");

    let response = http.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Playback(format!("{url} returned {status}")));
    }
    let bytes = response.bytes().await?;

    tokio::task::spawn_blocking(move || {
        let playback = AudioPlayback::new()?;
        playback.play_mp3_blocking(&bytes)
    })
    .await
    .map_err(|e| Error::Playback(e.to_string()))?
}
