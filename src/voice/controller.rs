//! Recording controller state machine
//!
//! The controller never touches a device, the network or the page itself.
//! Hosts feed it [`Input`]s and carry out the [`Effect`]s it returns, which
//! keeps every transition testable without a browser or sound card.

use crate::api::{AUDIO_MIME_TYPE, Answer, AudioUpload, VoiceQueryResult};
use crate::{Error, Result};

use super::session::{RecordingSession, SessionId};

/// Status shown while recording
pub const STATUS_RECORDING: &str = "Recording...";

/// Status shown while the recording is finalized and uploaded
pub const STATUS_PROCESSING: &str = "Processing...";

/// Status shown after an answer was rendered
pub const STATUS_READY: &str = "Ready";

/// Status shown when the host cannot record at all
pub const STATUS_UNSUPPORTED: &str = "Your browser does not support audio recording";

/// Format a failure for the status label
#[must_use]
pub fn error_status(message: &str) -> String {
    format!("Error: {message}")
}

/// Recorder state visible to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    /// Not recording, ready to start
    #[default]
    Idle,
    /// Actively collecting fragments
    Recording,
}

/// Events delivered to the controller
#[derive(Debug)]
pub enum Input {
    /// Trigger pressed: stop when recording, start otherwise
    Toggle,
    /// Start a new recording
    StartRequested,
    /// Stop the current recording
    StopRequested,
    /// Microphone access was granted
    MicrophoneReady,
    /// Microphone access failed
    MicrophoneFailed(Error),
    /// Recorder could not be started
    RecorderFailed(Error),
    /// One chunk of encoded audio
    FragmentReceived(Vec<u8>),
    /// Recorder delivered its last fragment
    Finalized,
    /// Upload finished
    ResponseReceived(Result<VoiceQueryResult>),
    /// Playback request settled
    PlaybackDone,
    /// Playback could not start or was interrupted
    PlaybackFailed(String),
}

/// Commands for the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Permanently disable the trigger control
    DisableTrigger,
    /// Replace the status label
    SetStatus(String),
    /// Show or hide the recording indicator on the trigger
    SetRecordingIndicator(bool),
    /// Ask for microphone access
    AcquireMicrophone,
    /// Start the recorder with a fixed encoding
    StartRecorder {
        /// Container and codec to record with
        mime_type: &'static str,
    },
    /// Ask the recorder to flush and finalize
    StopRecorder,
    /// Release the microphone stream
    ReleaseMicrophone,
    /// Send a finalized recording
    Upload(AudioUpload),
    /// Reveal the question panel with this text
    RevealQuestion(String),
    /// Reveal the answer panel with this text
    RevealAnswer(String),
    /// Play the audio at this URL
    PlayAudio(String),
}

/// How the most recent attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Server answered the question
    Answered,
    /// Attempt failed with this status message
    Failed(String),
}

/// Drives one widget through idle and recording
#[derive(Debug)]
pub struct RecordingController {
    enabled: bool,
    playback: bool,
    state: RecorderState,
    acquiring: bool,
    active: Option<RecordingSession>,
    finalizing: Option<RecordingSession>,
    next_session: u64,
    uploads_in_flight: usize,
    playbacks_pending: usize,
    last_outcome: Option<Outcome>,
    outbox: Vec<Effect>,
}

impl RecordingController {
    /// Create a controller for a host
    ///
    /// When `capture_supported` is false the controller queues the
    /// unsupported-environment effects and ignores every later input.
    #[must_use]
    pub fn new(capture_supported: bool) -> Self {
        let mut controller = Self {
            enabled: capture_supported,
            playback: true,
            state: RecorderState::Idle,
            acquiring: false,
            active: None,
            finalizing: None,
            next_session: 1,
            uploads_in_flight: 0,
            playbacks_pending: 0,
            last_outcome: None,
            outbox: Vec::new(),
        };

        if !capture_supported {
            tracing::warn!("audio capture unsupported, disabling recording");
            controller.emit(Effect::DisableTrigger);
            controller.emit(Effect::SetStatus(STATUS_UNSUPPORTED.to_string()));
        }

        controller
    }

    /// Enable or disable playback of answers
    #[must_use]
    pub const fn with_playback(mut self, playback: bool) -> Self {
        self.playback = playback;
        self
    }

    /// Current recorder state
    #[must_use]
    pub const fn state(&self) -> RecorderState {
        self.state
    }

    /// Whether the capability guard passed
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of sessions currently holding fragments
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        usize::from(self.active.is_some()) + usize::from(self.finalizing.is_some())
    }

    /// Nothing is acquiring, recording, uploading or playing
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !self.acquiring
            && self.active.is_none()
            && self.finalizing.is_none()
            && self.uploads_in_flight == 0
            && self.playbacks_pending == 0
    }

    /// How the most recent attempt ended
    #[must_use]
    pub const fn last_outcome(&self) -> Option<&Outcome> {
        self.last_outcome.as_ref()
    }

    /// Drain effects queued outside of [`Self::handle`]
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.outbox)
    }

    /// Apply one input and return the effects the host must perform
    pub fn handle(&mut self, input: Input) -> Vec<Effect> {
        if self.enabled {
            self.apply(input);
        } else {
            tracing::trace!(?input, "recording disabled, ignoring input");
        }
        self.take_effects()
    }

    fn apply(&mut self, input: Input) {
        match input {
            Input::Toggle => match self.state {
                RecorderState::Recording => self.stop(),
                RecorderState::Idle => self.start(),
            },
            Input::StartRequested => self.start(),
            Input::StopRequested => self.stop(),
            Input::MicrophoneReady => self.on_microphone_ready(),
            Input::MicrophoneFailed(e) => self.on_microphone_failed(&e),
            Input::RecorderFailed(e) => self.on_recorder_failed(&e),
            Input::FragmentReceived(data) => self.on_fragment(data),
            Input::Finalized => self.on_finalized(),
            Input::ResponseReceived(result) => self.on_response(result),
            Input::PlaybackDone => {
                self.playbacks_pending = self.playbacks_pending.saturating_sub(1);
            }
            Input::PlaybackFailed(message) => self.on_playback_failed(&message),
        }
    }

    fn emit(&mut self, effect: Effect) {
        self.outbox.push(effect);
    }

    fn fail(&mut self, message: &str) {
        let status = error_status(message);
        self.last_outcome = Some(Outcome::Failed(status.clone()));
        self.emit(Effect::SetStatus(status));
    }

    fn start(&mut self) {
        if self.state == RecorderState::Recording {
            tracing::debug!("already recording");
            return;
        }
        if self.acquiring {
            tracing::debug!("microphone request already pending");
            return;
        }
        if let Some(session) = &self.finalizing {
            tracing::debug!(session = %session.id(), "previous recording still finalizing");
            return;
        }

        self.acquiring = true;
        self.emit(Effect::AcquireMicrophone);
    }

    fn stop(&mut self) {
        if self.state != RecorderState::Recording {
            tracing::trace!("stop requested while idle");
            return;
        }

        self.state = RecorderState::Idle;
        self.finalizing = self.active.take();

        self.emit(Effect::StopRecorder);
        self.emit(Effect::SetRecordingIndicator(false));
        self.emit(Effect::SetStatus(STATUS_PROCESSING.to_string()));
    }

    fn on_microphone_ready(&mut self) {
        if !self.acquiring {
            tracing::warn!("microphone granted without a pending request");
            self.emit(Effect::ReleaseMicrophone);
            return;
        }
        self.acquiring = false;

        let id = SessionId::new(self.next_session);
        self.next_session += 1;
        self.active = Some(RecordingSession::new(id));
        self.state = RecorderState::Recording;

        tracing::info!(session = %id, "recording started");

        self.emit(Effect::StartRecorder {
            mime_type: AUDIO_MIME_TYPE,
        });
        self.emit(Effect::SetRecordingIndicator(true));
        self.emit(Effect::SetStatus(STATUS_RECORDING.to_string()));
    }

    fn on_microphone_failed(&mut self, error: &Error) {
        tracing::warn!(error = %error, category = ?error.category(), "microphone unavailable");
        self.acquiring = false;
        self.fail(&error.message());
    }

    fn on_recorder_failed(&mut self, error: &Error) {
        tracing::error!(error = %error, "recorder failed");

        let dropped = self.active.take().or_else(|| self.finalizing.take());
        if let Some(session) = dropped {
            tracing::debug!(session = %session.id(), "discarding recording");
        }

        if self.state == RecorderState::Recording {
            self.state = RecorderState::Idle;
            self.emit(Effect::SetRecordingIndicator(false));
        }
        self.emit(Effect::ReleaseMicrophone);
        self.fail(&error.message());
    }

    fn on_fragment(&mut self, data: Vec<u8>) {
        match self.active.as_mut().or(self.finalizing.as_mut()) {
            Some(session) => {
                tracing::trace!(session = %session.id(), bytes = data.len(), "fragment");
                session.push(data);
            }
            None => tracing::warn!(bytes = data.len(), "fragment without an open session"),
        }
    }

    fn on_finalized(&mut self) {
        let Some(session) = self.finalizing.take() else {
            tracing::warn!("finalize without a stopped recording");
            return;
        };

        tracing::info!(
            session = %session.id(),
            fragments = session.fragment_count(),
            bytes = session.byte_len(),
            "recording finalized"
        );

        self.uploads_in_flight += 1;
        self.emit(Effect::ReleaseMicrophone);
        self.emit(Effect::Upload(session.finish()));
    }

    fn on_response(&mut self, result: Result<VoiceQueryResult>) {
        self.uploads_in_flight = self.uploads_in_flight.saturating_sub(1);

        match result {
            Ok(VoiceQueryResult::Answered(Answer {
                question,
                answer,
                audio_url,
            })) => {
                self.emit(Effect::RevealQuestion(question));
                self.emit(Effect::RevealAnswer(answer));
                if self.playback {
                    self.playbacks_pending += 1;
                    self.emit(Effect::PlayAudio(audio_url));
                }
                self.last_outcome = Some(Outcome::Answered);
                self.emit(Effect::SetStatus(STATUS_READY.to_string()));
            }
            Ok(VoiceQueryResult::Rejected { error }) => {
                tracing::warn!(error = %error, "server rejected recording");
                self.fail(&error);
            }
            Err(e) => {
                tracing::error!(error = %e, category = ?e.category(), "voice query failed");
                self.fail(&e.message());
            }
        }
    }

    // The question was still answered, so the outcome stays as it was
    fn on_playback_failed(&mut self, message: &str) {
        tracing::warn!(error = %message, "playback failed");
        self.playbacks_pending = self.playbacks_pending.saturating_sub(1);
        self.emit(Effect::SetStatus(error_status(message)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_controller() -> RecordingController {
        let mut controller = RecordingController::new(true);
        controller.handle(Input::Toggle);
        controller.handle(Input::MicrophoneReady);
        controller
    }

    #[test]
    fn test_new_controller_is_idle() {
        let mut controller = RecordingController::new(true);
        assert_eq!(controller.state(), RecorderState::Idle);
        assert!(controller.is_enabled());
        assert!(controller.is_settled());
        assert!(controller.take_effects().is_empty());
    }

    #[test]
    fn test_toggle_requests_microphone() {
        let mut controller = RecordingController::new(true);
        let effects = controller.handle(Input::Toggle);

        assert_eq!(effects, vec![Effect::AcquireMicrophone]);
        assert_eq!(controller.state(), RecorderState::Idle);
        assert!(!controller.is_settled());
    }

    #[test]
    fn test_microphone_ready_starts_recording() {
        let mut controller = RecordingController::new(true);
        controller.handle(Input::Toggle);
        let effects = controller.handle(Input::MicrophoneReady);

        assert_eq!(
            effects,
            vec![
                Effect::StartRecorder {
                    mime_type: "audio/webm;codecs=opus"
                },
                Effect::SetRecordingIndicator(true),
                Effect::SetStatus("Recording...".to_string()),
            ]
        );
        assert_eq!(controller.state(), RecorderState::Recording);
        assert_eq!(controller.open_sessions(), 1);
    }

    #[test]
    fn test_toggle_while_recording_stops() {
        let mut controller = recording_controller();
        let effects = controller.handle(Input::Toggle);

        assert_eq!(
            effects,
            vec![
                Effect::StopRecorder,
                Effect::SetRecordingIndicator(false),
                Effect::SetStatus("Processing...".to_string()),
            ]
        );
        assert_eq!(controller.state(), RecorderState::Idle);
        assert_eq!(controller.open_sessions(), 1);
    }

    #[test]
    fn test_finalize_uploads_fragments_in_order() {
        let mut controller = recording_controller();
        controller.handle(Input::FragmentReceived(vec![1, 2]));
        controller.handle(Input::StopRequested);
        controller.handle(Input::FragmentReceived(vec![3]));
        let effects = controller.handle(Input::Finalized);

        assert_eq!(effects.len(), 2);
        assert_eq!(effects[0], Effect::ReleaseMicrophone);
        match &effects[1] {
            Effect::Upload(upload) => {
                assert_eq!(upload.audio, vec![1, 2, 3]);
                assert_eq!(upload.session, SessionId::new(1));
            }
            other => panic!("expected upload, got {other:?}"),
        }
        assert_eq!(controller.open_sessions(), 0);
    }

    #[test]
    fn test_duplicate_start_while_acquiring_is_ignored() {
        let mut controller = RecordingController::new(true);
        controller.handle(Input::StartRequested);
        assert!(controller.handle(Input::StartRequested).is_empty());
    }

    #[test]
    fn test_stale_microphone_grant_is_released() {
        let mut controller = RecordingController::new(true);
        let effects = controller.handle(Input::MicrophoneReady);

        assert_eq!(effects, vec![Effect::ReleaseMicrophone]);
        assert_eq!(controller.state(), RecorderState::Idle);
    }

    #[test]
    fn test_fragment_without_session_is_dropped() {
        let mut controller = RecordingController::new(true);
        assert!(controller.handle(Input::FragmentReceived(vec![9])).is_empty());
        assert_eq!(controller.open_sessions(), 0);
    }

    #[test]
    fn test_playback_disabled() {
        let mut controller = RecordingController::new(true).with_playback(false);
        let effects = controller.handle(Input::ResponseReceived(Ok(
            VoiceQueryResult::Answered(Answer {
                question: "Q".to_string(),
                answer: "A".to_string(),
                audio_url: "u".to_string(),
            }),
        )));

        assert!(!effects.iter().any(|e| matches!(e, Effect::PlayAudio(_))));
        assert!(controller.is_settled());
    }
}
