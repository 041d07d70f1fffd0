//! Voice capture module
//!
//! Holds the host-independent recording state machine and the loop that
//! drives it. Audio output lives here too on native targets; in the
//! browser the page's `<audio>` element plays answers instead.

mod controller;
mod driver;
#[cfg(not(target_arch = "wasm32"))]
mod playback;
mod session;

pub use controller::{
    Effect, Input, Outcome, RecorderState, RecordingController, STATUS_PROCESSING, STATUS_READY,
    STATUS_RECORDING, STATUS_UNSUPPORTED, error_status,
};
pub use driver::{Driver, Host, Inbox};
#[cfg(not(target_arch = "wasm32"))]
pub use playback::{AudioPlayback, DecodedAudio, decode_mp3};
pub use session::{RecordingSession, SessionId};
