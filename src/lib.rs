//! voice-query - Voice capture widget for a question answering service
//!
//! Records a spoken question, uploads it to `/process_voice`, shows the
//! transcribed question with its answer and plays the spoken reply.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │ web (wasm32)                 │   │ desktop (native CLI)         │
//! │ DOM · MediaRecorder · <audio>│   │ WebM clip · stdout · cpal    │
//! └──────────────┬───────────────┘   └──────────────┬───────────────┘
//!                │      Host::perform(Effect)       │
//! ┌──────────────▼──────────────────────────────────▼───────────────┐
//! │ voice::Driver ─ Input ─► voice::RecordingController ─► Effect    │
//! └──────────────────────────────┬──────────────────────────────────┘
//!                                │
//! ┌──────────────────────────────▼──────────────────────────────────┐
//! │ api::VoiceClient  POST /process_voice (multipart "audio")        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
#[cfg(not(target_arch = "wasm32"))]
pub mod desktop;
pub mod error;
pub mod voice;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use api::{Answer, AudioUpload, VoiceClient, VoiceQueryResult};
pub use config::Config;
pub use error::{Error, ErrorCategory, Result};
pub use voice::{Driver, Effect, Host, Inbox, Input, RecorderState, RecordingController};
