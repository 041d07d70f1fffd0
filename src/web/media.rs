//! Microphone, recorder and playback through browser media APIs

use futures::StreamExt;
use futures::channel::mpsc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, BlobEvent, DomException, Event, HtmlAudioElement, MediaRecorder, MediaRecorderOptions,
    MediaStream, MediaStreamConstraints, MediaStreamTrack, Window,
};

use crate::voice::{Inbox, Input};
use crate::{Error, Result};

/// Whether `navigator.mediaDevices.getUserMedia` exists
pub fn capture_supported(window: &Window) -> bool {
    let navigator = window.navigator();

    let Ok(devices) = js_sys::Reflect::get(&navigator, &JsValue::from_str("mediaDevices")) else {
        return false;
    };
    if devices.is_undefined() || devices.is_null() {
        return false;
    }

    js_sys::Reflect::get(&devices, &JsValue::from_str("getUserMedia"))
        .is_ok_and(|f| f.is_function())
}

/// Ask for an audio-only stream
///
/// # Errors
///
/// Returns [`Error::PermissionDenied`] or [`Error::DeviceUnavailable`]
pub async fn request_microphone(window: &Window) -> Result<MediaStream> {
    let devices = window.navigator().media_devices().map_err(media_error)?;

    let constraints = MediaStreamConstraints::new();
    constraints.set_audio(&JsValue::TRUE);

    let promise = devices
        .get_user_media_with_constraints(&constraints)
        .map_err(media_error)?;
    let stream = JsFuture::from(promise).await.map_err(media_error)?;

    stream
        .dyn_into::<MediaStream>()
        .map_err(|_| Error::DeviceUnavailable("getUserMedia returned no stream".to_string()))
}

/// Stop every track so the browser drops its recording indicator
pub fn stop_tracks(stream: &MediaStream) {
    for track in stream.get_tracks().iter() {
        if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
            track.stop();
        }
    }
}

enum RecorderEvent {
    Data(Blob),
    Stopped,
}

/// A `MediaRecorder` attached to a granted stream
pub struct ActiveRecorder {
    stream: MediaStream,
    recorder: Option<MediaRecorder>,
    on_data: Option<Closure<dyn FnMut(BlobEvent)>>,
    on_stop: Option<Closure<dyn FnMut(Event)>>,
}

impl ActiveRecorder {
    /// Wrap a granted stream
    pub const fn new(stream: MediaStream) -> Self {
        Self {
            stream,
            recorder: None,
            on_data: None,
            on_stop: None,
        }
    }

    /// Start recording with `mime_type`
    ///
    /// Handlers are attached only once the recorder has started, so a failed
    /// start leaves nothing registered. Fragments and the final stop event
    /// are forwarded to `inbox` in the order the recorder emitted them.
    ///
    /// # Errors
    ///
    /// Returns error if the browser rejects the encoding or cannot start
    pub fn start(&mut self, mime_type: &str, inbox: Inbox) -> Result<()> {
        let options = MediaRecorderOptions::new();
        options.set_mime_type(mime_type);

        let recorder =
            MediaRecorder::new_with_media_stream_and_media_recorder_options(&self.stream, &options)
                .map_err(recorder_error)?;

        recorder.start().map_err(recorder_error)?;
        tracing::debug!(mime_type, "media recorder started");

        // Recorder events are dispatched as tasks, so nothing fires before
        // the handlers below are attached
        let (events_tx, events_rx) = mpsc::unbounded::<RecorderEvent>();

        let data_tx = events_tx.clone();
        let on_data = Closure::<dyn FnMut(BlobEvent)>::new(move |event: BlobEvent| {
            if let Some(blob) = event.data()
                && data_tx.unbounded_send(RecorderEvent::Data(blob)).is_err()
            {
                tracing::debug!("recorder pump closed, dropping fragment");
            }
        });
        let on_stop = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            if events_tx.unbounded_send(RecorderEvent::Stopped).is_err() {
                tracing::debug!("recorder pump closed, dropping stop");
            }
        });

        recorder.set_ondataavailable(Some(on_data.as_ref().unchecked_ref()));
        recorder.set_onstop(Some(on_stop.as_ref().unchecked_ref()));

        wasm_bindgen_futures::spawn_local(pump(events_rx, inbox));

        self.recorder = Some(recorder);
        self.on_data = Some(on_data);
        self.on_stop = Some(on_stop);
        Ok(())
    }

    /// Ask the recorder to flush its last fragment and stop
    pub fn stop(&self) {
        if let Some(recorder) = &self.recorder
            && let Err(e) = recorder.stop()
        {
            tracing::warn!(error = %describe(&e).1, "media recorder stop failed");
        }
    }

    /// Detach handlers and release the microphone
    pub fn release(mut self) {
        if let Some(recorder) = self.recorder.take() {
            recorder.set_ondataavailable(None);
            recorder.set_onstop(None);
        }
        stop_tracks(&self.stream);
        tracing::debug!("microphone released");
    }
}

/// Convert recorder events to controller inputs, one at a time
async fn pump(mut events: mpsc::UnboundedReceiver<RecorderEvent>, inbox: Inbox) {
    while let Some(event) = events.next().await {
        match event {
            RecorderEvent::Data(blob) => match blob_bytes(&blob).await {
                Ok(bytes) => inbox.send(Input::FragmentReceived(bytes)),
                Err(e) => {
                    tracing::error!(error = %e, "failed to read recorded fragment");
                    inbox.send(Input::RecorderFailed(e));
                    return;
                }
            },
            RecorderEvent::Stopped => {
                inbox.send(Input::Finalized);
                return;
            }
        }
    }
}

async fn blob_bytes(blob: &Blob) -> Result<Vec<u8>> {
    let buffer = JsFuture::from(blob.array_buffer())
        .await
        .map_err(recorder_error)?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// Play the audio at `url`
///
/// Resolves once playback has started.
///
/// # Errors
///
/// Returns [`Error::Playback`] if the browser refuses to play
pub async fn play(url: &str) -> Result<()> {
    let playback_error = |e: JsValue| Error::Playback(describe(&e).1);

    let audio = HtmlAudioElement::new_with_src(url).map_err(playback_error)?;
    let promise = audio.play().map_err(playback_error)?;
    JsFuture::from(promise).await.map_err(playback_error)?;

    tracing::debug!(url, "playback started");
    Ok(())
}

/// Map a `getUserMedia` rejection onto the error taxonomy
pub fn media_error(value: JsValue) -> Error {
    let (name, message) = describe(&value);
    match name.as_deref() {
        Some("NotAllowedError" | "SecurityError") => Error::PermissionDenied(message),
        _ => Error::DeviceUnavailable(message),
    }
}

fn recorder_error(value: JsValue) -> Error {
    Error::Recorder(describe(&value).1)
}

/// Exception name (if any) and message of a thrown JS value
fn describe(value: &JsValue) -> (Option<String>, String) {
    if let Some(e) = value.dyn_ref::<DomException>() {
        return (Some(e.name()), e.message());
    }
    if let Some(e) = value.dyn_ref::<js_sys::Error>() {
        return (Some(e.name().into()), e.message().into());
    }

    (
        None,
        value.as_string().unwrap_or_else(|| format!("{value:?}")),
    )
}
