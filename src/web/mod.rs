//! Browser host
//!
//! Binds the recording controller to the page: the record button toggles
//! recording, `MediaRecorder` supplies Opus/WebM fragments, answers are
//! written into the question and answer panels and played through an
//! `<audio>` element.

// wasm-bindgen glue expands to unsafe FFI shims
#![allow(unsafe_code)]

mod dom;
mod logging;
mod media;

use std::cell::RefCell;
use std::rc::Rc;

use url::Url;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, MediaStream, Window};

use crate::api::VoiceClient;
use crate::voice::{Driver, Effect, Host, Inbox, Input, RecordingController};
use crate::{Config, Error, Result};

pub use dom::{HIDDEN_CLASS, Page, Panel, RECORDING_CLASS, SHOW_CLASS};

/// Entry point, run when the module is instantiated
///
/// # Errors
///
/// Returns error if there is no window or document, or mounting fails
#[wasm_bindgen(start)]
pub fn start() -> std::result::Result<(), JsValue> {
    logging::init();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    if document.ready_state() == "loading" {
        let on_ready = Closure::once(move || {
            if let Err(e) = mount(&Config::default()) {
                tracing::error!(error = %e, "failed to mount voice widget");
            }
        });

        let options = AddEventListenerOptions::new();
        options.set_once(true);
        document.add_event_listener_with_callback_and_add_event_listener_options(
            "DOMContentLoaded",
            on_ready.as_ref().unchecked_ref(),
            &options,
        )?;
        on_ready.forget();
    } else {
        mount(&Config::default()).map_err(|e| {
            tracing::error!(error = %e, "failed to mount voice widget");
            JsValue::from_str(&e.to_string())
        })?;
    }

    Ok(())
}

/// Bind the widget to the current page
///
/// # Errors
///
/// Returns error if a page element is missing or the endpoint is invalid
pub fn mount(config: &Config) -> Result<()> {
    let window =
        web_sys::window().ok_or_else(|| Error::Unsupported("no window".to_string()))?;
    let document = window
        .document()
        .ok_or_else(|| Error::Unsupported("no document".to_string()))?;

    let page = Page::bind(&document, &config.elements)?;

    let href = window
        .location()
        .href()
        .map_err(|_| Error::Config("page location unavailable".to_string()))?;
    let endpoint = config.endpoint_url(&Url::parse(&href)?)?;

    let supported = media::capture_supported(&window);
    let controller = RecordingController::new(supported).with_playback(config.playback);

    let trigger = page.button().clone();
    tracing::info!(endpoint = %endpoint, supported, "voice widget mounted");

    let driver = Driver::new(controller, WebHost::new(window, page, VoiceClient::new(endpoint)));

    // Unsupported pages never get a click handler
    if supported {
        let inbox = driver.inbox();
        let on_click = Closure::<dyn FnMut()>::new(move || inbox.send(Input::Toggle));
        trigger.set_onclick(Some(on_click.as_ref().unchecked_ref()));
        on_click.forget();
    }

    wasm_bindgen_futures::spawn_local(driver.run());
    Ok(())
}

/// Host backed by the DOM and browser media APIs
struct WebHost {
    window: Window,
    page: Page,
    client: VoiceClient,
    granted: Rc<RefCell<Option<MediaStream>>>,
    recorder: Option<media::ActiveRecorder>,
}

impl WebHost {
    fn new(window: Window, page: Page, client: VoiceClient) -> Self {
        Self {
            window,
            page,
            client,
            granted: Rc::new(RefCell::new(None)),
            recorder: None,
        }
    }

    fn acquire(&self, inbox: &Inbox) {
        let window = self.window.clone();
        let granted = Rc::clone(&self.granted);
        let inbox = inbox.clone();

        wasm_bindgen_futures::spawn_local(async move {
            match media::request_microphone(&window).await {
                Ok(stream) => {
                    if let Some(stale) = granted.borrow_mut().replace(stream) {
                        media::stop_tracks(&stale);
                    }
                    inbox.send(Input::MicrophoneReady);
                }
                Err(e) => inbox.send(Input::MicrophoneFailed(e)),
            }
        });
    }

    fn start_recorder(&mut self, mime_type: &str, inbox: &Inbox) {
        let Some(stream) = self.granted.borrow_mut().take() else {
            inbox.send(Input::RecorderFailed(Error::Recorder(
                "no microphone stream".to_string(),
            )));
            return;
        };

        let mut recorder = media::ActiveRecorder::new(stream);
        match recorder.start(mime_type, inbox.clone()) {
            Ok(()) => self.recorder = Some(recorder),
            Err(e) => {
                recorder.release();
                inbox.send(Input::RecorderFailed(e));
            }
        }
    }

    fn release(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            recorder.release();
        }
        if let Some(stream) = self.granted.borrow_mut().take() {
            media::stop_tracks(&stream);
        }
    }
}

impl Host for WebHost {
    fn perform(&mut self, effect: Effect, inbox: &Inbox) {
        match effect {
            Effect::DisableTrigger => self.page.disable_trigger(),
            Effect::SetStatus(text) => self.page.set_status(&text),
            Effect::SetRecordingIndicator(on) => self.page.set_recording(on),
            Effect::AcquireMicrophone => self.acquire(inbox),
            Effect::StartRecorder { mime_type } => self.start_recorder(mime_type, inbox),
            Effect::StopRecorder => match &self.recorder {
                Some(recorder) => recorder.stop(),
                None => tracing::warn!("stop requested without a recorder"),
            },
            Effect::ReleaseMicrophone => self.release(),
            Effect::Upload(upload) => {
                let client = self.client.clone();
                let inbox = inbox.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    inbox.send(Input::ResponseReceived(client.submit(upload).await));
                });
            }
            Effect::RevealQuestion(text) => self.page.question().reveal(&text),
            Effect::RevealAnswer(text) => self.page.answer().reveal(&text),
            Effect::PlayAudio(url) => {
                let inbox = inbox.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match media::play(&url).await {
                        Ok(()) => inbox.send(Input::PlaybackDone),
                        Err(e) => inbox.send(Input::PlaybackFailed(e.message())),
                    }
                });
            }
        }
    }
}
