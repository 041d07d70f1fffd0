//! Page elements the widget binds to

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlButtonElement};

use crate::config::ElementIds;
use crate::{Error, Result};

/// Class removed from a panel when it is revealed
pub const HIDDEN_CLASS: &str = "hidden";

/// Class added to a panel when it is revealed
pub const SHOW_CLASS: &str = "show";

/// Class carried by the trigger while recording
pub const RECORDING_CLASS: &str = "recording";

/// A reveal panel and the paragraph its text goes into
pub struct Panel {
    root: Element,
    text: Element,
}

impl Panel {
    fn bind(document: &Document, id: &str) -> Result<Self> {
        let root = element(document, id)?;
        let text = root
            .query_selector("p")
            .ok()
            .flatten()
            .ok_or_else(|| Error::Config(format!("#{id} has no <p> child")))?;

        Ok(Self { root, text })
    }

    /// Show the panel with `text`
    pub fn reveal(&self, text: &str) {
        let classes = self.root.class_list();
        let hidden = classes.remove_1(HIDDEN_CLASS);
        let shown = classes.add_1(SHOW_CLASS);
        if hidden.is_err() || shown.is_err() {
            tracing::warn!(panel = %self.root.id(), "failed to update panel classes");
        }
        self.text.set_text_content(Some(text));
    }
}

/// The bound page
pub struct Page {
    button: HtmlButtonElement,
    status: Element,
    question: Panel,
    answer: Panel,
}

impl Page {
    /// Look up every element of the page contract
    ///
    /// # Errors
    ///
    /// Returns error naming the first missing element
    pub fn bind(document: &Document, ids: &ElementIds) -> Result<Self> {
        let button = element(document, &ids.record_button)?
            .dyn_into::<HtmlButtonElement>()
            .map_err(|_| Error::Config(format!("#{} is not a button", ids.record_button)))?;

        Ok(Self {
            button,
            status: element(document, &ids.status)?,
            question: Panel::bind(document, &ids.question)?,
            answer: Panel::bind(document, &ids.answer)?,
        })
    }

    /// Toggle button
    pub const fn button(&self) -> &HtmlButtonElement {
        &self.button
    }

    /// Question panel
    pub const fn question(&self) -> &Panel {
        &self.question
    }

    /// Answer panel
    pub const fn answer(&self) -> &Panel {
        &self.answer
    }

    /// Replace the status label
    pub fn set_status(&self, text: &str) {
        self.status.set_text_content(Some(text));
    }

    /// Permanently disable the toggle button
    pub fn disable_trigger(&self) {
        self.button.set_disabled(true);
    }

    /// Show or hide the recording indicator
    pub fn set_recording(&self, recording: bool) {
        let classes = self.button.class_list();
        let updated = if recording {
            classes.add_1(RECORDING_CLASS)
        } else {
            classes.remove_1(RECORDING_CLASS)
        };

        if updated.is_err() {
            tracing::warn!(recording, "failed to update recording indicator");
        }
    }
}

fn element(document: &Document, id: &str) -> Result<Element> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| Error::Config(format!("missing element #{id}")))
}
