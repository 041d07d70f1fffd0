//! Event loop connecting a host to the controller

use futures::StreamExt;
use futures::channel::mpsc;

use super::controller::{Effect, Input, RecordingController};

/// Carries out controller effects in a concrete environment
///
/// Implementations must not block: long-running work (device access,
/// uploads, playback) is spawned and reports back through the [`Inbox`].
pub trait Host {
    /// Perform one effect
    fn perform(&mut self, effect: Effect, inbox: &Inbox);
}

/// Sending half of the controller's input queue
#[derive(Debug, Clone)]
pub struct Inbox {
    tx: mpsc::UnboundedSender<Input>,
}

impl Inbox {
    /// Create an inbox paired with its receiving end
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Input>) {
        let (tx, rx) = mpsc::unbounded();
        (Self { tx }, rx)
    }

    /// Queue an input for the controller
    pub fn send(&self, input: Input) {
        if let Err(e) = self.tx.unbounded_send(input) {
            tracing::debug!(input = ?e.into_inner(), "controller loop closed, dropping input");
        }
    }
}

/// Owns the controller and feeds it inputs in arrival order
pub struct Driver<H> {
    controller: RecordingController,
    host: H,
    inbox: Inbox,
    rx: mpsc::UnboundedReceiver<Input>,
}

impl<H: Host> Driver<H> {
    /// Create a driver; queued controller effects are dispatched on first run
    pub fn new(controller: RecordingController, host: H) -> Self {
        let (inbox, rx) = Inbox::channel();
        Self {
            controller,
            host,
            inbox,
            rx,
        }
    }

    /// Handle for delivering inputs
    #[must_use]
    pub fn inbox(&self) -> Inbox {
        self.inbox.clone()
    }

    /// Controller being driven
    pub const fn controller(&self) -> &RecordingController {
        &self.controller
    }

    /// Host performing effects
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Run for the lifetime of the page
    pub async fn run(mut self) {
        self.run_until(|_| false).await;
    }

    /// Process inputs until `done` holds after one of them
    pub async fn run_until<F>(&mut self, mut done: F)
    where
        F: FnMut(&RecordingController) -> bool,
    {
        self.flush();

        while let Some(input) = self.rx.next().await {
            let effects = self.controller.handle(input);
            self.dispatch(effects);

            if done(&self.controller) {
                break;
            }
        }
    }

    /// Perform effects the controller queued outside of an input
    pub fn flush(&mut self) {
        let pending = self.controller.take_effects();
        self.dispatch(pending);
    }

    fn dispatch(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            tracing::trace!(?effect, "performing effect");
            self.host.perform(effect, &self.inbox);
        }
    }
}
