//! Subscriber callbacks

use tether_core::{ConnectionError, DisconnectReason, Envelope};

/// Receives fan-out from the shared connection
///
/// Every method is optional. Callbacks run synchronously on the task that
/// observed the event, so they should return quickly; a panicking callback
/// is caught and logged without affecting other subscribers.
pub trait Subscriber: Send + Sync {
    /// An inbound envelope arrived
    fn on_message(&self, _message: &Envelope) {}

    /// The connection opened, or was already open when subscribing
    fn on_connect(&self) {}

    /// The connection closed
    fn on_disconnect(&self, _reason: &DisconnectReason) {}

    /// Something went wrong; advisory only
    fn on_error(&self, _error: &ConnectionError) {}
}

type MessageFn = Box<dyn Fn(&Envelope) + Send + Sync>;
type ConnectFn = Box<dyn Fn() + Send + Sync>;
type DisconnectFn = Box<dyn Fn(&DisconnectReason) + Send + Sync>;
type ErrorFn = Box<dyn Fn(&ConnectionError) + Send + Sync>;

/// Closure-based subscriber
///
/// ```ignore
/// let subscriber = Callbacks::new()
///     .with_message(|msg| println!("{}", msg.kind))
///     .with_error(|err| eprintln!("{err}"));
/// ```
#[derive(Default)]
pub struct Callbacks {
    message: Option<MessageFn>,
    connect: Option<ConnectFn>,
    disconnect: Option<DisconnectFn>,
    error: Option<ErrorFn>,
}

impl Callbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_message(mut self, f: impl Fn(&Envelope) + Send + Sync + 'static) -> Self {
        self.message = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_connect(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.connect = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_disconnect(mut self, f: impl Fn(&DisconnectReason) + Send + Sync + 'static) -> Self {
        self.disconnect = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_error(mut self, f: impl Fn(&ConnectionError) + Send + Sync + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }
}

impl Subscriber for Callbacks {
    fn on_message(&self, message: &Envelope) {
        if let Some(f) = &self.message {
            f(message);
        }
    }

    fn on_connect(&self) {
        if let Some(f) = &self.connect {
            f();
        }
    }

    fn on_disconnect(&self, reason: &DisconnectReason) {
        if let Some(f) = &self.disconnect {
            f(reason);
        }
    }

    fn on_error(&self, error: &ConnectionError) {
        if let Some(f) = &self.error {
            f(error);
        }
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_message", &self.message.is_some())
            .field("on_connect", &self.connect.is_some())
            .field("on_disconnect", &self.disconnect.is_some())
            .field("on_error", &self.error.is_some())
            .finish()
    }
}
