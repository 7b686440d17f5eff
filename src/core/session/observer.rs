//! Caller-facing notifications.

use tokio::sync::mpsc;

/// Receives results and lifecycle notifications from a session.
///
/// Calls are made from the session's dispatch loop, one at a time. A failed
/// session calls `on_error` once and then `on_closed(false)` once.
pub trait SessionObserver: Send {
    fn on_result(&mut self, text: &str, is_partial: bool);

    fn on_error(&mut self, message: &str);

    /// `normal` is true only for a clean close after the end of audio.
    fn on_closed(&mut self, normal: bool);
}

/// Observer notifications as values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEvent {
    Result { text: String, is_partial: bool },
    Error(String),
    Closed { normal: bool },
}

/// Forwards every notification into a channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ObserverEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ObserverEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: ObserverEvent) {
        // The receiver going away just means nobody is listening any more.
        let _ = self.tx.send(event);
    }
}

impl SessionObserver for ChannelObserver {
    fn on_result(&mut self, text: &str, is_partial: bool) {
        self.forward(ObserverEvent::Result {
            text: text.to_string(),
            is_partial,
        });
    }

    fn on_error(&mut self, message: &str) {
        self.forward(ObserverEvent::Error(message.to_string()));
    }

    fn on_closed(&mut self, normal: bool) {
        self.forward(ObserverEvent::Closed { normal });
    }
}
