//! Drives a [`Session`] from its event queue.

use tokio::sync::mpsc;
use tracing::debug;

use super::machine::Session;
use super::observer::SessionObserver;
use super::transport::{CaptureSource, EventReceiver, EventSender, SessionEvent, TransportConnector};
use crate::core::signer::Credentials;
use crate::core::transcribe::SessionConfig;

/// Owns a session and the queue its capture source and transport post to.
///
/// ```rust,ignore
/// let (observer, mut results) = ChannelObserver::new();
/// let runner = SessionRunner::new(config, credentials, connector, capture, observer);
/// let handle = runner.handle();
/// tokio::spawn(async move {
///     tokio::signal::ctrl_c().await.ok();
///     handle.stop();
/// });
/// let session = runner.run().await;
/// ```
pub struct SessionRunner {
    session: Session,
    events: EventReceiver,
    sender: EventSender,
}

impl SessionRunner {
    pub fn new(
        config: SessionConfig,
        credentials: Credentials,
        connector: impl TransportConnector + 'static,
        capture: impl CaptureSource + 'static,
        observer: impl SessionObserver + 'static,
    ) -> Self {
        let (sender, events) = mpsc::unbounded_channel();
        let session = Session::new(
            config,
            credentials,
            Box::new(connector),
            Box::new(capture),
            Box::new(observer),
            sender.clone(),
        );
        Self {
            session,
            events,
            sender,
        }
    }

    /// Sender for injecting notifications into the queue.
    pub fn event_sender(&self) -> EventSender {
        self.sender.clone()
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            sender: self.sender.clone(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Start the session and dispatch queued notifications until it reaches a
    /// terminal state. Returns the finished session for inspection.
    pub async fn run(mut self) -> Session {
        self.session.start();

        while !self.session.state().is_terminal() {
            match self.events.recv().await {
                Some(event) => self.session.handle(event),
                None => break,
            }
        }

        debug!("Session runner finished: {}", self.session.state());
        self.session
    }
}

/// Cloneable control handle for a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    sender: EventSender,
}

impl SessionHandle {
    /// Ask the session to finish. Returns false once the session is gone.
    pub fn stop(&self) -> bool {
        self.sender.send(SessionEvent::Stop).is_ok()
    }
}
