//! Seams between the session and the outside world.
//!
//! Capture sources and transports never call into the session directly. They
//! post [`SessionEvent`]s onto the session's queue and the runner dispatches
//! them one at a time.

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::errors::StreamResult;

/// A notification for the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The capture source's native sample rate. Sent before any chunk.
    CaptureFormat { sample_rate: u32 },
    /// Mono float samples at the capture rate.
    CaptureChunk(Vec<f32>),
    CaptureError(String),
    TransportOpen,
    TransportMessage(Bytes),
    TransportError(String),
    TransportClosed { code: u16, reason: String },
    /// Finish the stream: stop capture and send the end-of-audio frame.
    Stop,
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// WebSocket close code for a normal closure.
pub const CLOSE_NORMAL: u16 = 1000;

/// An open (or opening) connection to the service.
pub trait Transport: Send {
    /// Queue one binary frame. Frames go out in call order.
    fn send(&mut self, frame: Bytes) -> StreamResult<()>;

    /// Begin a normal closure. The outcome arrives as a `TransportClosed` or
    /// `TransportError` event.
    fn close(&mut self);
}

/// Opens transports to signed URLs.
pub trait TransportConnector: Send {
    /// Start connecting to `url`. Returns as soon as the attempt is under way;
    /// `TransportOpen` is posted to `events` once the socket is usable.
    fn connect(&mut self, url: &str, events: EventSender) -> StreamResult<Box<dyn Transport>>;
}

/// A source of audio, such as a microphone or a file.
pub trait CaptureSource: Send {
    /// Acquire the source and begin posting `CaptureFormat` then `CaptureChunk`
    /// events.
    fn start(&mut self, events: EventSender) -> StreamResult<()>;

    /// Stop producing chunks. Must be safe to call more than once.
    fn stop(&mut self);
}
