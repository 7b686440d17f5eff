//! Decoded frame contents.

use bytes::Bytes;

use super::header::HeaderValue;

pub const MESSAGE_TYPE: &str = ":message-type";
pub const EVENT_TYPE: &str = ":event-type";
pub const EXCEPTION_TYPE: &str = ":exception-type";
pub const CONTENT_TYPE: &str = ":content-type";
pub const ERROR_CODE: &str = ":error-code";
pub const ERROR_MESSAGE: &str = ":error-message";

pub const MESSAGE_TYPE_EVENT: &str = "event";
pub const MESSAGE_TYPE_EXCEPTION: &str = "exception";
pub const MESSAGE_TYPE_ERROR: &str = "error";

pub const AUDIO_EVENT: &str = "AudioEvent";
pub const TRANSCRIPT_EVENT: &str = "TranscriptEvent";
pub const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: HeaderValue,
}

/// One event-stream message: ordered headers plus an opaque payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireMessage {
    pub headers: Vec<Header>,
    pub payload: Bytes,
}

impl WireMessage {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            headers: Vec::new(),
            payload: payload.into(),
        }
    }

    /// Append a header. Insertion order is the wire order.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.push(Header {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// An `AudioEvent` carrying little-endian PCM.
    pub fn audio_event(pcm: Bytes) -> Self {
        Self::new(pcm)
            .with_header(MESSAGE_TYPE, MESSAGE_TYPE_EVENT)
            .with_header(EVENT_TYPE, AUDIO_EVENT)
            .with_header(CONTENT_TYPE, OCTET_STREAM)
    }

    /// The zero-payload `AudioEvent` that tells the service the audio is over.
    pub fn end_of_stream() -> Self {
        Self::audio_event(Bytes::new())
    }

    /// Value of the named header. With duplicates, the last one wins.
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers
            .iter()
            .rev()
            .find(|header| header.name == name)
            .map(|header| &header.value)
    }

    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.header(name).and_then(HeaderValue::as_str)
    }

    pub fn message_type(&self) -> Option<&str> {
        self.header_str(MESSAGE_TYPE)
    }

    pub fn event_type(&self) -> Option<&str> {
        self.header_str(EVENT_TYPE)
    }

    pub fn exception_type(&self) -> Option<&str> {
        self.header_str(EXCEPTION_TYPE)
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.payload.is_empty() && self.event_type() == Some(AUDIO_EVENT)
    }
}
