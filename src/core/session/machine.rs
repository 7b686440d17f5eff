//! The streaming session state machine.

use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use super::observer::SessionObserver;
use super::state::SessionState;
use super::transport::{
    CLOSE_NORMAL, CaptureSource, EventSender, SessionEvent, Transport, TransportConnector,
};
use crate::core::audio::AudioPipeline;
use crate::core::eventstream::{
    ERROR_CODE, ERROR_MESSAGE, EventStreamCodec, MESSAGE_TYPE_ERROR, MESSAGE_TYPE_EVENT,
    MESSAGE_TYPE_EXCEPTION, TRANSCRIPT_EVENT, WireMessage,
};
use crate::core::signer::{Credentials, presign_url, redact_query};
use crate::core::transcribe::{ExceptionMessage, SessionConfig, TranscriptEvent};
use crate::errors::{StreamError, StreamResult};

/// One streaming transcription, from capture start to close.
///
/// A session is driven entirely through its dispatch methods, each of which
/// runs to completion before the next is called. [`SessionRunner`] does this
/// from a queue; tests call the methods directly.
///
/// [`SessionRunner`]: super::SessionRunner
pub struct Session {
    config: SessionConfig,
    credentials: Credentials,
    codec: EventStreamCodec,
    state: SessionState,

    events: EventSender,
    connector: Box<dyn TransportConnector>,
    capture: Box<dyn CaptureSource>,
    capture_active: bool,
    transport: Option<Box<dyn Transport>>,
    observer: Box<dyn SessionObserver>,

    pipeline: Option<AudioPipeline>,
    transcription: Vec<String>,
    latest_partial: Option<String>,
    audio_frames_sent: u64,
}

impl Session {
    pub fn new(
        config: SessionConfig,
        credentials: Credentials,
        connector: Box<dyn TransportConnector>,
        capture: Box<dyn CaptureSource>,
        observer: Box<dyn SessionObserver>,
        events: EventSender,
    ) -> Self {
        let codec = EventStreamCodec::new(config.codec_limits());
        Self {
            config,
            credentials,
            codec,
            state: SessionState::Idle,
            events,
            connector,
            capture,
            capture_active: false,
            transport: None,
            observer,
            pipeline: None,
            transcription: Vec::new(),
            latest_partial: None,
            audio_frames_sent: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Finalized texts in arrival order. Kept after a failure.
    pub fn transcription(&self) -> &[String] {
        &self.transcription
    }

    pub fn latest_partial(&self) -> Option<&str> {
        self.latest_partial.as_deref()
    }

    /// Finalized lines followed by the current partial hypothesis.
    pub fn live_text(&self) -> String {
        let mut text: String = self
            .transcription
            .iter()
            .map(|line| format!("{line}\n"))
            .collect();
        if let Some(partial) = &self.latest_partial {
            text.push_str(partial);
        }
        text
    }

    /// Audio frames sent so far, the end-of-audio frame included.
    pub fn audio_frames_sent(&self) -> u64 {
        self.audio_frames_sent
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Route a queued notification to its handler.
    pub fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::CaptureFormat { sample_rate } => self.on_capture_format(sample_rate),
            SessionEvent::CaptureChunk(samples) => self.on_capture_chunk(&samples),
            SessionEvent::CaptureError(message) => self.on_capture_error(message),
            SessionEvent::TransportOpen => self.on_transport_open(),
            SessionEvent::TransportMessage(frame) => self.on_transport_message(&frame),
            SessionEvent::TransportError(message) => self.on_transport_error(message),
            SessionEvent::TransportClosed { code, reason } => {
                self.on_transport_closed(code, &reason)
            }
            SessionEvent::Stop => self.stop(),
        }
    }

    /// Start streaming, signing the URL with the current time.
    pub fn start(&mut self) {
        self.start_at(OffsetDateTime::now_utc());
    }

    /// Start streaming, signing the URL as of `now`.
    ///
    /// Configuration, signing and capture are settled while still `Idle`, so a
    /// failure there never reaches `Connecting`.
    pub fn start_at(&mut self, now: OffsetDateTime) {
        if self.state != SessionState::Idle {
            warn!("Ignoring start: session is {}", self.state);
            return;
        }

        let url = match self.prepare(now) {
            Ok(url) => url,
            Err(e) => return self.fail(e),
        };

        self.state = SessionState::Connecting;
        info!(
            "Connecting to Amazon Transcribe at {} (language: {}, sample rate: {} Hz)",
            redact_query(&url),
            self.config.language_code,
            self.config.sample_rate
        );
        match self.connector.connect(&url, self.events.clone()) {
            Ok(transport) => self.transport = Some(transport),
            Err(e) => self.fail(e),
        }
    }

    /// Validate, sign and acquire the capture source. Returns the signed URL.
    fn prepare(&mut self, now: OffsetDateTime) -> StreamResult<String> {
        self.config.validate().map_err(StreamError::Config)?;

        let url = presign_url(&self.config.signable_request(), &self.credentials, now)?;

        self.capture
            .start(self.events.clone())
            .map_err(|e| match e {
                StreamError::Capture(_) => e,
                other => StreamError::Capture(other.to_string()),
            })?;
        self.capture_active = true;

        Ok(url)
    }

    /// Finish the stream.
    ///
    /// While streaming this stops capture and sends exactly one empty
    /// `AudioEvent`; the service then flushes its last results and closes.
    /// While connecting it abandons the connection.
    pub fn stop(&mut self) {
        match self.state {
            SessionState::Streaming => {
                self.stop_capture();
                info!("Audio finished, sending end-of-stream frame");
                if let Err(e) = self.send_message(&WireMessage::end_of_stream()) {
                    self.fail(e);
                    return;
                }
                self.state = SessionState::Closing;
            }
            SessionState::Connecting => {
                self.stop_capture();
                if let Some(transport) = self.transport.as_mut() {
                    transport.close();
                }
                self.state = SessionState::Closing;
            }
            state => debug!("Ignoring stop: session is {}", state),
        }
    }

    pub fn on_capture_format(&mut self, sample_rate: u32) {
        if self.state.is_terminal() {
            return;
        }

        match AudioPipeline::new(sample_rate, self.config.sample_rate) {
            Ok(pipeline) => {
                debug!(
                    "Capture format: {} Hz -> {} Hz",
                    sample_rate, self.config.sample_rate
                );
                self.pipeline = Some(pipeline);
            }
            Err(e) => self.fail(e.into()),
        }
    }

    pub fn on_capture_chunk(&mut self, samples: &[f32]) {
        if self.state != SessionState::Streaming {
            return;
        }

        let Some(pipeline) = self.pipeline else {
            warn!("Dropping {} samples received before the capture format", samples.len());
            return;
        };

        let pcm = match pipeline.process(samples) {
            Ok(pcm) => pcm,
            Err(e) => return self.fail(e.into()),
        };
        if pcm.is_empty() {
            // An empty AudioEvent would end the stream.
            return;
        }

        if let Err(e) = self.send_message(&WireMessage::audio_event(pcm)) {
            self.fail(e);
        }
    }

    pub fn on_capture_error(&mut self, message: String) {
        match self.state {
            SessionState::Idle | SessionState::Connecting | SessionState::Streaming => {
                self.fail(StreamError::Capture(message))
            }
            state => debug!("Ignoring capture error while {}: {}", state, message),
        }
    }

    pub fn on_transport_open(&mut self) {
        if self.state == SessionState::Connecting {
            info!("Connected to Amazon Transcribe");
            self.state = SessionState::Streaming;
        } else {
            debug!("Ignoring transport open while {}", self.state);
        }
    }

    pub fn on_transport_message(&mut self, frame: &[u8]) {
        if !matches!(
            self.state,
            SessionState::Streaming | SessionState::Closing
        ) {
            debug!("Ignoring {} byte frame while {}", frame.len(), self.state);
            return;
        }

        if let Err(e) = self.process_frame(frame) {
            self.fail(e);
        }
    }

    pub fn on_transport_error(&mut self, message: String) {
        if self.state.is_terminal() {
            debug!("Ignoring transport error after close: {}", message);
            return;
        }
        self.fail(StreamError::Transport(message));
    }

    pub fn on_transport_closed(&mut self, code: u16, reason: &str) {
        match self.state {
            SessionState::Closed | SessionState::Failed => {
                debug!("Ignoring close ({}) after session end", code);
            }
            SessionState::Streaming | SessionState::Closing if code == CLOSE_NORMAL => {
                self.finish();
            }
            _ => {
                let detail = if reason.is_empty() {
                    format!("Connection closed with code {code}")
                } else {
                    format!("Connection closed with code {code}: {reason}")
                };
                self.fail(StreamError::Transport(detail));
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn send_message(&mut self, message: &WireMessage) -> StreamResult<()> {
        let frame = self.codec.marshal(message)?;
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| StreamError::Transport("Not connected".to_string()))?;

        debug!("Sending audio frame: {} bytes", frame.len());
        transport.send(frame)?;
        self.audio_frames_sent += 1;
        Ok(())
    }

    fn process_frame(&mut self, frame: &[u8]) -> StreamResult<()> {
        let message = self.codec.unmarshal(frame)?;

        match message.message_type() {
            Some(MESSAGE_TYPE_EVENT) => match message.event_type() {
                Some(TRANSCRIPT_EVENT) | None => {
                    let event: TranscriptEvent = serde_json::from_slice(&message.payload)?;
                    self.apply_transcript(&event);
                }
                Some(other) => debug!("Ignoring {} event", other),
            },
            Some(MESSAGE_TYPE_EXCEPTION) => {
                let text = serde_json::from_slice::<ExceptionMessage>(&message.payload)
                    .ok()
                    .and_then(|body| body.message)
                    .or_else(|| message.exception_type().map(str::to_string))
                    .unwrap_or_else(|| "Unknown exception".to_string());
                error!(
                    "Amazon Transcribe exception ({}): {}",
                    message.exception_type().unwrap_or("unknown"),
                    text
                );
                return Err(StreamError::ProtocolException(text));
            }
            Some(MESSAGE_TYPE_ERROR) => {
                let text = message
                    .header_str(ERROR_MESSAGE)
                    .or_else(|| message.header_str(ERROR_CODE))
                    .unwrap_or("Unknown error")
                    .to_string();
                error!("Amazon Transcribe error: {}", text);
                return Err(StreamError::ProtocolException(text));
            }
            other => warn!("Ignoring frame with message type {:?}", other),
        }

        Ok(())
    }

    fn apply_transcript(&mut self, event: &TranscriptEvent) {
        for result in event.results() {
            debug!(
                "Transcript ({}): {}",
                if result.is_partial { "partial" } else { "final" },
                result.text
            );
            self.observer.on_result(&result.text, result.is_partial);

            if result.is_partial {
                self.latest_partial = Some(result.text);
            } else {
                self.transcription.push(result.text);
                self.latest_partial = None;
            }
        }
    }

    fn stop_capture(&mut self) {
        if self.capture_active {
            self.capture.stop();
            self.capture_active = false;
        }
    }

    fn finish(&mut self) {
        info!(
            "Session closed normally after {} audio frames",
            self.audio_frames_sent
        );
        self.state = SessionState::Closed;
        self.stop_capture();
        self.transport = None;
        self.observer.on_closed(true);
    }

    fn fail(&mut self, err: StreamError) {
        error!("Session failed while {}: {}", self.state, err);
        self.state = SessionState::Failed;
        self.stop_capture();
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }

        self.observer.on_error(&err.to_string());
        self.observer.on_closed(false);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("transcription", &self.transcription)
            .field("latest_partial", &self.latest_partial)
            .field("audio_frames_sent", &self.audio_frames_sent)
            .finish_non_exhaustive()
    }
}
