//! Mock Amazon Transcribe Streaming server
//!
//! Accepts one presigned WebSocket upgrade, decodes inbound event-stream
//! frames and answers with transcript or exception frames.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use transcribe_stream::core::eventstream::{
    CONTENT_TYPE, EVENT_TYPE, EXCEPTION_TYPE, EventStreamCodec, MESSAGE_TYPE, MESSAGE_TYPE_EVENT,
    MESSAGE_TYPE_EXCEPTION, TRANSCRIPT_EVENT, WireMessage,
};

/// How the mock responds to a stream.
#[derive(Debug, Clone)]
pub enum Scenario {
    /// A partial after the first audio frame, a final after end-of-stream,
    /// then a normal close.
    Transcribe { partial: String, final_text: String },
    /// An exception frame after the first audio frame.
    Exception {
        exception_type: String,
        message: String,
    },
}

/// What the mock saw.
#[derive(Debug)]
pub struct MockTranscribeState {
    pub scenario: Scenario,
    pub audio_frames: AtomicU64,
    pub audio_bytes: AtomicU64,
    pub end_of_stream_frames: AtomicU64,
    pub request_uri: Mutex<Option<String>>,
}

impl MockTranscribeState {
    pub fn new(scenario: Scenario) -> Arc<Self> {
        Arc::new(Self {
            scenario,
            audio_frames: AtomicU64::new(0),
            audio_bytes: AtomicU64::new(0),
            end_of_stream_frames: AtomicU64::new(0),
            request_uri: Mutex::new(None),
        })
    }

    pub fn audio_frames(&self) -> u64 {
        self.audio_frames.load(Ordering::SeqCst)
    }

    pub fn audio_bytes(&self) -> u64 {
        self.audio_bytes.load(Ordering::SeqCst)
    }

    pub fn end_of_stream_frames(&self) -> u64 {
        self.end_of_stream_frames.load(Ordering::SeqCst)
    }

    pub fn request_uri(&self) -> Option<String> {
        self.request_uri.lock().unwrap().clone()
    }
}

pub fn transcript_frame(text: &str, is_partial: bool) -> Vec<u8> {
    let body = json!({
        "Transcript": {
            "Results": [{
                "ResultId": "mock-result",
                "StartTime": 0.0,
                "EndTime": 1.0,
                "IsPartial": is_partial,
                "Alternatives": [{ "Transcript": text, "Items": [] }]
            }]
        }
    });
    let message = WireMessage::new(body.to_string().into_bytes())
        .with_header(MESSAGE_TYPE, MESSAGE_TYPE_EVENT)
        .with_header(EVENT_TYPE, TRANSCRIPT_EVENT)
        .with_header(CONTENT_TYPE, "application/json");
    EventStreamCodec::default()
        .marshal(&message)
        .unwrap()
        .to_vec()
}

pub fn exception_frame(exception_type: &str, text: &str) -> Vec<u8> {
    let body = json!({ "Message": text });
    let message = WireMessage::new(body.to_string().into_bytes())
        .with_header(MESSAGE_TYPE, MESSAGE_TYPE_EXCEPTION)
        .with_header(EXCEPTION_TYPE, exception_type)
        .with_header(CONTENT_TYPE, "application/json");
    EventStreamCodec::default()
        .marshal(&message)
        .unwrap()
        .to_vec()
}

async fn handle_connection(
    stream: TcpStream,
    state: Arc<MockTranscribeState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let uri_state = state.clone();
    let ws_stream = accept_hdr_async(stream, move |request: &Request, response: Response| {
        *uri_state.request_uri.lock().unwrap() = Some(request.uri().to_string());
        Ok::<Response, ErrorResponse>(response)
    })
    .await?;
    let (mut write, mut read) = ws_stream.split();
    let codec = EventStreamCodec::default();

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Binary(data)) => {
                let message = codec.unmarshal(&data)?;

                if message.is_end_of_stream() {
                    state.end_of_stream_frames.fetch_add(1, Ordering::SeqCst);
                    if let Scenario::Transcribe { final_text, .. } = &state.scenario {
                        write
                            .send(Message::Binary(transcript_frame(final_text, false).into()))
                            .await?;
                        write
                            .send(Message::Close(Some(CloseFrame {
                                code: CloseCode::Normal,
                                reason: "done".into(),
                            })))
                            .await?;
                    }
                    continue;
                }

                let count = state.audio_frames.fetch_add(1, Ordering::SeqCst) + 1;
                state
                    .audio_bytes
                    .fetch_add(message.payload.len() as u64, Ordering::SeqCst);

                if count == 1 {
                    let reply = match &state.scenario {
                        Scenario::Transcribe { partial, .. } => transcript_frame(partial, true),
                        Scenario::Exception {
                            exception_type,
                            message,
                        } => exception_frame(exception_type, message),
                    };
                    write.send(Message::Binary(reply.into())).await?;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(data)) => {
                write.send(Message::Pong(data)).await?;
            }
            Err(_) => break,
            _ => {}
        }
    }

    Ok(())
}

/// Start the mock on an ephemeral port and serve a single connection.
pub async fn start_mock_transcribe(
    state: Arc<MockTranscribeState>,
) -> Result<SocketAddr, Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await
            && let Err(e) = handle_connection(stream, state).await
        {
            eprintln!("Mock Transcribe connection error: {}", e);
        }
    });

    Ok(addr)
}
