//! WebSocket transport built on tokio-tungstenite.

use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message};
use tracing::{debug, error, info, warn};

use crate::core::session::{EventSender, SessionEvent, Transport, TransportConnector};
use crate::core::signer::redact_query;
use crate::errors::{StreamError, StreamResult};

/// Deadline for the opening handshake, and for the server's answer once we
/// have sent a close frame. Presigned URLs are short-lived, so a slow
/// handshake would fail anyway.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Close code reported when the stream ends without a close frame.
const CLOSE_ABNORMAL: u16 = 1006;

/// Close code reported for a close frame without a status.
const CLOSE_NO_STATUS: u16 = 1005;

enum Outbound {
    Frame(Bytes),
    Close,
}

/// Opens a WebSocket per session on a background task.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    connect_timeout: Duration,
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSocketConnector {
    pub fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

impl TransportConnector for WebSocketConnector {
    fn connect(&mut self, url: &str, events: EventSender) -> StreamResult<Box<dyn Transport>> {
        let url = url::Url::parse(url)
            .map_err(|e| StreamError::Config(format!("Invalid endpoint URL: {e}")))?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_connection(url, rx, events, self.connect_timeout));

        Ok(Box::new(WebSocketTransport { tx }))
    }
}

/// Handle to a connection task.
pub struct WebSocketTransport {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl Transport for WebSocketTransport {
    fn send(&mut self, frame: Bytes) -> StreamResult<()> {
        self.tx
            .send(Outbound::Frame(frame))
            .map_err(|_| StreamError::Transport("WebSocket connection task has ended".to_string()))
    }

    fn close(&mut self) {
        let _ = self.tx.send(Outbound::Close);
    }
}

async fn run_connection(
    url: url::Url,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: EventSender,
    connect_timeout: Duration,
) {
    let endpoint = redact_query(url.as_str()).to_string();

    let ws_stream = match timeout(connect_timeout, connect_async(url.as_str())).await {
        Ok(Ok((ws_stream, _response))) => ws_stream,
        Ok(Err(e)) => {
            let message = format!("Failed to connect to {endpoint}: {e}");
            error!("{}", message);
            let _ = events.send(SessionEvent::TransportError(message));
            return;
        }
        Err(_elapsed) => {
            let message = format!(
                "Timed out after {:?} connecting to {endpoint}",
                connect_timeout
            );
            error!("{}", message);
            let _ = events.send(SessionEvent::TransportError(message));
            return;
        }
    };

    info!("WebSocket connected to {}", endpoint);
    let _ = events.send(SessionEvent::TransportOpen);

    let (mut ws_sink, mut ws_stream) = ws_stream.split();
    let mut outbound_open = true;
    // Armed when our close frame goes out.
    let close_deadline = sleep(connect_timeout);
    tokio::pin!(close_deadline);

    loop {
        tokio::select! {
            command = outbound.recv(), if outbound_open => {
                match command {
                    Some(Outbound::Frame(frame)) => {
                        let len = frame.len();
                        if let Err(e) = ws_sink.send(Message::Binary(frame)).await {
                            let message = format!("Failed to send frame: {e}");
                            error!("{}", message);
                            let _ = events.send(SessionEvent::TransportError(message));
                            break;
                        }
                        debug!("Sent {} byte frame", len);
                    }
                    // Dropping the transport counts as a close request.
                    Some(Outbound::Close) | None => {
                        outbound_open = false;
                        let close = Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: String::new().into(),
                        }));
                        if let Err(e) = ws_sink.send(close).await {
                            debug!("Close frame not sent: {}", e);
                            break;
                        }
                        close_deadline.as_mut().reset(Instant::now() + connect_timeout);
                        debug!("Close frame sent, waiting for the server");
                    }
                }
            }

            () = &mut close_deadline, if !outbound_open => {
                warn!(
                    "No close frame from {} within {:?}, dropping the connection",
                    endpoint, connect_timeout
                );
                let _ = events.send(SessionEvent::TransportClosed {
                    code: CLOSE_ABNORMAL,
                    reason: "close handshake timed out".to_string(),
                });
                break;
            }

            message = ws_stream.next() => {
                match message {
                    Some(Ok(Message::Binary(data))) => {
                        debug!("Received {} byte frame", data.len());
                        let _ = events.send(SessionEvent::TransportMessage(data));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (u16::from(f.code), f.reason.as_str().to_string()))
                            .unwrap_or((CLOSE_NO_STATUS, String::new()));
                        info!("WebSocket closed by server: {} {}", code, reason);
                        let _ = events.send(SessionEvent::TransportClosed { code, reason });
                        let _ = ws_sink.close().await;
                        break;
                    }
                    Some(Ok(Message::Text(text))) => {
                        debug!("Ignoring text message: {}", text.as_str());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        let message = format!("WebSocket error: {e}");
                        error!("{}", message);
                        let _ = events.send(SessionEvent::TransportError(message));
                        break;
                    }
                    None => {
                        info!("WebSocket stream ended without a close frame");
                        let _ = events.send(SessionEvent::TransportClosed {
                            code: CLOSE_ABNORMAL,
                            reason: "connection dropped".to_string(),
                        });
                        break;
                    }
                }
            }
        }
    }

    debug!("WebSocket connection task finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    #[tokio::test]
    async fn test_close_handshake_times_out_when_server_is_silent() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Completes the upgrade, then never reads, so our close frame is never
        // answered.
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let ws_stream = accept_async(stream).await.unwrap();
            sleep(Duration::from_secs(30)).await;
            drop(ws_stream);
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut connector =
            WebSocketConnector::new().with_connect_timeout(Duration::from_millis(200));
        let mut transport = connector.connect(&format!("ws://{addr}/"), tx).unwrap();

        let opened = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert!(matches!(opened, Some(SessionEvent::TransportOpen)));

        transport.close();

        let closed = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("close wait was not bounded");
        match closed {
            Some(SessionEvent::TransportClosed { code, reason }) => {
                assert_eq!(code, CLOSE_ABNORMAL);
                assert_eq!(reason, "close handshake timed out");
            }
            other => panic!("expected TransportClosed, got {other:?}"),
        }

        server.abort();
    }

    #[tokio::test]
    async fn test_invalid_url_is_a_config_error() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = WebSocketConnector::new().connect("not a url", tx);
        assert!(matches!(result, Err(StreamError::Config(_))));
    }
}
