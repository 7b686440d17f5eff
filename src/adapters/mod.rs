//! Concrete transport and capture implementations.

pub mod wav;
pub mod websocket;

pub use wav::{WavFileCapture, load_wav_mono};
pub use websocket::{WebSocketConnector, WebSocketTransport};
