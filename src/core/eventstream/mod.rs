//! AWS event-stream binary framing.
//!
//! Audio goes up and transcripts come down the WebSocket as length-prefixed,
//! CRC-protected frames carrying typed headers and an opaque payload. This
//! module encodes and decodes those frames; it holds no state between calls.

mod codec;
mod error;
mod header;
mod message;


pub use codec::{
    CodecLimits, DEFAULT_MAX_FRAME_SIZE, EventStreamCodec, MESSAGE_CRC_LEN, MIN_FRAME_LEN,
    PRELUDE_LEN, marshal, unmarshal,
};
pub use error::CodecError;
pub use header::HeaderValue;
pub use message::*;
