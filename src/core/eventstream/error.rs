//! Frame codec errors.

use thiserror::Error;

/// Failure to encode or decode an event-stream frame.
///
/// Decoding never yields a partial message: any of these errors means the frame
/// was rejected as a whole.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Truncated frame: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Prelude checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    PreludeChecksumMismatch { expected: u32, computed: u32 },

    #[error("Message checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    MessageChecksumMismatch { expected: u32, computed: u32 },

    #[error("Invalid frame length: {0}")]
    InvalidFrameLength(u32),

    #[error("Frame of {size} bytes exceeds maximum of {max} bytes")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Frame declares {declared} bytes but {actual} were supplied")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("Header block of {headers_length} bytes overruns frame of {total_length} bytes")]
    HeadersOverrun {
        headers_length: u32,
        total_length: u32,
    },

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Unknown header value type: {0}")]
    UnknownHeaderType(u8),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
