use thiserror::Error;

use crate::core::audio::AudioError;
use crate::core::eventstream::CodecError;
use crate::core::signer::SignerError;

// =============================================================================
// Error Types
// =============================================================================

/// Everything that can end a streaming session.
///
/// The session reports each of these exactly once, through its observer, as
/// the `Display` text.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Missing credentials or an unusable setting.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Frame error: {0}")]
    Codec(#[from] CodecError),

    /// Socket failure or abnormal closure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Message carried by an `exception` frame, verbatim.
    #[error("{0}")]
    ProtocolException(String),

    /// The audio source failed or could not be acquired.
    #[error("Capture error: {0}")]
    Capture(String),

    /// A well-framed message whose body could not be understood.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),
}

impl From<SignerError> for StreamError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::MissingCredentials => StreamError::Config(err.to_string()),
            other => StreamError::Signing(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::InvalidPayload(err.to_string())
    }
}

/// Result type alias for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_is_config_error() {
        let err: StreamError = SignerError::MissingCredentials.into();
        assert!(matches!(err, StreamError::Config(_)));

        let err: StreamError = SignerError::InvalidExpiry(0).into();
        assert!(matches!(err, StreamError::Signing(_)));
    }

    #[test]
    fn test_protocol_exception_display_is_verbatim() {
        let err = StreamError::ProtocolException("Invalid sample rate".to_string());
        assert_eq!(err.to_string(), "Invalid sample rate");
    }
}
