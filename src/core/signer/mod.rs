//! Presigned-URL request signing (AWS Signature Version 4, query variant).
//!
//! The streaming endpoint authorizes the WebSocket upgrade entirely through URL
//! query parameters. This module builds that URL:
//!
//! ```rust
//! use transcribe_stream::core::signer::{Credentials, SignableRequest, presign_url};
//! use time::OffsetDateTime;
//!
//! let request = SignableRequest::get(
//!     "wss",
//!     "transcribestreaming.us-east-1.amazonaws.com:8443",
//!     "/stream-transcription-websocket",
//!     "transcribe",
//!     "us-east-1",
//! )
//! .with_query_param("language-code", "en-US")
//! .with_query_param("media-encoding", "pcm")
//! .with_query_param("sample-rate", "16000")
//! .with_expires(15);
//!
//! let credentials = Credentials::new("AKIDEXAMPLE", "secret", None);
//! let url = presign_url(&request, &credentials, OffsetDateTime::UNIX_EPOCH).unwrap();
//! assert!(url.contains("X-Amz-Signature="));
//! ```
//!
//! Signing is a pure function of its inputs; the clock reading is passed in.

mod credentials;
mod presign;


use thiserror::Error;

pub use credentials::Credentials;
pub use presign::{
    ALGORITHM, EMPTY_PAYLOAD_SHA256, MAX_EXPIRES_SECONDS, MIN_EXPIRES_SECONDS, SignableRequest,
    amz_date, canonical_path, canonical_request, derive_signing_key, presign_url, redact_query,
    uri_encode,
};

/// Errors raised while presigning a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    /// Access key ID or secret access key is empty.
    #[error("AWS access key ID and secret access key are required")]
    MissingCredentials,

    /// Expiry is outside the scheme's 1..=604800 second window.
    #[error("Expiry of {0} seconds is outside the allowed range of 1-604800 seconds")]
    InvalidExpiry(u32),

    /// The signing time cannot be written as an ISO 8601 basic timestamp.
    #[error("Invalid signing time: {0}")]
    InvalidTimestamp(String),

    /// The HMAC implementation rejected a key.
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
}
