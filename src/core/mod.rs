pub mod audio;
pub mod eventstream;
pub mod session;
pub mod signer;
pub mod transcribe;

// Re-export commonly used types for convenience
pub use audio::{AudioError, AudioPipeline, pcm_encode, resample};

pub use eventstream::{CodecError, CodecLimits, EventStreamCodec, HeaderValue, WireMessage};

pub use session::{
    CaptureSource, ChannelObserver, ObserverEvent, Session, SessionEvent, SessionHandle,
    SessionObserver, SessionRunner, SessionState, Transport, TransportConnector,
};

pub use signer::{Credentials, SignableRequest, SignerError, presign_url};

pub use transcribe::{AwsRegion, SessionConfig, TranscriptEvent, TranscriptResult};
