//! Amazon Transcribe Streaming: endpoint configuration and response bodies.

mod config;
mod messages;

pub use config::{
    AwsRegion, DEFAULT_EXPIRES_SECONDS, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE, SERVICE_NAME,
    STREAM_PATH, STREAM_PORT, SessionConfig, default_sample_rate_for_language,
};
pub use messages::{
    Alternative, ExceptionMessage, Transcript, TranscriptEvent, TranscriptResult,
    TranscriptSegment,
};
