//! Session configuration for Amazon Transcribe Streaming.
//!
//! Everything the session needs to know about where and how to stream lives in
//! a [`SessionConfig`] value handed to it at construction.
//!
//! # Example
//!
//! ```rust
//! use transcribe_stream::core::transcribe::{AwsRegion, SessionConfig};
//!
//! let config = SessionConfig::new(AwsRegion::EuWest1, "en-GB").with_sample_rate(16000);
//! assert_eq!(config.host(), "transcribestreaming.eu-west-1.amazonaws.com:8443");
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::core::eventstream::{CodecLimits, DEFAULT_MAX_FRAME_SIZE, MIN_FRAME_LEN};
use crate::core::signer::{MAX_EXPIRES_SECONDS, MIN_EXPIRES_SECONDS, SignableRequest};

/// Signing name of the streaming service.
pub const SERVICE_NAME: &str = "transcribe";

/// WebSocket path of the streaming endpoint.
pub const STREAM_PATH: &str = "/stream-transcription-websocket";

/// Port the streaming endpoint listens on.
pub const STREAM_PORT: u16 = 8443;

/// Presigned URL lifetime used when none is configured.
pub const DEFAULT_EXPIRES_SECONDS: u32 = 15;

pub const MIN_SAMPLE_RATE: u32 = 8000;
pub const MAX_SAMPLE_RATE: u32 = 48000;

// =============================================================================
// AWS Regions
// =============================================================================

/// AWS regions where Amazon Transcribe Streaming is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AwsRegion {
    /// US East (N. Virginia)
    #[default]
    #[serde(rename = "us-east-1")]
    UsEast1,
    /// US East (Ohio)
    #[serde(rename = "us-east-2")]
    UsEast2,
    /// US West (Oregon)
    #[serde(rename = "us-west-2")]
    UsWest2,
    /// Asia Pacific (Seoul)
    #[serde(rename = "ap-northeast-2")]
    ApNortheast2,
    /// Asia Pacific (Sydney)
    #[serde(rename = "ap-southeast-2")]
    ApSoutheast2,
    /// Asia Pacific (Tokyo)
    #[serde(rename = "ap-northeast-1")]
    ApNortheast1,
    /// Canada (Central)
    #[serde(rename = "ca-central-1")]
    CaCentral1,
    /// Europe (Frankfurt)
    #[serde(rename = "eu-central-1")]
    EuCentral1,
    /// Europe (Ireland)
    #[serde(rename = "eu-west-1")]
    EuWest1,
    /// Europe (London)
    #[serde(rename = "eu-west-2")]
    EuWest2,
    /// South America (Sao Paulo)
    #[serde(rename = "sa-east-1")]
    SaEast1,
    /// AWS GovCloud (US-West)
    #[serde(rename = "us-gov-west-1")]
    UsGovWest1,
}

impl AwsRegion {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UsEast1 => "us-east-1",
            Self::UsEast2 => "us-east-2",
            Self::UsWest2 => "us-west-2",
            Self::ApNortheast2 => "ap-northeast-2",
            Self::ApSoutheast2 => "ap-southeast-2",
            Self::ApNortheast1 => "ap-northeast-1",
            Self::CaCentral1 => "ca-central-1",
            Self::EuCentral1 => "eu-central-1",
            Self::EuWest1 => "eu-west-1",
            Self::EuWest2 => "eu-west-2",
            Self::SaEast1 => "sa-east-1",
            Self::UsGovWest1 => "us-gov-west-1",
        }
    }

    /// Parse a region code, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::all().iter().copied().find(|region| region.as_str() == s)
    }

    pub fn all() -> &'static [AwsRegion] {
        &[
            Self::UsEast1,
            Self::UsEast2,
            Self::UsWest2,
            Self::ApNortheast2,
            Self::ApSoutheast2,
            Self::ApNortheast1,
            Self::CaCentral1,
            Self::EuCentral1,
            Self::EuWest1,
            Self::EuWest2,
            Self::SaEast1,
            Self::UsGovWest1,
        ]
    }

    /// `host:port` of the streaming endpoint in this region.
    pub fn streaming_host(&self) -> String {
        format!(
            "transcribestreaming.{}.amazonaws.com:{}",
            self.as_str(),
            STREAM_PORT
        )
    }
}

impl std::fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AwsRegion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unsupported AWS region: {s}"))
    }
}

/// Sample rate used for a language when none is configured.
///
/// US English and US Spanish stream at 44.1 kHz; everything else at 8 kHz.
pub fn default_sample_rate_for_language(language_code: &str) -> u32 {
    match language_code {
        "en-US" | "es-US" => 44100,
        _ => 8000,
    }
}

// =============================================================================
// Session Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub region: AwsRegion,

    /// BCP-47 code sent as `language-code`, e.g. `en-US`.
    pub language_code: String,

    /// Rate of the PCM sent to the service, in Hz.
    pub sample_rate: u32,

    /// Lifetime of the presigned URL. Only bounds the handshake.
    pub expires_seconds: u32,

    /// `host[:port]` replacing the regional endpoint. The region still goes
    /// into the credential scope.
    pub endpoint: Option<String>,

    /// URL scheme, `wss` unless talking to a local endpoint.
    pub scheme: String,

    pub max_frame_size: usize,
}

impl SessionConfig {
    /// Configuration for `language_code` in `region` at the language's default rate.
    pub fn new(region: AwsRegion, language_code: impl Into<String>) -> Self {
        let language_code = language_code.into();
        Self {
            region,
            sample_rate: default_sample_rate_for_language(&language_code),
            language_code,
            expires_seconds: DEFAULT_EXPIRES_SECONDS,
            endpoint: None,
            scheme: "wss".to_string(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_expires(mut self, expires_seconds: u32) -> Self {
        self.expires_seconds = expires_seconds;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn host(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| self.region.streaming_host())
    }

    pub fn codec_limits(&self) -> CodecLimits {
        CodecLimits {
            max_frame_size: self.max_frame_size,
        }
    }

    /// The request to presign for one connection attempt.
    pub fn signable_request(&self) -> SignableRequest {
        SignableRequest::get(
            self.scheme.as_str(),
            self.host(),
            STREAM_PATH,
            SERVICE_NAME,
            self.region.as_str(),
        )
        .with_query_param("language-code", self.language_code.as_str())
        .with_query_param("media-encoding", "pcm")
        .with_query_param("sample-rate", self.sample_rate.to_string())
        .with_expires(self.expires_seconds)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.language_code.trim().is_empty() {
            return Err("language_code must not be empty".to_string());
        }

        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(format!(
                "Sample rate must be between {} and {} Hz, got {}",
                MIN_SAMPLE_RATE, MAX_SAMPLE_RATE, self.sample_rate
            ));
        }

        if !(MIN_EXPIRES_SECONDS..=MAX_EXPIRES_SECONDS).contains(&self.expires_seconds) {
            return Err(format!(
                "expires_seconds must be between {} and {}, got {}",
                MIN_EXPIRES_SECONDS, MAX_EXPIRES_SECONDS, self.expires_seconds
            ));
        }

        if self.max_frame_size < MIN_FRAME_LEN {
            return Err(format!(
                "max_frame_size must be at least {} bytes, got {}",
                MIN_FRAME_LEN, self.max_frame_size
            ));
        }

        if self.scheme != "wss" && self.scheme != "ws" {
            return Err(format!("scheme must be ws or wss, got {}", self.scheme));
        }

        if let Some(endpoint) = &self.endpoint
            && endpoint.trim().is_empty()
        {
            return Err("endpoint override must not be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aws_region_round_trip() {
        for region in AwsRegion::all() {
            assert_eq!(AwsRegion::parse(region.as_str()), Some(*region));
        }
        assert_eq!(AwsRegion::parse("EU-WEST-1"), Some(AwsRegion::EuWest1));
        assert_eq!(AwsRegion::parse("mars-north-1"), None);
        assert!("mars-north-1".parse::<AwsRegion>().is_err());
    }

    #[test]
    fn test_streaming_host() {
        assert_eq!(
            AwsRegion::UsWest2.streaming_host(),
            "transcribestreaming.us-west-2.amazonaws.com:8443"
        );
    }

    #[test]
    fn test_default_sample_rates() {
        assert_eq!(default_sample_rate_for_language("en-US"), 44100);
        assert_eq!(default_sample_rate_for_language("es-US"), 44100);
        assert_eq!(default_sample_rate_for_language("en-GB"), 8000);
        assert_eq!(default_sample_rate_for_language("fr-FR"), 8000);

        assert_eq!(SessionConfig::new(AwsRegion::UsEast1, "en-US").sample_rate, 44100);
        assert_eq!(SessionConfig::new(AwsRegion::UsEast1, "de-DE").sample_rate, 8000);
    }

    #[test]
    fn test_signable_request() {
        let request = SessionConfig::new(AwsRegion::UsEast1, "en-US")
            .with_sample_rate(16000)
            .signable_request();

        assert_eq!(request.scheme, "wss");
        assert_eq!(request.host, "transcribestreaming.us-east-1.amazonaws.com:8443");
        assert_eq!(request.path, "/stream-transcription-websocket");
        assert_eq!(request.service, "transcribe");
        assert_eq!(request.region, "us-east-1");
        assert_eq!(request.expires_seconds, 15);
        assert_eq!(
            request.extra_query_params,
            vec![
                ("language-code".to_string(), "en-US".to_string()),
                ("media-encoding".to_string(), "pcm".to_string()),
                ("sample-rate".to_string(), "16000".to_string()),
            ]
        );
    }

    #[test]
    fn test_endpoint_override_keeps_region() {
        let request = SessionConfig::new(AwsRegion::EuCentral1, "de-DE")
            .with_endpoint("127.0.0.1:9000")
            .with_scheme("ws")
            .signable_request();

        assert_eq!(request.host, "127.0.0.1:9000");
        assert_eq!(request.scheme, "ws");
        assert_eq!(request.region, "eu-central-1");
    }

    #[test]
    fn test_validation() {
        let valid = SessionConfig::new(AwsRegion::UsEast1, "en-US");
        assert!(valid.validate().is_ok());

        assert!(valid.clone().with_sample_rate(7999).validate().is_err());
        assert!(valid.clone().with_sample_rate(48001).validate().is_err());
        assert!(valid.clone().with_expires(0).validate().is_err());
        assert!(valid.clone().with_max_frame_size(8).validate().is_err());
        assert!(valid.clone().with_scheme("http").validate().is_err());
        assert!(valid.clone().with_endpoint(" ").validate().is_err());

        let mut no_language = valid.clone();
        no_language.language_code = String::new();
        assert!(no_language.validate().is_err());
    }
}
