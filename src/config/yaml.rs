use serde::Deserialize;
use std::path::Path;

/// Complete YAML configuration structure
///
/// All fields are optional; anything left out keeps the value taken from the
/// environment.
///
/// # Example YAML structure
/// ```yaml
/// aws:
///   access_key_id: "AKIA..."
///   secret_access_key: "..."
///   session_token: "..."
///   region: "eu-west-1"
///
/// transcribe:
///   language_code: "en-GB"
///   sample_rate: 16000
///   expires_seconds: 15
///   endpoint: "wss://transcribestreaming.eu-west-1.amazonaws.com:8443"
///   max_frame_size: 16777216
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub aws: Option<AwsYaml>,
    pub transcribe: Option<TranscribeYaml>,
}

/// AWS credentials and region from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AwsYaml {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub region: Option<String>,
}

/// Streaming settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TranscribeYaml {
    pub language_code: Option<String>,
    pub sample_rate: Option<u32>,
    pub expires_seconds: Option<u32>,
    /// `host:port`, optionally prefixed with `ws://` or `wss://`.
    pub endpoint: Option<String>,
    pub max_frame_size: Option<usize>,
}

impl YamlConfig {
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
