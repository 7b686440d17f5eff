//! JSON bodies carried in event-stream payloads.
//!
//! `TranscriptEvent` frames hold a `Transcript` with one or more result
//! segments; `exception` frames hold a `{ "Message": ... }` body.

use serde::{Deserialize, Serialize};

// =============================================================================
// Transcription Results
// =============================================================================

/// One hypothesis for a segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alternative {
    #[serde(rename = "Transcript")]
    pub transcript: Option<String>,
}

/// A transcription segment.
///
/// Partial segments are revised by later events; a final one is not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    #[serde(rename = "ResultId")]
    pub result_id: Option<String>,

    #[serde(rename = "StartTime")]
    pub start_time: Option<f64>,

    #[serde(rename = "EndTime")]
    pub end_time: Option<f64>,

    #[serde(rename = "IsPartial")]
    pub is_partial: Option<bool>,

    /// Ordered best first.
    #[serde(rename = "Alternatives")]
    pub alternatives: Option<Vec<Alternative>>,

    #[serde(rename = "ChannelId")]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(rename = "Results")]
    pub results: Option<Vec<TranscriptSegment>>,
}

/// Top-level body of a `TranscriptEvent` frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEvent {
    #[serde(rename = "Transcript")]
    pub transcript: Option<Transcript>,
}

/// A hypothesis surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptResult {
    pub text: String,
    pub is_partial: bool,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl TranscriptSegment {
    /// Text of the first (most likely) alternative.
    pub fn best_transcript(&self) -> Option<&str> {
        self.alternatives
            .as_ref()
            .and_then(|alts| alts.first())
            .and_then(|alt| alt.transcript.as_deref())
    }

    /// A segment without `IsPartial` is treated as partial.
    pub fn is_final(&self) -> bool {
        self.is_partial.map(|p| !p).unwrap_or(false)
    }
}

impl TranscriptEvent {
    pub fn segments(&self) -> &[TranscriptSegment] {
        self.transcript
            .as_ref()
            .and_then(|t| t.results.as_deref())
            .unwrap_or_default()
    }

    /// Leading hypothesis of every segment that has non-empty text, in order.
    pub fn results(&self) -> Vec<TranscriptResult> {
        self.segments()
            .iter()
            .filter_map(|segment| {
                let text = segment.best_transcript()?;
                if text.is_empty() {
                    return None;
                }
                Some(TranscriptResult {
                    text: text.to_string(),
                    is_partial: !segment.is_final(),
                })
            })
            .collect()
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Body of an `exception` frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionMessage {
    #[serde(rename = "Message")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transcript_event() {
        let json = r#"{
            "Transcript": {
                "Results": [
                    {
                        "ResultId": "r1",
                        "StartTime": 0.1,
                        "EndTime": 1.2,
                        "IsPartial": false,
                        "Alternatives": [
                            {
                                "Transcript": "Hello world.",
                                "Items": [
                                    {"Content": "Hello", "Confidence": 0.95, "Type": "pronunciation"},
                                    {"Content": "world", "Confidence": 0.85, "Type": "pronunciation"},
                                    {"Content": ".", "Type": "punctuation"}
                                ]
                            },
                            {"Transcript": "Hollow world."}
                        ]
                    }
                ]
            }
        }"#;

        let event: TranscriptEvent = serde_json::from_str(json).unwrap();
        let segment = &event.segments()[0];
        assert_eq!(segment.best_transcript(), Some("Hello world."));
        assert!(segment.is_final());

        assert_eq!(
            event.results(),
            vec![TranscriptResult {
                text: "Hello world.".to_string(),
                is_partial: false,
            }]
        );
    }

    #[test]
    fn test_missing_is_partial_counts_as_partial() {
        let json = r#"{"Transcript":{"Results":[{"Alternatives":[{"Transcript":"hel"}]}]}}"#;
        let event: TranscriptEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event.results(),
            vec![TranscriptResult {
                text: "hel".to_string(),
                is_partial: true,
            }]
        );
    }

    #[test]
    fn test_empty_and_missing_alternatives_skipped() {
        let json = r#"{"Transcript":{"Results":[
            {"IsPartial":true,"Alternatives":[]},
            {"IsPartial":false},
            {"IsPartial":false,"Alternatives":[{"Transcript":""}]},
            {"IsPartial":true,"Alternatives":[{"Transcript":"kept"}]}
        ]}}"#;
        let event: TranscriptEvent = serde_json::from_str(json).unwrap();
        let results = event.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "kept");
    }

    #[test]
    fn test_empty_transcript_event() {
        let event: TranscriptEvent = serde_json::from_str(r#"{"Transcript":{"Results":[]}}"#).unwrap();
        assert!(event.results().is_empty());

        let event: TranscriptEvent = serde_json::from_str("{}").unwrap();
        assert!(event.segments().is_empty());
    }

    #[test]
    fn test_exception_message() {
        let exception: ExceptionMessage =
            serde_json::from_str(r#"{"Message":"Invalid sample rate"}"#).unwrap();
        assert_eq!(exception.message.as_deref(), Some("Invalid sample rate"));

        // Extra fields such as `Code` are tolerated.
        let exception: ExceptionMessage =
            serde_json::from_str(r#"{"Code":"BadRequestException"}"#).unwrap();
        assert_eq!(exception.message, None);
    }
}
