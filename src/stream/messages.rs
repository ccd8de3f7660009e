use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// Partial transcript format. Houndify still sends the misspelled legacy
/// name below, so both are accepted.
pub const PARTIAL_TRANSCRIPT_FORMAT: &str = "HoundVoiceQueryPartialTranscript";
pub const LEGACY_PARTIAL_TRANSCRIPT_FORMAT: &str = "SoundHoundVoiceSearchParialTranscript";
pub const VOICE_SEARCH_RESULT_FORMAT: &str = "SoundHoundVoiceSearchResult";

/// Incremental transcript delivered while a voice query is in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialTranscript {
    /// Transcript text so far
    pub message: String,
    /// Length of audio this transcript applies to
    pub duration: Duration,
    /// Whether this is the last partial transcript
    pub done: bool,
    /// The server has enough audio; the caller may stop sending
    pub safe_to_stop_audio: Option<bool>,
}

/// One classified line of a voice search response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMessage {
    /// Byte count of the following message (`ObjectByteCountPrefix`)
    FrameLengthMarker(i64),
    PartialTranscript(PartialTranscript),
    /// The raw final response line
    TerminalResult(String),
    Unrecognized,
}

/// Fields every Hound server JSON message may carry
#[derive(Debug, Deserialize)]
struct ServerMessage {
    #[serde(rename = "Format")]
    format: String,
    #[serde(rename = "PartialTranscript", default)]
    partial_transcript: String,
    #[serde(rename = "DurationMS", default)]
    duration_ms: i64,
    #[serde(rename = "Done", default)]
    done: bool,
    #[serde(rename = "SafeToStopAudio", default)]
    safe_to_stop_audio: Option<bool>,
}

impl StreamMessage {
    /// Classify a single non-blank, trimmed response line
    pub fn classify(line: &str) -> Self {
        if let Ok(byte_count) = line.parse::<i64>() {
            return Self::FrameLengthMarker(byte_count);
        }

        let incoming: ServerMessage = match serde_json::from_str(line) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Failed reading hound server message: {}", e);
                return Self::Unrecognized;
            }
        };

        match incoming.format.as_str() {
            PARTIAL_TRANSCRIPT_FORMAT | LEGACY_PARTIAL_TRANSCRIPT_FORMAT => {
                if incoming.duration_ms < 0 {
                    warn!("Negative partial transcript duration {}ms, using 0", incoming.duration_ms);
                }
                Self::PartialTranscript(PartialTranscript {
                    message: incoming.partial_transcript,
                    duration: Duration::from_millis(incoming.duration_ms.max(0) as u64),
                    done: incoming.done,
                    safe_to_stop_audio: incoming.safe_to_stop_audio,
                })
            }
            VOICE_SEARCH_RESULT_FORMAT => Self::TerminalResult(line.to_string()),
            _ => Self::Unrecognized,
        }
    }
}
