//! Streaming voice search response decoding
//!
//! The server answers a voice query with newline-delimited lines: byte-count
//! frame markers, JSON partial transcripts, and a final JSON result.

mod decoder;
mod dispatch;
mod messages;

pub use decoder::{decode_response, ResponseDecoder};
pub use messages::{
    PartialTranscript, StreamMessage, LEGACY_PARTIAL_TRANSCRIPT_FORMAT, PARTIAL_TRANSCRIPT_FORMAT,
    VOICE_SEARCH_RESULT_FORMAT,
};
