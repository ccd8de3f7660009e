pub mod audio;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod stream;

pub use audio::{AudioFile, AudioPacer};
pub use client::Client;
pub use config::Config;
pub use error::{HoundifyError, Result};
pub use request::{RequestInfo, Requestable, TextRequest, VoiceRequest};
pub use response::{parse_conversation_state, parse_written_response};
pub use stream::PartialTranscript;
