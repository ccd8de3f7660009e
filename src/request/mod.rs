//! Outbound request assembly
//!
//! - `info`: the RequestInfo metadata document
//! - `requests`: text and voice request shapes sharing the `Requestable` capability
//! - `prepare`: signing, headers and metadata encoding for any `Requestable`

pub mod info;
pub mod prepare;
pub mod requests;

pub use info::{ConversationStatePolicy, RequestInfo, RequestInfoBuilder};
pub use prepare::{build_request, PreparedRequest, RequestInfoEncoding, SDK_USER_AGENT};
pub use requests::{AudioStream, RequestParts, Requestable, TextRequest, VoiceRequest};
