use thiserror::Error;

pub type Result<T> = std::result::Result<T, HoundifyError>;

/// Errors returned by the Houndify client
///
/// Variants raised after the server answered carry the raw response body so
/// callers can still show the service's diagnostic text; see [`HoundifyError::body`].
#[derive(Debug, Error)]
pub enum HoundifyError {
    #[error("invalid client credentials: {0}")]
    InvalidCredentials(String),

    #[error("failed to sign request: {0}")]
    SigningFailure(String),

    #[error("failed to build request: {0}")]
    RequestBuildFailure(String),

    #[error("failed to send request")]
    TransportFailure(#[source] reqwest::Error),

    #[error("error reading Houndify server response")]
    StreamReadFailure(#[source] std::io::Error),

    #[error("server returned an error: {message}")]
    ServerError { message: String, body: String },

    #[error("malformed server response: {reason}")]
    MalformedResponse { reason: String, body: String },

    #[error("no results to return")]
    EmptyResponse { body: String },

    #[error("unable to parse new conversation state from response: {reason}")]
    ConversationStateUnavailable { reason: String, body: String },

    #[error("request cancelled")]
    Cancelled,
}

impl HoundifyError {
    /// Raw server response body associated with this error, if one was received
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::ServerError { body, .. }
            | Self::MalformedResponse { body, .. }
            | Self::EmptyResponse { body }
            | Self::ConversationStateUnavailable { body, .. } => Some(body),
            _ => None,
        }
    }
}
