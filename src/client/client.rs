use crate::error::{HoundifyError, Result};
use crate::request::{build_request, RequestInfoEncoding, TextRequest, VoiceRequest};
use crate::response::parse_conversation_state;
use crate::stream::{decode_response, PartialTranscript};
use futures::TryStreamExt;
use reqwest::StatusCode;
use serde_json::Value;
use std::future::Future;
use std::io;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

pub const HOUNDIFY_VOICE_URL: &str = "https://api.houndify.com:443/v1/audio";
pub const HOUNDIFY_TEXT_URL: &str = "https://api.houndify.com:443/v1/text";

/// Holds credentials and conversation state for all outgoing Houndify requests.
///
/// Searches take `&mut self` because a successful response replaces the
/// stored conversation state. Use one client per concurrent conversation.
pub struct Client {
    client_id: String,
    client_key: String,
    text_url: String,
    voice_url: String,
    request_info_in_body: bool,
    enable_conversation_state: bool,
    conversation_state: Value,
    http: reqwest::Client,
}

impl Client {
    /// `client_key` is the base64url secret from the Houndify dashboard
    pub fn new(client_id: impl Into<String>, client_key: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_key: client_key.into(),
            text_url: HOUNDIFY_TEXT_URL.to_string(),
            voice_url: HOUNDIFY_VOICE_URL.to_string(),
            request_info_in_body: false,
            enable_conversation_state: false,
            conversation_state: Value::Null,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_text_url(mut self, url: impl Into<String>) -> Self {
        self.text_url = url.into();
        self
    }

    pub fn with_voice_url(mut self, url: impl Into<String>) -> Self {
        self.voice_url = url.into();
        self
    }

    /// Send text request metadata as the request body instead of a header.
    /// Voice requests always use the header since their body carries audio.
    pub fn with_request_info_in_body(mut self, enabled: bool) -> Self {
        self.request_info_in_body = enabled;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn client_key(&self) -> &str {
        &self.client_key
    }

    pub fn text_url(&self) -> &str {
        &self.text_url
    }

    pub fn voice_url(&self) -> &str {
        &self.voice_url
    }

    /// Enable conversation state for future queries
    pub fn enable_conversation_state(&mut self) {
        self.enable_conversation_state = true;
    }

    /// Disable conversation state for future queries
    pub fn disable_conversation_state(&mut self) {
        self.enable_conversation_state = false;
    }

    pub fn is_conversation_state_enabled(&self) -> bool {
        self.enable_conversation_state
    }

    /// Forget the current conversation state
    pub fn clear_conversation_state(&mut self) {
        self.conversation_state = Value::Null;
    }

    /// Current conversation state, useful for saving
    pub fn conversation_state(&self) -> &Value {
        &self.conversation_state
    }

    /// Resume from a saved conversation state
    pub fn set_conversation_state(&mut self, state: Value) {
        self.conversation_state = state;
    }

    /// Send a text request and return the body of the Hound server response.
    ///
    /// On failure after the server answered, the body is available through
    /// [`HoundifyError::body`].
    pub async fn text_search(&mut self, request: TextRequest) -> Result<String> {
        let encoding = if self.request_info_in_body {
            RequestInfoEncoding::Body
        } else {
            RequestInfoEncoding::Header
        };
        let prepared = build_request(self, &request, encoding)?;
        let cancel = request.parts.cancel.as_ref();

        info!("Sending text request {}", request.parts.request_id);

        let mut builder = self.http.post(prepared.url).headers(prepared.headers);
        if let Some(body) = prepared.body {
            builder = builder.body(body);
        }

        let response = cancellable(cancel, builder.send())
            .await?
            .map_err(HoundifyError::TransportFailure)?;

        let status = response.status();
        debug!("{:?} {}", response.version(), status);
        trace!("Headers: {:?}", response.headers());

        let body = cancellable(cancel, response.text())
            .await?
            .map_err(|e| HoundifyError::StreamReadFailure(io::Error::other(e)))?;
        trace!("{}", body);

        self.finish_response(status, body)
    }

    /// Send an audio request and return the body of the Hound server response.
    ///
    /// Partial transcripts are sent to `partials` while the server is still
    /// listening; the channel closes once all of them have been delivered.
    /// The receiver may be consumed on another task or after this returns.
    pub async fn voice_search(
        &mut self,
        request: VoiceRequest,
        partials: mpsc::Sender<PartialTranscript>,
    ) -> Result<String> {
        let prepared = build_request(self, &request, RequestInfoEncoding::Header)?;
        let VoiceRequest { audio, parts } = request;
        let cancel = parts.cancel.as_ref();

        info!("Sending voice request {}", parts.request_id);

        let builder = self
            .http
            .post(prepared.url)
            .headers(prepared.headers)
            .body(reqwest::Body::wrap_stream(audio));

        let response = cancellable(cancel, builder.send())
            .await?
            .map_err(HoundifyError::TransportFailure)?;

        let status = response.status();
        debug!("{:?} {}", response.version(), status);
        trace!("Headers: {:?}", response.headers());

        let reader = StreamReader::new(Box::pin(response.bytes_stream().map_err(io::Error::other)));
        let body = cancellable(cancel, decode_response(reader, partials)).await??;

        self.finish_response(status, body)
    }

    fn finish_response(&mut self, status: StatusCode, body: String) -> Result<String> {
        // Don't try to parse conversation state out of a bad response
        if status.as_u16() >= 400 {
            return Err(HoundifyError::ServerError {
                message: format!("error response: HTTP {}", status),
                body,
            });
        }
        if body.trim().is_empty() {
            return Err(HoundifyError::EmptyResponse { body });
        }

        if self.enable_conversation_state {
            self.conversation_state = parse_conversation_state(&body)?;
            debug!("Updated conversation state");
        }

        Ok(body)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("client_id", &self.client_id)
            .field("text_url", &self.text_url)
            .field("voice_url", &self.voice_url)
            .field("request_info_in_body", &self.request_info_in_body)
            .field("enable_conversation_state", &self.enable_conversation_state)
            .finish_non_exhaustive()
    }
}

/// Race `fut` against the request's cancellation token, if any
async fn cancellable<F: Future>(token: Option<&CancellationToken>, fut: F) -> Result<F::Output> {
    match token {
        Some(token) => tokio::select! {
            _ = token.cancelled() => Err(HoundifyError::Cancelled),
            output = fut => Ok(output),
        },
        None => Ok(fut.await),
    }
}
