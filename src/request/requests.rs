use super::info::RequestInfo;
use crate::client::Client;
use crate::error::{HoundifyError, Result};
use bytes::Bytes;
use futures::stream::{self, Stream};
use serde_json::Value;
use std::io;
use std::pin::Pin;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Outbound audio body of a voice request
pub type AudioStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + Sync>>;

/// Fields shared by every request shape
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    /// End-user identifier, stable per user
    pub user_id: String,
    /// Unique per request; part of the signature to prevent replay
    pub request_id: String,
    /// Extra RequestInfo fields merged under the reserved ones
    pub request_info: RequestInfo,
    /// Overrides the client's endpoint for this request
    pub url: Option<String>,
    /// Extra headers applied after all SDK headers
    pub headers: Vec<(String, String)>,
    /// Cancels sending and decoding when triggered
    pub cancel: Option<CancellationToken>,
}

/// Capability shared by text and voice requests
pub trait Requestable {
    fn parts(&self) -> &RequestParts;

    fn parts_mut(&mut self) -> &mut RequestParts;

    /// Endpoint used when the request carries no URL override
    fn default_endpoint<'a>(&self, client: &'a Client) -> &'a str;

    /// Final request URL
    fn target_url(&self, client: &Client) -> Result<Url> {
        parse_endpoint(self.parts(), self.default_endpoint(client))
    }

    fn with_url(mut self, url: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.parts_mut().url = Some(url.into());
        self
    }

    fn with_request_info_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self
    where
        Self: Sized,
    {
        self.parts_mut().request_info.insert(key.into(), value.into());
        self
    }

    fn with_request_info(mut self, fields: RequestInfo) -> Self
    where
        Self: Sized,
    {
        self.parts_mut().request_info.extend(fields);
        self
    }

    fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.parts_mut().headers.push((name.into(), value.into()));
        self
    }

    fn with_cancellation(mut self, token: CancellationToken) -> Self
    where
        Self: Sized,
    {
        self.parts_mut().cancel = Some(token);
        self
    }
}

fn parse_endpoint(parts: &RequestParts, default_endpoint: &str) -> Result<Url> {
    let endpoint = parts.url.as_deref().unwrap_or(default_endpoint);
    Url::parse(endpoint)
        .map_err(|e| HoundifyError::RequestBuildFailure(format!("invalid URL {:?}: {}", endpoint, e)))
}

/// A text query, e.g. "what time is it in london"
#[derive(Debug, Clone)]
pub struct TextRequest {
    pub query: String,
    pub parts: RequestParts,
}

impl TextRequest {
    pub fn new(
        query: impl Into<String>,
        user_id: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            parts: RequestParts {
                user_id: user_id.into(),
                request_id: request_id.into(),
                ..Default::default()
            },
        }
    }
}

impl Requestable for TextRequest {
    fn parts(&self) -> &RequestParts {
        &self.parts
    }

    fn parts_mut(&mut self) -> &mut RequestParts {
        &mut self.parts
    }

    fn default_endpoint<'a>(&self, client: &'a Client) -> &'a str {
        client.text_url()
    }

    fn target_url(&self, client: &Client) -> Result<Url> {
        let mut url = parse_endpoint(&self.parts, client.text_url())?;
        url.query_pairs_mut().append_pair("query", &self.query);
        Ok(url)
    }
}

/// A voice query; the audio must already be in an encoding Houndify accepts
pub struct VoiceRequest {
    pub audio: AudioStream,
    pub parts: RequestParts,
}

impl VoiceRequest {
    /// Audio that is fully known upfront
    pub fn from_bytes(
        audio: impl Into<Bytes>,
        user_id: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        let audio: Bytes = audio.into();
        Self::from_stream(stream::iter([Ok(audio)]), user_id, request_id)
    }

    /// Audio read incrementally, e.g. the read half of a pipe being written live
    pub fn from_reader<R>(reader: R, user_id: impl Into<String>, request_id: impl Into<String>) -> Self
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        Self::from_stream(ReaderStream::new(reader), user_id, request_id)
    }

    pub fn from_stream<S>(audio: S, user_id: impl Into<String>, request_id: impl Into<String>) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + Sync + 'static,
    {
        Self {
            audio: Box::pin(audio),
            parts: RequestParts {
                user_id: user_id.into(),
                request_id: request_id.into(),
                ..Default::default()
            },
        }
    }
}

impl std::fmt::Debug for VoiceRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceRequest")
            .field("parts", &self.parts)
            .finish_non_exhaustive()
    }
}

impl Requestable for VoiceRequest {
    fn parts(&self) -> &RequestParts {
        &self.parts
    }

    fn parts_mut(&mut self) -> &mut RequestParts {
        &mut self.parts
    }

    fn default_endpoint<'a>(&self, client: &'a Client) -> &'a str {
        client.voice_url()
    }
}
