use super::info::{
    ConversationStatePolicy, RequestInfo, RequestInfoBuilder, INPUT_LANGUAGE_ENGLISH_NAME_FIELD,
    INPUT_LANGUAGE_IETF_TAG_FIELD,
};
use super::requests::Requestable;
use crate::auth::generate_auth_values;
use crate::client::Client;
use crate::error::{HoundifyError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use tracing::{debug, warn};
use url::Url;

/// Default user agent set by the SDK
pub const SDK_USER_AGENT: &str = "Rust Houndify SDK";

pub const CLIENT_AUTH_HEADER: &str = "Hound-Client-Authentication";
pub const REQUEST_AUTH_HEADER: &str = "Hound-Request-Authentication";
pub const REQUEST_INFO_HEADER: &str = "Hound-Request-Info";
pub const REQUEST_INFO_LENGTH_HEADER: &str = "Hound-Request-Info-Length";

/// RequestInfo fields copied into headers of a slightly different name
const LANGUAGE_HEADERS: [(&str, &str); 2] = [
    (INPUT_LANGUAGE_ENGLISH_NAME_FIELD, "Hound-Input-Language-English-Name"),
    (INPUT_LANGUAGE_IETF_TAG_FIELD, "Hound-Input-Language-IETF-Tag"),
];

/// Where the RequestInfo JSON travels; the two are never combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestInfoEncoding {
    /// `Hound-Request-Info` header
    Header,
    /// Whole request body, announced by `Hound-Request-Info-Length`
    Body,
}

/// A signed request ready to hand to the HTTP client
#[derive(Debug)]
pub struct PreparedRequest {
    pub url: Url,
    pub headers: HeaderMap,
    pub request_info: RequestInfo,
    /// Set only for [`RequestInfoEncoding::Body`]
    pub body: Option<Vec<u8>>,
}

/// Sign a request and attach its metadata
pub fn build_request<R: Requestable + ?Sized>(
    client: &Client,
    request: &R,
    encoding: RequestInfoEncoding,
) -> Result<PreparedRequest> {
    let url = request.target_url(client)?;
    let parts = request.parts();

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(SDK_USER_AGENT));

    let auth = generate_auth_values(
        client.client_id(),
        client.client_key(),
        &parts.user_id,
        &parts.request_id,
    )?;
    set_header(&mut headers, REQUEST_AUTH_HEADER, &auth.request_auth)?;
    set_header(&mut headers, CLIENT_AUTH_HEADER, &auth.client_auth)?;

    // Duplicated, not moved: the fields stay in the RequestInfo document
    for (field, header) in LANGUAGE_HEADERS {
        match parts.request_info.get(field) {
            Some(serde_json::Value::String(value)) => set_header(&mut headers, header, value)?,
            Some(other) => warn!("Ignoring non-string {} for header: {}", field, other),
            None => {}
        }
    }

    let policy = if client.is_conversation_state_enabled() {
        ConversationStatePolicy::Track(client.conversation_state())
    } else {
        ConversationStatePolicy::Disabled
    };

    let request_info = RequestInfoBuilder::new(client.client_id(), &parts.request_id, auth.timestamp)
        .fields(&parts.request_info)
        .conversation_state(policy)
        .build()?;

    let request_info_json = serde_json::to_vec(&request_info)
        .map_err(|e| HoundifyError::RequestBuildFailure(format!("failed to create request info: {}", e)))?;

    let body = match encoding {
        RequestInfoEncoding::Header => {
            set_header_bytes(&mut headers, REQUEST_INFO_HEADER, &request_info_json)?;
            None
        }
        RequestInfoEncoding::Body => {
            set_header(
                &mut headers,
                REQUEST_INFO_LENGTH_HEADER,
                &request_info_json.len().to_string(),
            )?;
            Some(request_info_json)
        }
    };

    for (name, value) in &parts.headers {
        set_header(&mut headers, name, value)?;
    }

    debug!(
        "Built request {} for {} (request info in {:?})",
        parts.request_id, url, encoding
    );

    Ok(PreparedRequest {
        url,
        headers,
        request_info,
        body,
    })
}

fn set_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    set_header_bytes(headers, name, value.as_bytes())
}

fn set_header_bytes(headers: &mut HeaderMap, name: &str, value: &[u8]) -> Result<()> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| HoundifyError::RequestBuildFailure(format!("invalid header name {:?}: {}", name, e)))?;
    let value = HeaderValue::from_bytes(value)
        .map_err(|e| HoundifyError::RequestBuildFailure(format!("invalid value for header {}: {}", name, e)))?;
    headers.insert(name, value);
    Ok(())
}
