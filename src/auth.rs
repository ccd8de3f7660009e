use crate::error::{HoundifyError, Result};
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signed authentication values for a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthValues {
    /// Value of the `Hound-Client-Authentication` header
    pub client_auth: String,
    /// Value of the `Hound-Request-Authentication` header
    pub request_auth: String,
    /// Seconds since epoch used in the signature; must also go into RequestInfo
    pub timestamp: i64,
}

/// Sign a request at the current time.
///
/// Every call takes a fresh timestamp, so the resulting tokens are single-use.
pub fn generate_auth_values(
    client_id: &str,
    client_key: &str,
    user_id: &str,
    request_id: &str,
) -> Result<AuthValues> {
    let timestamp = chrono::Utc::now().timestamp();
    sign_at(client_id, client_key, user_id, request_id, timestamp)
}

/// Sign a request for an explicit timestamp
pub fn sign_at(
    client_id: &str,
    client_key: &str,
    user_id: &str,
    request_id: &str,
    timestamp: i64,
) -> Result<AuthValues> {
    let decoded_key = base64::engine::general_purpose::STANDARD
        .decode(unescape_base64_url(client_key))
        .map_err(|e| HoundifyError::InvalidCredentials(format!("failed to decode client key: {}", e)))?;

    let mut mac = HmacSha256::new_from_slice(&decoded_key)
        .map_err(|e| HoundifyError::SigningFailure(e.to_string()))?;
    // No separator between request id and timestamp; the server signs the same bytes
    mac.update(format!("{};{}{}", user_id, request_id, timestamp).as_bytes());
    let digest = mac.finalize().into_bytes();

    let signature =
        escape_base64_url(&base64::engine::general_purpose::STANDARD.encode(digest));

    Ok(AuthValues {
        client_auth: format!("{};{};{}", client_id, timestamp, signature),
        request_auth: format!("{};{}", user_id, request_id),
        timestamp,
    })
}

/// Convert the URL-safe base64 alphabet back to the standard one
pub fn unescape_base64_url(input: &str) -> String {
    input.replace('-', "+").replace('_', "/")
}

/// Convert standard base64 to the URL-safe alphabet (padding is kept)
pub fn escape_base64_url(input: &str) -> String {
    input.replace('+', "-").replace('/', "_")
}
