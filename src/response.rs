use crate::error::{HoundifyError, Result};
use serde_json::Value;

/// Extract the human readable reply from a final server response.
///
/// Fails if the body is not valid JSON, the server reported an error, or
/// there was nothing to reply with.
pub fn parse_written_response(body: &str) -> Result<String> {
    let response = parse_response(body)?;
    first_result(&response, body)?
        .get("WrittenResponseLong")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| malformed("first result has no WrittenResponseLong", body))
}

/// Extract the opaque conversation state from a final server response.
///
/// A result without a `ConversationState` field yields `Value::Null`.
pub fn parse_conversation_state(body: &str) -> Result<Value> {
    let response = parse_response(body)?;
    let result = first_result(&response, body)?;
    let result = result
        .as_object()
        .ok_or_else(|| HoundifyError::ConversationStateUnavailable {
            reason: "first result is not an object".to_string(),
            body: body.to_string(),
        })?;
    Ok(result.get("ConversationState").cloned().unwrap_or(Value::Null))
}

fn parse_response(body: &str) -> Result<Value> {
    let response: Value = serde_json::from_str(body)
        .map_err(|e| malformed(&format!("failed to decode json: {}", e), body))?;

    let status = response
        .get("Status")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing Status", body))?;
    if !status.eq_ignore_ascii_case("OK") {
        let message = response
            .get("ErrorMessage")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("server reported status {}", status));
        return Err(HoundifyError::ServerError {
            message,
            body: body.to_string(),
        });
    }

    Ok(response)
}

fn first_result<'a>(response: &'a Value, body: &str) -> Result<&'a Value> {
    if let Some(num_to_return) = response.get("NumToReturn").and_then(Value::as_f64) {
        if num_to_return < 1.0 {
            return Err(HoundifyError::EmptyResponse {
                body: body.to_string(),
            });
        }
    }

    response
        .get("AllResults")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("missing AllResults", body))?
        .first()
        .ok_or_else(|| HoundifyError::EmptyResponse {
            body: body.to_string(),
        })
}

fn malformed(reason: &str, body: &str) -> HoundifyError {
    HoundifyError::MalformedResponse {
        reason: reason.to_string(),
        body: body.to_string(),
    }
}
