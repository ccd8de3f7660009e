use crate::error::{HoundifyError, Result};
use serde_json::{Map, Value};

/// Request metadata sent to Houndify as JSON
pub type RequestInfo = Map<String, Value>;

pub const SDK_NAME: &str = "Rust";
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const CONVERSATION_STATE_FIELD: &str = "ConversationState";
pub const INPUT_LANGUAGE_ENGLISH_NAME_FIELD: &str = "InputLanguageEnglishName";
pub const INPUT_LANGUAGE_IETF_TAG_FIELD: &str = "InputLanguageIETFTag";

/// How the `ConversationState` field is filled in
#[derive(Debug, Clone, Copy)]
pub enum ConversationStatePolicy<'a> {
    /// Echo the state returned by the previous response
    Track(&'a Value),
    /// Send an explicit null
    Disabled,
}

/// Assembles the RequestInfo document for one request
pub struct RequestInfoBuilder<'a> {
    client_id: &'a str,
    request_id: &'a str,
    timestamp: i64,
    fields: Option<&'a RequestInfo>,
    conversation_state: ConversationStatePolicy<'a>,
}

impl<'a> RequestInfoBuilder<'a> {
    pub fn new(client_id: &'a str, request_id: &'a str, timestamp: i64) -> Self {
        Self {
            client_id,
            request_id,
            timestamp,
            fields: None,
            conversation_state: ConversationStatePolicy::Disabled,
        }
    }

    /// Caller-supplied fields; null values are dropped
    pub fn fields(mut self, fields: &'a RequestInfo) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn conversation_state(mut self, policy: ConversationStatePolicy<'a>) -> Self {
        self.conversation_state = policy;
        self
    }

    pub fn build(self) -> Result<RequestInfo> {
        if self.client_id.is_empty() {
            return Err(HoundifyError::RequestBuildFailure("client ID is empty".to_string()));
        }
        if self.request_id.is_empty() {
            return Err(HoundifyError::RequestBuildFailure("request ID is empty".to_string()));
        }

        let mut info: RequestInfo = self
            .fields
            .into_iter()
            .flatten()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        // Reserved fields always win over caller values
        info.insert("TimeStamp".to_string(), Value::from(self.timestamp));
        info.insert("ClientID".to_string(), Value::from(self.client_id));
        info.insert("RequestID".to_string(), Value::from(self.request_id));
        info.insert("SDK".to_string(), Value::from(SDK_NAME));
        info.insert("SDKVersion".to_string(), Value::from(SDK_VERSION));
        info.insert("PartialTranscriptsDesired".to_string(), Value::Bool(true));
        // The stream decoder expects byte-count lines between messages
        info.insert("ObjectByteCountPrefix".to_string(), Value::Bool(true));

        // Present even when null: the server reads null as "no prior context"
        let state = match self.conversation_state {
            ConversationStatePolicy::Track(state) => state.clone(),
            ConversationStatePolicy::Disabled => Value::Null,
        };
        info.insert(CONVERSATION_STATE_FIELD.to_string(), state);

        Ok(info)
    }
}
