use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{JsonRpcError, JsonRpcErrorObject};
use crate::types::{JsonRpcVersion, RequestId};

/// A successful JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub result: Value,
    pub id: RequestId,
}

impl JsonRpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            result,
            id,
        }
    }
}

/// Either a successful response or an error response.
/// Keeping the two apart guarantees exactly one of `result`/`error` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// Error response with error field
    Error(JsonRpcError),
    /// Successful response with result field
    Response(JsonRpcResponse),
}

impl JsonRpcMessage {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self::Response(JsonRpcResponse::success(id, result))
    }

    pub fn error(id: RequestId, error: JsonRpcErrorObject) -> Self {
        Self::Error(JsonRpcError::new(id, error))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, JsonRpcMessage::Error(_))
    }

    pub fn id(&self) -> &RequestId {
        match self {
            JsonRpcMessage::Response(resp) => &resp.id,
            JsonRpcMessage::Error(err) => &err.id,
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match self {
            JsonRpcMessage::Response(resp) => Some(&resp.result),
            JsonRpcMessage::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&JsonRpcErrorObject> {
        match self {
            JsonRpcMessage::Response(_) => None,
            JsonRpcMessage::Error(err) => Some(&err.error),
        }
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(response: JsonRpcResponse) -> Self {
        Self::Response(response)
    }
}

impl From<JsonRpcError> for JsonRpcMessage {
    fn from(error: JsonRpcError) -> Self {
        Self::Error(error)
    }
}

/// The outward payload of one exchange.
///
/// `Empty` means no body at all: transports must answer with an empty
/// success, never `[]` or `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    Single(JsonRpcMessage),
    Batch(Vec<JsonRpcMessage>),
    Empty,
}

impl ResponsePayload {
    /// Assemble a single-request outcome; notifications yield no body
    pub fn single(message: Option<JsonRpcMessage>) -> Self {
        match message {
            Some(message) => ResponsePayload::Single(message),
            None => ResponsePayload::Empty,
        }
    }

    /// Assemble a batch outcome, collapsing an empty sequence into no body
    pub fn batch(messages: Vec<JsonRpcMessage>) -> Self {
        if messages.is_empty() {
            ResponsePayload::Empty
        } else {
            ResponsePayload::Batch(messages)
        }
    }

    pub fn has_body(&self) -> bool {
        !matches!(self, ResponsePayload::Empty)
    }

    /// Responses in output order, whatever the payload shape
    pub fn messages(&self) -> &[JsonRpcMessage] {
        match self {
            ResponsePayload::Single(message) => std::slice::from_ref(message),
            ResponsePayload::Batch(messages) => messages,
            ResponsePayload::Empty => &[],
        }
    }

    pub fn to_value(&self) -> Option<Value> {
        match self {
            ResponsePayload::Single(message) => serde_json::to_value(message).ok(),
            ResponsePayload::Batch(messages) => serde_json::to_value(messages).ok(),
            ResponsePayload::Empty => None,
        }
    }

    pub fn to_json_string(&self) -> Option<String> {
        match self {
            ResponsePayload::Single(message) => serde_json::to_string(message).ok(),
            ResponsePayload::Batch(messages) => serde_json::to_string(messages).ok(),
            ResponsePayload::Empty => None,
        }
    }
}
