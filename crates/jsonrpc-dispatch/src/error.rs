use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::binder::BindingError;
use crate::error_codes;
use crate::types::{JsonRpcVersion, RequestId};

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonRpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerError,
}

impl JsonRpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            JsonRpcErrorCode::ParseError => error_codes::PARSE_ERROR,
            JsonRpcErrorCode::InvalidRequest => error_codes::INVALID_REQUEST,
            JsonRpcErrorCode::MethodNotFound => error_codes::METHOD_NOT_FOUND,
            JsonRpcErrorCode::InvalidParams => error_codes::INVALID_PARAMS,
            JsonRpcErrorCode::InternalError => error_codes::INTERNAL_ERROR,
            JsonRpcErrorCode::ServerError => error_codes::SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            JsonRpcErrorCode::ParseError => "Parse error",
            JsonRpcErrorCode::InvalidRequest => "Invalid Request",
            JsonRpcErrorCode::MethodNotFound => "Method not found",
            JsonRpcErrorCode::InvalidParams => "Invalid params",
            JsonRpcErrorCode::InternalError => "Internal error",
            JsonRpcErrorCode::ServerError => "Server error",
        }
    }

    /// Look up a raw code in the canonical taxonomy
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            error_codes::PARSE_ERROR => Some(JsonRpcErrorCode::ParseError),
            error_codes::INVALID_REQUEST => Some(JsonRpcErrorCode::InvalidRequest),
            error_codes::METHOD_NOT_FOUND => Some(JsonRpcErrorCode::MethodNotFound),
            error_codes::INVALID_PARAMS => Some(JsonRpcErrorCode::InvalidParams),
            error_codes::INTERNAL_ERROR => Some(JsonRpcErrorCode::InternalError),
            error_codes::SERVER_ERROR => Some(JsonRpcErrorCode::ServerError),
            _ => None,
        }
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// JSON-RPC Error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    /// The message is always the fixed text for the code
    pub fn new(code: JsonRpcErrorCode, data: Option<Value>) -> Self {
        Self {
            code: code.code(),
            message: code.message().to_string(),
            data,
        }
    }

    pub fn parse_error() -> Self {
        Self::new(JsonRpcErrorCode::ParseError, None)
    }

    pub fn invalid_request() -> Self {
        Self::new(JsonRpcErrorCode::InvalidRequest, None)
    }

    pub fn method_not_found() -> Self {
        Self::new(JsonRpcErrorCode::MethodNotFound, None)
    }

    pub fn kind(&self) -> Option<JsonRpcErrorCode> {
        JsonRpcErrorCode::from_code(self.code)
    }
}

/// JSON-RPC Error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub error: JsonRpcErrorObject,
    pub id: RequestId,
}

impl JsonRpcError {
    pub fn new(id: RequestId, error: JsonRpcErrorObject) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            error,
            id,
        }
    }

    pub fn parse_error() -> Self {
        Self::new(RequestId::Null, JsonRpcErrorObject::parse_error())
    }

    pub fn invalid_request(id: RequestId) -> Self {
        Self::new(id, JsonRpcErrorObject::invalid_request())
    }

    pub fn method_not_found(id: RequestId) -> Self {
        Self::new(id, JsonRpcErrorObject::method_not_found())
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "JSON-RPC Error {}: {}",
            self.error.code, self.error.message
        )
    }
}

impl std::error::Error for JsonRpcError {}

/// Application fault addressed to RPC consumers.
///
/// Its code, message and data are forwarded verbatim inside the error `data`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RpcFault {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

impl RpcFault {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Failures raised while binding parameters or invoking an operation
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Fault(#[from] RpcFault),

    #[error("{message}")]
    Failure { code: Option<i64>, message: String },

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Operation panicked")]
    Panicked,
}

impl InvocationError {
    /// An uncategorized failure; maps to the generic server error
    pub fn failure(message: impl Into<String>) -> Self {
        InvocationError::Failure {
            code: None,
            message: message.into(),
        }
    }

    /// A failure carrying its own code
    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        InvocationError::Failure {
            code: Some(code),
            message: message.into(),
        }
    }

    pub fn fault(code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        InvocationError::Fault(RpcFault {
            code,
            message: message.into(),
            data,
        })
    }

    /// The structured code carried by the failure, if any
    pub fn code(&self) -> Option<i64> {
        match self {
            InvocationError::Binding(err) => err.code(),
            InvocationError::Fault(fault) => Some(fault.code),
            InvocationError::Failure { code, .. } => *code,
            InvocationError::Timeout(_) | InvocationError::Panicked => {
                Some(error_codes::INTERNAL_ERROR)
            }
        }
    }
}

impl From<serde_json::Error> for InvocationError {
    fn from(err: serde_json::Error) -> Self {
        InvocationError::failure(err.to_string())
    }
}

/// Configuration-time errors raised while assembling services and the registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Service alias must not be empty")]
    EmptyAlias,

    #[error("Service alias '{0}' must not contain '.'")]
    InvalidAlias(String),

    #[error("Service alias '{0}' is already registered")]
    DuplicateAlias(String),

    #[error("Operation name must not be empty")]
    EmptyOperation,

    #[error("Operation '{0}' is already declared")]
    DuplicateOperation(String),
}
