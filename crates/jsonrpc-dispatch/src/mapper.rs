//! Conversion of binding and invocation failures into JSON-RPC error objects.

use serde_json::{Value, json};

use crate::error::{InvocationError, JsonRpcErrorCode, JsonRpcErrorObject};

/// Maps every [`InvocationError`] to a well-formed error object.
///
/// Codes outside the canonical taxonomy are downgraded to the generic server
/// error. Self-describing faults are forwarded as `{code, message, data}`.
/// Raw text of uncategorized failures is forwarded only when
/// `expose_fault_messages` is set; engine-authored messages always are.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorMapper {
    expose_fault_messages: bool,
}

impl ErrorMapper {
    pub fn new(expose_fault_messages: bool) -> Self {
        Self {
            expose_fault_messages,
        }
    }

    pub fn map(&self, err: &InvocationError) -> JsonRpcErrorObject {
        let code = err
            .code()
            .and_then(JsonRpcErrorCode::from_code)
            .unwrap_or(JsonRpcErrorCode::ServerError);

        let data = match err {
            InvocationError::Fault(fault) => Some(json!({
                "code": fault.code,
                "message": fault.message,
                "data": fault.data,
            })),
            InvocationError::Failure { .. } if !self.expose_fault_messages => None,
            _ => message_data(err.to_string()),
        };

        JsonRpcErrorObject::new(code, data)
    }
}

fn message_data(message: String) -> Option<Value> {
    if message.is_empty() {
        None
    } else {
        Some(Value::String(message))
    }
}
