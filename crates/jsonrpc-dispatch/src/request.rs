use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::{JsonRpcVersion, RequestId};

/// Parameters for a JSON-RPC request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestParams {
    /// Positional parameters as an array
    Array(Vec<Value>),
    /// Named parameters as an object
    Object(Map<String, Value>),
}

/// How supplied parameters are matched against declared ones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMode {
    Named,
    Positional,
}

impl RequestParams {
    /// Accept only structured values; scalars are not valid params
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(RequestParams::Array(items)),
            Value::Object(map) => Some(RequestParams::Object(map)),
            _ => None,
        }
    }

    /// Named binding applies only to a non-empty object whose keys are not
    /// the sequence `"0".."n-1"`; everything else binds by position.
    pub fn binding_mode(&self) -> BindingMode {
        match self {
            RequestParams::Object(map) if !map.is_empty() && !is_sequential(map) => {
                BindingMode::Named
            }
            _ => BindingMode::Positional,
        }
    }

    /// Get a parameter by name (for object params)
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            RequestParams::Object(map) => map.get(key),
            RequestParams::Array(_) => None,
        }
    }

    /// Get a parameter by position. Sequentially keyed objects are
    /// addressable by index as well.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            RequestParams::Array(vec) => vec.get(index),
            RequestParams::Object(map) => map.get(&index.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RequestParams::Object(map) => map.is_empty(),
            RequestParams::Array(vec) => vec.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RequestParams::Object(map) => map.len(),
            RequestParams::Array(vec) => vec.len(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RequestParams::Object(map) => Value::Object(map.clone()),
            RequestParams::Array(arr) => Value::Array(arr.clone()),
        }
    }
}

fn is_sequential(map: &Map<String, Value>) -> bool {
    (0..map.len()).all(|i| map.contains_key(&i.to_string()))
}

impl From<Map<String, Value>> for RequestParams {
    fn from(map: Map<String, Value>) -> Self {
        RequestParams::Object(map)
    }
}

impl From<Vec<Value>> for RequestParams {
    fn from(vec: Vec<Value>) -> Self {
        RequestParams::Array(vec)
    }
}

/// A structurally valid JSON-RPC request.
///
/// `id` is `None` when the field was absent, which makes the request a
/// notification. A present `null` id is `Some(RequestId::Null)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcRequest {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<RequestParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl JsonRpcRequest {
    pub fn new(
        id: Option<RequestId>,
        method: impl Into<String>,
        params: Option<RequestParams>,
    ) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method: method.into(),
            params,
            id,
        }
    }

    /// Create a request that expects a response
    pub fn call(id: RequestId, method: impl Into<String>, params: Option<RequestParams>) -> Self {
        Self::new(Some(id), method, params)
    }

    /// Create a notification (no id, no response)
    pub fn notification(method: impl Into<String>, params: Option<RequestParams>) -> Self {
        Self::new(None, method, params)
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// The id to echo in a response
    pub fn response_id(&self) -> RequestId {
        self.id.clone().unwrap_or_default()
    }

    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.as_ref()?.get(name)
    }

    pub fn get_param_index(&self, index: usize) -> Option<&Value> {
        self.params.as_ref()?.get_index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> RequestParams {
        RequestParams::from_value(value).unwrap()
    }

    #[test]
    fn test_binding_mode_detection() {
        assert_eq!(object(json!([1, 2])).binding_mode(), BindingMode::Positional);
        assert_eq!(object(json!([])).binding_mode(), BindingMode::Positional);
        assert_eq!(object(json!({})).binding_mode(), BindingMode::Positional);
        assert_eq!(object(json!({"a": 1})).binding_mode(), BindingMode::Named);
        assert_eq!(
            object(json!({"0": "x", "1": "y"})).binding_mode(),
            BindingMode::Positional
        );
        assert_eq!(
            object(json!({"1": "x", "2": "y"})).binding_mode(),
            BindingMode::Named
        );
    }

    #[test]
    fn test_scalar_params_rejected() {
        assert!(RequestParams::from_value(json!(5)).is_none());
        assert!(RequestParams::from_value(json!("a")).is_none());
        assert!(RequestParams::from_value(json!(null)).is_none());
    }

    #[test]
    fn test_request_with_array_params() {
        let request = JsonRpcRequest::call(
            RequestId::from(2),
            "svc.process",
            Some(vec![json!("test"), json!(42), json!(true)].into()),
        );

        assert_eq!(request.get_param_index(0), Some(&json!("test")));
        assert_eq!(request.get_param_index(2), Some(&json!(true)));
        assert_eq!(request.get_param_index(3), None);
        assert_eq!(request.get_param("test"), None);
    }

    #[test]
    fn test_sequential_object_addressable_by_index() {
        let params = object(json!({"0": "first", "1": "second"}));
        assert_eq!(params.get_index(1), Some(&json!("second")));
    }

    #[test]
    fn test_notification_json_format() {
        let notification = JsonRpcRequest::notification("log.write", None);
        assert!(notification.is_notification());
        assert_eq!(notification.response_id(), RequestId::Null);

        let json_str = serde_json::to_string(&notification).unwrap();
        assert!(!json_str.contains("\"id\""));
        assert!(json_str.contains("\"jsonrpc\":\"2.0\""));
    }

    #[test]
    fn test_null_id_is_not_a_notification() {
        let request = JsonRpcRequest::call(RequestId::Null, "calc.add", None);
        assert!(!request.is_notification());
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("id").unwrap().is_null());
    }
}
