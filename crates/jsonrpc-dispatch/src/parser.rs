//! Raw payload parsing and structural validation.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::JsonRpcError;
use crate::request::{JsonRpcRequest, RequestParams};
use crate::types::{JsonRpcVersion, RequestId};

/// One candidate request: either valid, or the `InvalidRequest` response for its slot
pub type ParsedItem = Result<JsonRpcRequest, JsonRpcError>;

/// Classified payload
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedPayload {
    Single(ParsedItem),
    Batch(Vec<ParsedItem>),
}

/// Parse raw bytes into a single request or a batch.
///
/// `Err` is terminal for the whole exchange: malformed JSON, an empty array,
/// or a top-level value that is neither a non-empty object nor an array.
pub fn parse_payload(raw: &[u8]) -> Result<ParsedPayload, JsonRpcError> {
    let value: Value = serde_json::from_slice(raw).map_err(|err| {
        debug!(error = %err, "Payload is not valid JSON");
        JsonRpcError::parse_error()
    })?;

    match value {
        Value::Array(items) if items.is_empty() => {
            debug!("Empty batch rejected");
            Err(JsonRpcError::invalid_request(RequestId::Null))
        }
        Value::Array(items) => Ok(ParsedPayload::Batch(
            items.into_iter().map(parse_request).collect(),
        )),
        Value::Object(map) if !map.is_empty() => Ok(ParsedPayload::Single(parse_object(map))),
        _ => Err(JsonRpcError::invalid_request(RequestId::Null)),
    }
}

/// Validate one candidate request value
pub fn parse_request(value: Value) -> ParsedItem {
    match value {
        Value::Object(map) if !map.is_empty() => parse_object(map),
        _ => Err(JsonRpcError::invalid_request(RequestId::Null)),
    }
}

fn parse_object(mut obj: Map<String, Value>) -> ParsedItem {
    let invalid = || JsonRpcError::invalid_request(RequestId::Null);

    match obj.get("jsonrpc") {
        Some(Value::String(version)) if version == crate::JSONRPC_VERSION => {}
        _ => return Err(invalid()),
    }

    let method = match obj.remove("method") {
        Some(Value::String(method)) if !method.is_empty() => method,
        _ => return Err(invalid()),
    };

    let params = match obj.remove("params") {
        None => None,
        Some(value) => Some(RequestParams::from_value(value).ok_or_else(invalid)?),
    };

    // Presence of the field, not its value, decides notification status
    let id = match obj.get("id") {
        None => None,
        Some(value) => Some(RequestId::from_value(value).ok_or_else(invalid)?),
    };

    Ok(JsonRpcRequest {
        version: JsonRpcVersion::V2_0,
        method,
        params,
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(raw: &str) -> Result<ParsedPayload, JsonRpcError> {
        parse_payload(raw.as_bytes())
    }

    fn single(raw: &str) -> ParsedItem {
        match parse(raw).unwrap() {
            ParsedPayload::Single(item) => item,
            other => panic!("expected single payload, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_valid_request() {
        let request =
            single(r#"{"jsonrpc": "2.0", "method": "calc.add", "params": [1, 2], "id": 1}"#)
                .unwrap();

        assert_eq!(request.method, "calc.add");
        assert_eq!(request.id, Some(RequestId::from(1)));
        assert_eq!(request.params, Some(RequestParams::Array(vec![json!(1), json!(2)])));
    }

    #[test]
    fn test_parse_notification() {
        let request = single(r#"{"jsonrpc": "2.0", "method": "log.write"}"#).unwrap();
        assert!(request.is_notification());
        assert!(request.params.is_none());
    }

    #[test]
    fn test_null_id_is_a_request() {
        let request = single(r#"{"jsonrpc": "2.0", "method": "a.b", "id": null}"#).unwrap();
        assert_eq!(request.id, Some(RequestId::Null));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse(r#"{"jsonrpc": "2.0", "method": "test""#).unwrap_err();
        assert_eq!(err.error.code, -32700);
        assert!(err.id.is_null());

        assert_eq!(parse("not json").unwrap_err().error.code, -32700);
        assert_eq!(parse("").unwrap_err().error.code, -32700);
    }

    #[test]
    fn test_top_level_shapes() {
        for raw in ["[]", "{}", "null", "1", "\"text\"", "true"] {
            let err = parse(raw).unwrap_err();
            assert_eq!(err.error.code, -32600, "payload {raw}");
        }
    }

    #[test]
    fn test_parse_invalid_version() {
        for raw in [
            r#"{"jsonrpc": "1.0", "method": "a.b", "id": 1}"#,
            r#"{"jsonrpc": 2.0, "method": "a.b", "id": 1}"#,
            r#"{"method": "a.b", "id": 1}"#,
        ] {
            let err = single(raw).unwrap_err();
            assert_eq!(err.error.code, -32600);
            assert!(err.id.is_null());
        }
    }

    #[test]
    fn test_parse_invalid_method() {
        for raw in [
            r#"{"jsonrpc": "2.0", "id": 1}"#,
            r#"{"jsonrpc": "2.0", "method": "", "id": 1}"#,
            r#"{"jsonrpc": "2.0", "method": 5, "id": 1}"#,
        ] {
            assert_eq!(single(raw).unwrap_err().error.code, -32600);
        }
    }

    #[test]
    fn test_method_format_not_checked_here() {
        assert!(single(r#"{"jsonrpc": "2.0", "method": "abc", "id": 1}"#).is_ok());
        assert!(single(r#"{"jsonrpc": "2.0", "method": "a.b.c", "id": 1}"#).is_ok());
    }

    #[test]
    fn test_parse_invalid_params_and_id() {
        assert!(single(r#"{"jsonrpc": "2.0", "method": "a.b", "params": "x", "id": 1}"#).is_err());
        assert!(single(r#"{"jsonrpc": "2.0", "method": "a.b", "params": null, "id": 1}"#).is_err());
        assert!(single(r#"{"jsonrpc": "2.0", "method": "a.b", "id": [1]}"#).is_err());
        assert!(single(r#"{"jsonrpc": "2.0", "method": "a.b", "id": true}"#).is_err());
    }

    #[test]
    fn test_batch_elements_validated_independently() {
        let payload = parse(
            r#"[
                {"jsonrpc": "2.0", "method": "calc.add", "params": [1, 1], "id": 1},
                1,
                {},
                {"jsonrpc": "2.0", "method": "calc.add"}
            ]"#,
        )
        .unwrap();

        let ParsedPayload::Batch(items) = payload else {
            panic!("expected batch");
        };
        assert_eq!(items.len(), 4);
        assert!(items[0].is_ok());
        assert_eq!(items[1].as_ref().unwrap_err().error.code, -32600);
        assert_eq!(items[2].as_ref().unwrap_err().error.code, -32600);
        assert!(items[3].as_ref().unwrap().is_notification());
    }
}
