// src/rpc.rs
//! JSON-RPC 2.0 wire types and the encode/decode steps of a call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DecodeError, Error, Result};

pub const JSONRPC_VERSION: &str = "2.0";

/// Every request carries this id. There is only ever one request in flight
/// per call, so it is never used to correlate responses.
pub const REQUEST_ID: u64 = 1;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<String>,
    pub id: u64,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            method: method.into(),
            params,
            id: REQUEST_ID,
        }
    }

    /// Serializes the envelope to the exact bytes sent as the POST body.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Error::Encode)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RpcResponse {
    pub result: Value,
    pub error: Value,
}

impl RpcResponse {
    /// Parses a response body. Both `result` and `error` must be present,
    /// though either may be null.
    pub fn from_slice(body: &[u8]) -> std::result::Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(body).map_err(DecodeError::Json)?;
        let mut object = match value {
            Value::Object(map) => map,
            other => return Err(DecodeError::NotAnObject(json_kind(&other))),
        };
        let result = object
            .remove("result")
            .ok_or(DecodeError::MissingField("result"))?;
        let error = object
            .remove("error")
            .ok_or(DecodeError::MissingField("error"))?;
        Ok(Self { result, error })
    }

    /// Splits the response into the call outcome.
    ///
    /// A null `error` means success, and `result` is returned as is even when
    /// it is null itself.
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Value::Null => Ok(self.result),
            error @ Value::Object(_) => {
                let error: RpcError =
                    serde_json::from_value(error).map_err(DecodeError::MalformedErrorObject)?;
                Err(error.into())
            }
            other => Err(DecodeError::ErrorNotAnObject(json_kind(&other)).into()),
        }
    }
}

/// Error object returned by the daemon.
#[derive(thiserror::Error, Deserialize, Debug, Clone, PartialEq, Eq)]
#[error("RPC error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(body: &str) -> Result<Value> {
        RpcResponse::from_slice(body.as_bytes())?.into_result()
    }

    #[test]
    fn test_request_envelope() {
        let request = RpcRequest::new("getinfo", vec!["a".into(), "b".into()]);
        let body = String::from_utf8(request.to_vec().unwrap()).unwrap();
        assert_eq!(
            body,
            r#"{"jsonrpc":"2.0","method":"getinfo","params":["a","b"],"id":1}"#
        );
    }

    #[test]
    fn test_request_params_verbatim() {
        let params: Vec<String> = ["b", "a", "b", ""].iter().map(|s| s.to_string()).collect();
        let request = RpcRequest::new("sendtoaddress", params.clone());
        let value: Value = serde_json::from_slice(&request.to_vec().unwrap()).unwrap();
        assert_eq!(value["params"], json!(params));
        assert_eq!(value["id"], json!(1));
        assert_eq!(value["jsonrpc"], json!("2.0"));
    }

    #[test]
    fn test_request_no_params() {
        let request = RpcRequest::new("getblockcount", Vec::new());
        let value: Value = serde_json::from_slice(&request.to_vec().unwrap()).unwrap();
        assert_eq!(value["params"], json!([]));
    }

    #[test]
    fn test_success_result() {
        assert_eq!(decode(r#"{"result": 42, "error": null}"#).unwrap(), json!(42));
    }

    #[test]
    fn test_null_result_is_success() {
        assert_eq!(
            decode(r#"{"result": null, "error": null}"#).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_extra_fields_ignored() {
        let value = decode(r#"{"result": {"blocks": 10}, "error": null, "id": 1}"#).unwrap();
        assert_eq!(value, json!({"blocks": 10}));
    }

    #[test]
    fn test_rpc_error() {
        let err = decode(r#"{"result": null, "error": {"code": -8, "message": "Invalid parameter"}}"#)
            .unwrap_err();
        match err {
            Error::Rpc(rpc) => assert_eq!(rpc, RpcError::new(-8, "Invalid parameter")),
            other => panic!("expected RpcError, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_json() {
        let err = decode(r#"{"result": 42, "err"#).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::Json(_))));
    }

    #[test]
    fn test_missing_error_key() {
        let err = decode(r#"{"result": 42}"#).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::MissingField("error"))));
    }

    #[test]
    fn test_missing_result_key() {
        let err = decode(r#"{"error": null}"#).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::MissingField("result"))));
    }

    #[test]
    fn test_top_level_array() {
        let err = decode(r#"[{"result": 42, "error": null}]"#).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::NotAnObject("an array"))));
    }

    #[test]
    fn test_error_not_an_object() {
        let err = decode(r#"{"result": null, "error": "boom"}"#).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::ErrorNotAnObject("a string"))));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_error_object_without_code() {
        let err = decode(r#"{"result": null, "error": {"message": "no code"}}"#).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::MalformedErrorObject(_))));
    }

    #[test]
    fn test_error_object_with_string_code() {
        let err = decode(r#"{"result": null, "error": {"code": "-8", "message": "x"}}"#).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::MalformedErrorObject(_))));
    }
}
