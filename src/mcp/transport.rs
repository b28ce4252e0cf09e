//! JSON-RPC 2.0 envelope types shared by the stdio and HTTP front-ends.
//!
//! Provides serialization and deserialization of the request/response
//! envelope, the error codes the server emits, and the two-step decoding
//! (text to JSON, JSON to request) that lets each front-end tell a parse
//! error from an invalid request.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::CatalogError;

/// The only protocol version accepted or produced.
pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC 2.0 request or notification received from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version; must be `"2.0"`.
    pub jsonrpc: String,
    /// Request identifier. `None` only when the member is absent, which
    /// makes the message a notification. An explicit `null` is kept as
    /// `Some(Value::Null)`.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Value>,
    /// The RPC method name.
    pub method: String,
    /// Optional parameters for the method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Returns `true` when the message carries no id and expects no reply.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A JSON-RPC 2.0 response sent back to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version; always `"2.0"`.
    pub jsonrpc: String,
    /// The request identifier that this response corresponds to.
    pub id: Value,
    /// The result on success; absent on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The error on failure; absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Creates a successful JSON-RPC response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Creates an error JSON-RPC response.
    pub fn error(id: Value, code: ErrorCode, message: String) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code: code.as_i32(),
                message,
                data: None,
            }),
        }
    }

    /// Creates an error response from a handler failure.
    pub fn from_error(id: Value, err: &CatalogError) -> Self {
        let code = ErrorCode::for_error(err);
        let message = match code {
            ErrorCode::ServerError => format!("An unexpected error occurred: {}", err),
            _ => err.to_string(),
        };
        Self::error(id, code, message)
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Error codes emitted by the server: the reserved JSON-RPC 2.0 ones it
/// uses, plus two application codes for cataloging preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid JSON was received.
    ParseError,
    /// The request is not a valid JSON-RPC request.
    InvalidRequest,
    /// The requested method does not exist.
    MethodNotFound,
    /// Invalid method parameters.
    InvalidParams,
    /// Any failure not covered by a more specific code.
    ServerError,
    /// The catalog output path already exists.
    OutputFileExists,
    /// The directory to catalog does not exist.
    TargetNotFound,
}

impl ErrorCode {
    /// Returns the numeric error code.
    pub fn as_i32(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::ServerError => -32000,
            Self::OutputFileExists => 1001,
            Self::TargetNotFound => 1002,
        }
    }

    /// Maps a crate error onto the code reported to JSON-RPC clients.
    pub fn for_error(err: &CatalogError) -> Self {
        match err {
            CatalogError::AlreadyExists { .. } => Self::OutputFileExists,
            CatalogError::NotFound { .. } => Self::TargetNotFound,
            CatalogError::InvalidParams { .. } => Self::InvalidParams,
            CatalogError::InvalidRequestFormat { .. } => Self::InvalidRequest,
            _ => Self::ServerError,
        }
    }
}

/// Why an incoming frame could not be turned into a request.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The frame is not JSON.
    Parse(String),
    /// The frame is JSON but not a request object. `id` is echoed when it
    /// could be recovered, `null` otherwise.
    InvalidRequest { id: Value, message: String },
}

impl DecodeError {
    /// Builds the error response owed to the client.
    pub fn into_response(self) -> JsonRpcResponse {
        match self {
            Self::Parse(message) => JsonRpcResponse::error(
                Value::Null,
                ErrorCode::ParseError,
                format!("Parse error: {}", message),
            ),
            Self::InvalidRequest { id, message } => JsonRpcResponse::error(
                id,
                ErrorCode::InvalidRequest,
                format!("Invalid Request: {}", message),
            ),
        }
    }
}

/// Decodes a text frame into a request.
pub fn decode_request(text: &str) -> Result<JsonRpcRequest, DecodeError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| DecodeError::Parse(e.to_string()))?;
    decode_value(value)
}

/// Decodes an already-parsed JSON value into a request.
pub fn decode_value(value: Value) -> Result<JsonRpcRequest, DecodeError> {
    let id = value.get("id").cloned().unwrap_or(Value::Null);

    if !value.is_object() {
        return Err(DecodeError::InvalidRequest {
            id,
            message: "expected a JSON object".to_string(),
        });
    }

    let request: JsonRpcRequest =
        serde_json::from_value(value).map_err(|e| DecodeError::InvalidRequest {
            id: id.clone(),
            message: e.to_string(),
        })?;

    if request.jsonrpc != JSONRPC_VERSION {
        return Err(DecodeError::InvalidRequest {
            id,
            message: format!("unsupported jsonrpc version '{}'", request.jsonrpc),
        });
    }

    Ok(request)
}
