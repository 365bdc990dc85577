use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Protocol version literal carried through every request unchanged.
pub const PROTOCOL_VERSION: &str = "2.0";

/// Reserved error codes, matching the JSON-RPC conventions the wallet
/// ecosystem uses (eth-rpc-errors numbering).
pub mod codes {
    pub const PROVIDER_NOT_INITIALIZED: i64 = -32003;
    pub const METHOD_NOT_SUPPORTED: i64 = -32004;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Monotonic request id generator. Ids must be unique within the lifetime of
/// one engine instance; a process-wide counter satisfies that trivially.
pub fn next_request_id() -> u64 {
    NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: u64,
    pub jsonrpc: String,
}

impl Request {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
            id: next_request_id(),
            jsonrpc: PROTOCOL_VERSION.to_owned(),
        }
    }

    /// Builds a request under a caller-supplied id. Remote peers assign their
    /// own ids, which the answer must echo.
    pub fn with_id(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
            id,
            jsonrpc: PROTOCOL_VERSION.to_owned(),
        }
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Fetches a named parameter, failing with an invalid-params error naming
    /// the missing key.
    pub fn required_param(&self, key: &str) -> Result<&Value, RpcError> {
        self.param(key).ok_or_else(|| RpcError::invalid_params(key))
    }
}

/// Per-request failure carried inside a `Response`. Never thrown across the
/// engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message} (code {code})")]
pub struct RpcError {
    pub message: String,
    pub code: i64,
}

impl RpcError {
    pub fn new(message: impl Into<String>, code: i64) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            format!("the method {method} does not exist / is not available"),
            codes::METHOD_NOT_FOUND,
        )
    }

    pub fn method_not_supported() -> Self {
        Self::new("method not supported", codes::METHOD_NOT_SUPPORTED)
    }

    pub fn invalid_params(param: &str) -> Self {
        Self::new(
            format!("missing or invalid param: {param}"),
            codes::INVALID_PARAMS,
        )
    }

    pub fn provider_not_initialized() -> Self {
        Self::new("provider is not initialized", codes::PROVIDER_NOT_INITIALIZED)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(message, codes::INTERNAL_ERROR)
    }
}

/// Terminal outcome of a dispatched request. Exactly one of result/error, by
/// construction. Externally tagged so the wire shape is the usual
/// `{"result": ...}` / `{"error": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(RpcError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Response {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            id,
            outcome: Outcome::Result(result),
        }
    }

    pub fn failure(id: u64, error: RpcError) -> Self {
        Self {
            id,
            outcome: Outcome::Error(error),
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&RpcError> {
        match &self.outcome {
            Outcome::Result(_) => None,
            Outcome::Error(error) => Some(error),
        }
    }

    pub fn into_result(self) -> Result<Value, RpcError> {
        match self.outcome {
            Outcome::Result(value) => Ok(value),
            Outcome::Error(error) => Err(error),
        }
    }
}
