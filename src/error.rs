//! Error types for calls against the Hive JSON-RPC API

use thiserror::Error;

/// Failure of a single JSON-RPC round trip or of a lookup built on one
#[derive(Error, Debug)]
pub enum RpcError {
    /// Connection, TLS or timeout failure from the HTTP client
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Node answered with a non-success HTTP status
    #[error("Hive API error {status}: {body}")]
    Http { status: u16, body: String },

    /// Node answered with a JSON-RPC `error` member
    #[error("RPC error {code} from {method}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    /// Response carried neither `result` nor `error`
    #[error("Missing result in response to {method}")]
    MissingResult { method: String },

    /// `result` was present but did not have the expected shape
    #[error("Failed to decode {method} response: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Not found: {0}")]
    NotFound(String),
}

impl RpcError {
    /// True for errors caused by the caller asking for something that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, RpcError::NotFound(_))
    }
}
