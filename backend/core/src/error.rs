use serde_json::Value;
use thiserror::Error;

/// Failure talking to the messaging platform.
///
/// The three kinds are kept apart so callers can tell a dead network from a
/// rejected request from a response they could not make sense of.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error calling {method}: {message}")]
    Network { method: String, message: String },

    #[error("API error calling {method}: {description} (http_code={http_code}, error_code={error_code:?})")]
    Api {
        method: String,
        description: String,
        http_code: u16,
        error_code: Option<i64>,
        parameters: Option<Value>,
    },

    #[error("malformed response from {method}: {message}")]
    Serialization { method: String, message: String },
}

impl TransportError {
    /// The API method the failed call was made to.
    pub fn method(&self) -> &str {
        match self {
            Self::Network { method, .. }
            | Self::Api { method, .. }
            | Self::Serialization { method, .. } => method,
        }
    }
}

/// Errors surfaced by the broadcast dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatcher inlet is closed")]
    InletClosed,

    #[error("dispatcher loop is already running")]
    AlreadyRunning,
}
