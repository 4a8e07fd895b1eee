use crate::RpcMethod;

use alloy_transport::TransportError;

/// A chain read that failed after exhausting its retries.
#[derive(Debug, thiserror::Error)]
#[error("could not call {method}: {source}")]
pub struct NetworkError {
    /// The RPC method that failed.
    pub method: RpcMethod,
    /// The failure of the last attempt.
    #[source]
    pub source: CallFailure,
}

impl NetworkError {
    /// Returns a new [`NetworkError`].
    pub const fn new(method: RpcMethod, source: CallFailure) -> Self {
        Self { method, source }
    }
}

/// The failure of a single call attempt.
#[derive(Debug, thiserror::Error)]
pub enum CallFailure {
    /// The transport returned an error.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The node returned a null result.
    #[error("null response")]
    NullResponse,
    /// The node returned a result that could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
