//! Error types for the RPC transport, the broker server and the caller-side
//! client.
//!
//! Broker operations themselves never fail: they answer with a
//! [`Status`](crate::broker::Status). Errors only exist where bytes cross a
//! socket.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single request/response exchange with a remote endpoint.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("invalid payload: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("remote endpoint rejected the request: {0}")]
    Remote(String),

    #[error("connection closed before a reply was received")]
    ConnectionClosed,

    #[error("call to {address} timed out after {timeout:?}")]
    Timeout { address: String, timeout: Duration },

    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}

/// Failure to start one of the RPC servers.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
