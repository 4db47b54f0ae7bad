//! The `transport` module is responsible for network communication.
//!
//! It defines the JSON wire protocol, a small request/response layer on top
//! of WebSockets shared by every endpoint, the broker's RPC server and the
//! outbound callbacks the broker makes into subscribers.

pub mod callback;
pub mod message;
pub mod rpc;
pub mod websocket;

pub use callback::WebSocketCallbacks;
pub use message::{BrokerRequest, RpcResponse, SubscriberRequest};
pub use websocket::{serve, start_rpc_server};

#[cfg(test)]
mod tests;
