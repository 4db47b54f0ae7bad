//! The `client` module is the caller side of the broker's RPC surface.
//!
//! Publishers (the file-distribution side) and subscribers (node agents) use
//! [`BrokerClient`] to invoke `Connect`, `Subscribe`, `Unsubscribe`,
//! `NewTopic` and `Publish`.

pub mod broker_client;
pub use broker_client::BrokerClient;
