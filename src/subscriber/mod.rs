//! The subscriber side of the protocol.
//!
//! A subscriber is any process that registers an address with the broker and
//! answers the two callbacks on it. This module provides that endpoint plus a
//! channel-backed handler, which is what the CLI and the tests use.

pub mod endpoint;
pub mod handler;

pub use endpoint::{ACK, serve_subscriber, start_subscriber_endpoint};
pub use handler::{ChannelHandler, Delivery, SubscriberHandler};

#[cfg(test)]
mod tests;
