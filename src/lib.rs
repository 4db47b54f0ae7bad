//! # rpcsub
//!
//! `rpcsub` is an in-memory publish/subscribe broker whose subscribers are
//! addressed by the network address they listen on. The broker pushes every
//! published message to each subscriber's endpoint, and whatever cannot be
//! delivered is kept as a dead letter until that subscriber connects again.
//!
//! ## Core Modules
//!
//! - `broker`: topics, liveness, dead-letter queues and fan-out delivery.
//! - `transport`: the JSON-over-WebSocket request/response protocol, the
//!   broker's RPC server and the outbound subscriber callbacks.
//! - `client`: caller-side access to the broker's five RPC methods.
//! - `subscriber`: an endpoint implementing the subscriber callback contract.
//! - `config`: layered configuration loading.
//! - `utils`: error types and logging setup.

pub mod broker;
pub mod client;
pub mod config;
pub mod subscriber;
pub mod transport;
pub mod utils;
