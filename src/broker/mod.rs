//! The broker core: topics, liveness, dead letters and fan-out delivery.
//!
//! Everything lives in process memory and is owned by one [`Broker`] value.

pub mod connections;
pub mod dead_letter;
pub mod delivery;
pub mod engine;
pub mod message;
pub mod status;
pub mod topic;

pub use delivery::{DeliveryOutcome, SubscriberTransport};
pub use engine::Broker;
pub use message::DeadLetter;
pub use status::Status;
