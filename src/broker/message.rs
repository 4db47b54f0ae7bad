//! Dead-letter entries
//!
//! A `DeadLetter` is a (topic, message) pair that could not be delivered to
//! one subscriber. It is the element type of the per-subscriber queues in
//! `DeadLetterStore` and travels unchanged inside a `send_dead_letters`
//! callback.
//!
//! - `topic`: the topic the message was published on
//! - `message`: the published payload, verbatim
//! - `timestamp`: milliseconds since UNIX epoch; set when the broker queued it

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub topic: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: i64,
}

impl DeadLetter {
    pub fn new(topic: &str, message: &str) -> Self {
        Self {
            topic: topic.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}
