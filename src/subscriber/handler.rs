use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::warn;

use crate::broker::DeadLetter;

/// What a subscriber does with the broker's callbacks.
#[async_trait]
pub trait SubscriberHandler: Send + Sync + 'static {
    async fn on_message(&self, topic: &str, message: String);

    /// Dead letters arrive oldest first.
    async fn on_dead_letters(&self, dead_letters: Vec<DeadLetter>);
}

/// A callback as received by a subscriber endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Live { topic: String, message: String },
    DeadLetters(Vec<DeadLetter>),
}

/// Forwards every callback into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelHandler {
    sender: mpsc::UnboundedSender<Delivery>,
}

impl ChannelHandler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn forward(&self, delivery: Delivery) {
        if self.sender.send(delivery).is_err() {
            warn!("Delivery dropped: receiver is gone");
        }
    }
}

#[async_trait]
impl SubscriberHandler for ChannelHandler {
    async fn on_message(&self, topic: &str, message: String) {
        self.forward(Delivery::Live {
            topic: topic.to_string(),
            message,
        });
    }

    async fn on_dead_letters(&self, dead_letters: Vec<DeadLetter>) {
        self.forward(Delivery::DeadLetters(dead_letters));
    }
}
