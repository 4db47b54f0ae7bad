//! Outbound callbacks into subscribers over WebSocket.
//!
//! Every callback dials the subscriber's registered address afresh, so a
//! dial failure is what tells the broker a subscriber went away.

use async_trait::async_trait;

use crate::broker::{DeadLetter, SubscriberTransport};
use crate::transport::message::SubscriberRequest;
use crate::transport::rpc;
use crate::utils::error::RpcError;

#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketCallbacks;

#[async_trait]
impl SubscriberTransport for WebSocketCallbacks {
    async fn send_message(
        &self,
        address: &str,
        topic: &str,
        message: &str,
    ) -> Result<String, RpcError> {
        let request = SubscriberRequest::SendMessage {
            topic: topic.to_string(),
            message: message.to_string(),
        };
        rpc::call(address, &request).await
    }

    async fn send_dead_letters(
        &self,
        address: &str,
        dead_letters: &[DeadLetter],
    ) -> Result<String, RpcError> {
        let request = SubscriberRequest::SendDeadLetters {
            dead_letters: dead_letters.to_vec(),
        };
        rpc::call(address, &request).await
    }
}
