use crate::broker::Status;
use crate::transport::message::BrokerRequest;
use crate::transport::rpc;
use crate::utils::error::RpcError;

/// Calls the broker's RPC methods. Every call uses a fresh session.
#[derive(Debug, Clone)]
pub struct BrokerClient {
    /// Broker address as `host:port`.
    address: String,
}

impl BrokerClient {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Register `client_address` as live; the broker flushes its dead letters to it.
    pub async fn connect(&self, client_address: &str) -> Result<Status, RpcError> {
        self.request(BrokerRequest::Connect {
            client_address: client_address.to_string(),
        })
        .await
    }

    pub async fn subscribe(&self, topic: &str, client_address: &str) -> Result<Status, RpcError> {
        self.request(BrokerRequest::Subscribe {
            topic: topic.to_string(),
            client_address: client_address.to_string(),
        })
        .await
    }

    pub async fn unsubscribe(&self, topic: &str, client_address: &str) -> Result<Status, RpcError> {
        self.request(BrokerRequest::Unsubscribe {
            topic: topic.to_string(),
            client_address: client_address.to_string(),
        })
        .await
    }

    pub async fn new_topic(&self, topic: &str) -> Result<Status, RpcError> {
        self.request(BrokerRequest::NewTopic {
            topic: topic.to_string(),
        })
        .await
    }

    pub async fn publish(&self, topic: &str, message: &str) -> Result<Status, RpcError> {
        self.request(BrokerRequest::Publish {
            topic: topic.to_string(),
            message: message.to_string(),
        })
        .await
    }

    async fn request(&self, request: BrokerRequest) -> Result<Status, RpcError> {
        let reply = rpc::call(&self.address, &request).await?;
        reply
            .parse::<Status>()
            .map_err(|_| RpcError::UnexpectedReply(reply))
    }
}
