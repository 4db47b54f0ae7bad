use serde::{Deserialize, Serialize};

use crate::broker::DeadLetter;

/// Requests served by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum BrokerRequest {
    #[serde(rename = "connect")]
    Connect {
        #[serde(rename = "clientAddress")]
        client_address: String,
    },

    #[serde(rename = "subscribe")]
    Subscribe {
        topic: String,
        #[serde(rename = "clientAddress")]
        client_address: String,
    },

    #[serde(rename = "unsubscribe")]
    Unsubscribe {
        topic: String,
        #[serde(rename = "clientAddress")]
        client_address: String,
    },

    #[serde(rename = "new_topic")]
    NewTopic { topic: String },

    #[serde(rename = "publish")]
    Publish { topic: String, message: String },
}

impl BrokerRequest {
    pub fn method(&self) -> &'static str {
        match self {
            BrokerRequest::Connect { .. } => "Connect",
            BrokerRequest::Subscribe { .. } => "Subscribe",
            BrokerRequest::Unsubscribe { .. } => "Unsubscribe",
            BrokerRequest::NewTopic { .. } => "NewTopic",
            BrokerRequest::Publish { .. } => "Publish",
        }
    }
}

/// Callbacks the broker makes into a subscriber endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum SubscriberRequest {
    #[serde(rename = "send_message")]
    SendMessage {
        #[serde(default)]
        topic: String,
        message: String,
    },

    #[serde(rename = "send_dead_letters")]
    SendDeadLetters {
        #[serde(rename = "deadLetters")]
        dead_letters: Vec<DeadLetter>,
    },
}

/// The single reply frame sent back for every request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum RpcResponse {
    #[serde(rename = "reply")]
    Reply { reply: String },

    #[serde(rename = "error")]
    Error { message: String },
}

impl RpcResponse {
    pub fn reply(reply: impl Into<String>) -> Self {
        RpcResponse::Reply {
            reply: reply.into(),
        }
    }
}
