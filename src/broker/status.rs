//! Reply statuses
//!
//! Every broker operation answers with a `Status`. The RPC layer sends its
//! string form as the reply, and `BrokerClient` parses it back.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Connected,
    AlreadyConnected,
    Subscribed,
    Unsubscribed,
    Created,
    Published,
    NotConnected,
    NoTopic,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Connected => "CONNECTED",
            Status::AlreadyConnected => "ALREADY_CONNECTED",
            Status::Subscribed => "SUBSCRIBED",
            Status::Unsubscribed => "UNSUBSCRIBED",
            Status::Created => "CREATED",
            Status::Published => "PUBLISHED",
            Status::NotConnected => "ERR: NOT_CONNECTED",
            Status::NoTopic => "ERR: NO_TOPIC",
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Status::NotConnected | Status::NoTopic)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a reply string is not one of the known statuses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s {
            "CONNECTED" => Status::Connected,
            "ALREADY_CONNECTED" => Status::AlreadyConnected,
            "SUBSCRIBED" => Status::Subscribed,
            "UNSUBSCRIBED" => Status::Unsubscribed,
            "CREATED" => Status::Created,
            "PUBLISHED" => Status::Published,
            "ERR: NOT_CONNECTED" => Status::NotConnected,
            "ERR: NO_TOPIC" => Status::NoTopic,
            other => return Err(UnknownStatus(other.to_string())),
        };
        Ok(status)
    }
}
