use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::subscriber::handler::SubscriberHandler;
use crate::transport::message::{RpcResponse, SubscriberRequest};
use crate::transport::rpc::serve_connection;
use crate::utils::error::ServerError;

/// Acknowledgement returned for every callback.
pub const ACK: &str = "OK";

/// Bind `addr` and answer broker callbacks with `handler`.
pub async fn start_subscriber_endpoint(
    addr: &str,
    handler: Arc<dyn SubscriberHandler>,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    info!("Subscriber endpoint listening on ws://{addr}");
    serve_subscriber(listener, handler).await;
    Ok(())
}

pub async fn serve_subscriber(listener: TcpListener, handler: Arc<dyn SubscriberHandler>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Failed to accept callback connection: {e}");
                continue;
            }
        };

        let handler = Arc::clone(&handler);
        let session = format!("callback-{peer}");

        tokio::spawn(async move {
            serve_connection(stream, &session, |request: SubscriberRequest| {
                let handler = Arc::clone(&handler);
                async move { handle_callback(handler.as_ref(), request).await }
            })
            .await;
        });
    }
}

async fn handle_callback(handler: &dyn SubscriberHandler, request: SubscriberRequest) -> RpcResponse {
    match request {
        SubscriberRequest::SendMessage { topic, message } => {
            debug!("Message received on {topic}");
            handler.on_message(&topic, message).await;
        }
        SubscriberRequest::SendDeadLetters { dead_letters } => {
            debug!("Received {} dead letters", dead_letters.len());
            handler.on_dead_letters(dead_letters).await;
        }
    }
    RpcResponse::reply(ACK)
}
