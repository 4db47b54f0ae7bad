use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::broker::Broker;
use crate::transport::message::{BrokerRequest, RpcResponse};
use crate::transport::rpc::serve_connection;
use crate::utils::error::ServerError;

/// Bind `addr` and serve the broker's RPC methods until the task is dropped.
pub async fn start_rpc_server(addr: &str, broker: Arc<Broker>) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    info!("Broker RPC server listening on ws://{addr}");
    serve(listener, broker).await;
    Ok(())
}

/// Accept loop over an already bound listener. Every connection gets its own task.
pub async fn serve(listener: TcpListener, broker: Arc<Broker>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Failed to accept connection: {e}");
                continue;
            }
        };

        let broker = Arc::clone(&broker);
        let session = format!("session-{}", uuid::Uuid::new_v4());

        tokio::spawn(async move {
            debug!("{session} opened by {peer}");
            serve_connection(stream, &session, |request: BrokerRequest| {
                let broker = Arc::clone(&broker);
                async move { handle_request(&broker, request).await }
            })
            .await;
            debug!("{session} closed");
        });
    }
}

/// Run one request against the broker and wrap its status as the reply.
pub async fn handle_request(broker: &Broker, request: BrokerRequest) -> RpcResponse {
    let method = request.method();
    let status = match request {
        BrokerRequest::Connect { client_address } => broker.connect(&client_address).await,
        BrokerRequest::Subscribe {
            topic,
            client_address,
        } => broker.subscribe(&topic, &client_address),
        BrokerRequest::Unsubscribe {
            topic,
            client_address,
        } => broker.unsubscribe(&topic, &client_address),
        BrokerRequest::NewTopic { topic } => broker.new_topic(&topic),
        BrokerRequest::Publish { topic, message } => broker.publish(&topic, &message).await,
    };

    debug!("{method} -> {status}");
    RpcResponse::reply(status.to_string())
}
