use std::sync::Arc;

use tokio::net::TcpListener;

use super::{ACK, ChannelHandler, Delivery, serve_subscriber, start_subscriber_endpoint};
use crate::broker::{DeadLetter, SubscriberTransport};
use crate::transport::WebSocketCallbacks;
use crate::utils::error::ServerError;

async fn spawn_endpoint() -> (String, tokio::sync::mpsc::UnboundedReceiver<Delivery>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (handler, deliveries) = ChannelHandler::new();
    tokio::spawn(serve_subscriber(listener, Arc::new(handler)));
    (addr, deliveries)
}

#[tokio::test]
async fn test_endpoint_acknowledges_live_message() {
    let (addr, mut deliveries) = spawn_endpoint().await;

    let ack = WebSocketCallbacks
        .send_message(&addr, "region-eu", "payload-1")
        .await
        .unwrap();

    assert_eq!(ack, ACK);
    assert_eq!(
        deliveries.recv().await.unwrap(),
        Delivery::Live {
            topic: "region-eu".to_string(),
            message: "payload-1".to_string(),
        }
    );
}

#[tokio::test]
async fn test_endpoint_receives_dead_letters_in_order() {
    let (addr, mut deliveries) = spawn_endpoint().await;
    let batch = vec![
        DeadLetter::new("region-eu", "payload-1"),
        DeadLetter::new("region-us", "payload-2"),
        DeadLetter::new("region-eu", "payload-3"),
    ];

    let ack = WebSocketCallbacks
        .send_dead_letters(&addr, &batch)
        .await
        .unwrap();

    assert_eq!(ack, ACK);
    assert_eq!(deliveries.recv().await.unwrap(), Delivery::DeadLetters(batch));
}

#[tokio::test]
async fn test_endpoint_reports_bind_failure() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap().to_string();
    let (handler, _deliveries) = ChannelHandler::new();

    let result = start_subscriber_endpoint(&addr, Arc::new(handler)).await;
    assert!(matches!(result, Err(ServerError::Bind { .. })));
}
