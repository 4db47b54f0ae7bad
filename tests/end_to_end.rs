//! Broker, publisher and subscribers talking over real sockets.

use std::sync::Arc;
use std::time::Duration;

use rpcsub::broker::{Broker, Status};
use rpcsub::client::BrokerClient;
use rpcsub::config::BrokerSettings;
use rpcsub::subscriber::{ChannelHandler, Delivery, serve_subscriber};
use rpcsub::transport::{WebSocketCallbacks, serve};
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

async fn spawn_broker() -> (BrokerClient, Arc<Broker>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let settings = BrokerSettings {
        delivery_timeout_ms: 2000,
        ..BrokerSettings::default()
    };
    let broker = Arc::new(Broker::with_settings(&settings, Arc::new(WebSocketCallbacks)));
    tokio::spawn(serve(listener, broker.clone()));
    (BrokerClient::new(addr), broker)
}

async fn spawn_subscriber(
    addr: &str,
) -> (JoinHandle<()>, UnboundedReceiver<Delivery>) {
    let listener = TcpListener::bind(addr).await.unwrap();
    let (handler, deliveries) = ChannelHandler::new();
    let endpoint = tokio::spawn(serve_subscriber(listener, Arc::new(handler)));
    (endpoint, deliveries)
}

async fn free_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().to_string()
}

async fn next_delivery(deliveries: &mut UnboundedReceiver<Delivery>) -> Delivery {
    tokio::time::timeout(Duration::from_secs(5), deliveries.recv())
        .await
        .expect("timed out waiting for a delivery")
        .expect("delivery channel closed")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn publish_reaches_connected_subscriber() {
    let (client, _broker) = spawn_broker().await;
    let me = free_address().await;
    let (_endpoint, mut deliveries) = spawn_subscriber(&me).await;

    assert_eq!(client.new_topic("region-eu").await.unwrap(), Status::Created);
    assert_eq!(client.connect(&me).await.unwrap(), Status::Connected);
    assert_eq!(
        client.subscribe("region-eu", &me).await.unwrap(),
        Status::Subscribed
    );

    assert_eq!(
        client.publish("region-eu", "payload-1").await.unwrap(),
        Status::Published
    );

    assert_eq!(
        next_delivery(&mut deliveries).await,
        Delivery::Live {
            topic: "region-eu".to_string(),
            message: "payload-1".to_string(),
        }
    );
    assert!(deliveries.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn missed_messages_arrive_after_reconnect() {
    let (client, broker) = spawn_broker().await;
    let me = free_address().await;
    let (endpoint, _deliveries) = spawn_subscriber(&me).await;

    client.new_topic("region-eu").await.unwrap();
    client.connect(&me).await.unwrap();
    client.subscribe("region-eu", &me).await.unwrap();

    // the subscriber goes away
    endpoint.abort();
    let _ = endpoint.await;

    assert_eq!(
        client.publish("region-eu", "payload-1").await.unwrap(),
        Status::Published
    );
    assert_eq!(
        client.publish("region-eu", "payload-2").await.unwrap(),
        Status::Published
    );
    assert!(!broker.is_connected(&me));
    assert_eq!(broker.pending_dead_letters(&me).len(), 2);

    // and comes back on the same address
    let (_endpoint, mut deliveries) = spawn_subscriber(&me).await;
    assert_eq!(client.connect(&me).await.unwrap(), Status::Connected);

    match next_delivery(&mut deliveries).await {
        Delivery::DeadLetters(letters) => {
            let messages: Vec<_> = letters
                .iter()
                .map(|letter| (letter.topic.as_str(), letter.message.as_str()))
                .collect();
            assert_eq!(
                messages,
                vec![("region-eu", "payload-1"), ("region-eu", "payload-2")]
            );
        }
        other => panic!("Expected dead letters, got {:?}", other),
    }
    assert!(broker.pending_dead_letters(&me).is_empty());

    // live delivery resumes
    client.publish("region-eu", "payload-3").await.unwrap();
    assert_eq!(
        next_delivery(&mut deliveries).await,
        Delivery::Live {
            topic: "region-eu".to_string(),
            message: "payload-3".to_string(),
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fan_out_reaches_every_subscriber() {
    let (client, _broker) = spawn_broker().await;
    client.new_topic("region-eu").await.unwrap();

    let mut receivers = Vec::new();
    let mut endpoints = Vec::new();
    for _ in 0..3 {
        let addr = free_address().await;
        let (endpoint, deliveries) = spawn_subscriber(&addr).await;
        client.connect(&addr).await.unwrap();
        client.subscribe("region-eu", &addr).await.unwrap();
        endpoints.push(endpoint);
        receivers.push(deliveries);
    }

    client.publish("region-eu", "payload-1").await.unwrap();

    for deliveries in receivers.iter_mut() {
        assert_eq!(
            next_delivery(deliveries).await,
            Delivery::Live {
                topic: "region-eu".to_string(),
                message: "payload-1".to_string(),
            }
        );
    }
}
