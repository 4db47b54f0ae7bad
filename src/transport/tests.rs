use std::sync::Arc;

use serde_json::json;
use tokio::net::TcpListener;

use crate::broker::{Broker, DeadLetter, Status};
use crate::client::BrokerClient;
use crate::transport::message::{BrokerRequest, RpcResponse, SubscriberRequest};
use crate::transport::rpc::{self, RpcSession};
use crate::transport::websocket::{handle_request, serve, start_rpc_server};
use crate::utils::error::{RpcError, ServerError};

async fn spawn_broker_server() -> (String, Arc<Broker>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let broker = Arc::new(Broker::new());
    tokio::spawn(serve(listener, broker.clone()));
    (addr, broker)
}

#[test]
fn test_broker_request_wire_shape() {
    let msg = json!({
        "type": "subscribe",
        "topic": "region-eu",
        "clientAddress": "10.0.0.5:9000"
    })
    .to_string();

    let request: BrokerRequest = serde_json::from_str(&msg).unwrap();
    assert_eq!(
        request,
        BrokerRequest::Subscribe {
            topic: "region-eu".to_string(),
            client_address: "10.0.0.5:9000".to_string(),
        }
    );
    assert_eq!(request.method(), "Subscribe");

    let new_topic = serde_json::to_value(BrokerRequest::NewTopic {
        topic: "region-eu".to_string(),
    })
    .unwrap();
    assert_eq!(new_topic, json!({ "type": "new_topic", "topic": "region-eu" }));
}

#[test]
fn test_subscriber_request_wire_shape() {
    let request = SubscriberRequest::SendDeadLetters {
        dead_letters: vec![DeadLetter {
            topic: "region-eu".to_string(),
            message: "payload-1".to_string(),
            timestamp: 7,
        }],
    };

    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(
        value,
        json!({
            "type": "send_dead_letters",
            "deadLetters": [{ "topic": "region-eu", "message": "payload-1", "timestamp": 7 }]
        })
    );

    // topic is optional on send_message
    let bare: SubscriberRequest =
        serde_json::from_str(r#"{"type":"send_message","message":"hi"}"#).unwrap();
    assert_eq!(
        bare,
        SubscriberRequest::SendMessage {
            topic: String::new(),
            message: "hi".to_string(),
        }
    );
}

#[tokio::test]
async fn test_handle_request_maps_statuses() {
    let broker = Broker::new();

    let reply = handle_request(
        &broker,
        BrokerRequest::Subscribe {
            topic: "region-eu".to_string(),
            client_address: "10.0.0.5:9000".to_string(),
        },
    )
    .await;
    assert_eq!(reply, RpcResponse::reply("ERR: NOT_CONNECTED"));

    let reply = handle_request(
        &broker,
        BrokerRequest::NewTopic {
            topic: "region-eu".to_string(),
        },
    )
    .await;
    assert_eq!(reply, RpcResponse::reply("CREATED"));
    assert!(broker.topic_exists("region-eu"));
}

#[tokio::test]
async fn test_client_round_trip() {
    let (addr, broker) = spawn_broker_server().await;
    let client = BrokerClient::new(addr);
    let me = "127.0.0.1:1";

    assert_eq!(client.new_topic("region-eu").await.unwrap(), Status::Created);
    assert_eq!(
        client.subscribe("region-eu", me).await.unwrap(),
        Status::NotConnected
    );
    assert_eq!(client.connect(me).await.unwrap(), Status::Connected);
    assert_eq!(client.connect(me).await.unwrap(), Status::AlreadyConnected);
    assert_eq!(client.subscribe("nope", me).await.unwrap(), Status::NoTopic);
    assert_eq!(
        client.subscribe("region-eu", me).await.unwrap(),
        Status::Subscribed
    );
    assert_eq!(
        client.unsubscribe("region-eu", me).await.unwrap(),
        Status::Unsubscribed
    );
    assert_eq!(
        client.publish("region-eu", "payload-1").await.unwrap(),
        Status::Published
    );
    assert_eq!(client.publish("nope", "x").await.unwrap(), Status::NoTopic);

    assert_eq!(broker.last_message("region-eu"), Some("payload-1".to_string()));
}

#[tokio::test]
async fn test_session_carries_several_requests() {
    let (addr, broker) = spawn_broker_server().await;
    let mut session = RpcSession::open(&addr).await.unwrap();

    for topic in ["a", "b", "c"] {
        let reply = session
            .call(&BrokerRequest::NewTopic {
                topic: topic.to_string(),
            })
            .await
            .unwrap();
        assert_eq!(reply, "CREATED");
    }
    session.close().await;

    let mut names = broker.topic_names();
    names.sort();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_invalid_request_gets_error_reply() {
    let (addr, _) = spawn_broker_server().await;
    let mut session = RpcSession::open(&addr).await.unwrap();

    let result = session.call(&json!({ "type": "delete_everything" })).await;
    assert!(matches!(result, Err(RpcError::Remote(_))));

    // the session is still usable afterwards
    let reply = session
        .call(&BrokerRequest::NewTopic {
            topic: "still-here".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(reply, "CREATED");
}

#[tokio::test]
async fn test_call_to_closed_port_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let result = rpc::call(&addr, &BrokerRequest::NewTopic {
        topic: "x".to_string(),
    })
    .await;
    assert!(matches!(result, Err(RpcError::WebSocket(_))));
}

#[tokio::test]
async fn test_start_rpc_server_reports_bind_failure() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap().to_string();

    let result = start_rpc_server(&addr, Arc::new(Broker::new())).await;
    assert!(matches!(result, Err(ServerError::Bind { .. })));
}
