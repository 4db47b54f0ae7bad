//! CLI for rpcsub
//!
//! Subcommands:
//! - `server`: run the broker
//! - `topic`: create a topic
//! - `publish`: publish one message
//! - `subscribe`: run a subscriber endpoint and print what arrives

use std::sync::Arc;

use clap::Parser;
use rpcsub::broker::Broker;
use rpcsub::client::BrokerClient;
use rpcsub::config::load_config;
use rpcsub::subscriber::{ChannelHandler, Delivery, serve_subscriber};
use rpcsub::transport::{WebSocketCallbacks, start_rpc_server};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "rpcsub")]
enum Command {
    /// Start the broker RPC server
    Server,
    /// Create a topic on the broker
    Topic {
        #[arg(long, default_value = "127.0.0.1:3000")]
        broker: String,
        name: String,
    },
    /// Publish a message on a topic
    Publish {
        #[arg(long, default_value = "127.0.0.1:3000")]
        broker: String,
        #[arg(long)]
        topic: String,
        message: String,
    },
    /// Listen for deliveries on one or more topics until Ctrl-C
    Subscribe {
        #[arg(long, default_value = "127.0.0.1:3000")]
        broker: String,
        /// Address to bind; also the identity registered with the broker
        #[arg(long)]
        listen: String,
        #[arg(long = "topic", required = true)]
        topics: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cmd = Command::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            rpcsub::utils::logging::init("info");
            error!("Failed to load configuration: {}", e);
            return;
        }
    };
    rpcsub::utils::logging::init(&config.logging.level);

    let result = match cmd {
        Command::Server => run_server(config).await,
        Command::Topic { broker, name } => run_topic(&broker, &name).await,
        Command::Publish {
            broker,
            topic,
            message,
        } => run_publish(&broker, &topic, &message).await,
        Command::Subscribe {
            broker,
            listen,
            topics,
        } => run_subscriber(&broker, &listen, &topics).await,
    };

    if let Err(e) = result {
        error!("{}", e);
    }
}

async fn run_server(config: rpcsub::config::Settings) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.server.address();
    let broker = Arc::new(Broker::with_settings(
        &config.broker,
        Arc::new(WebSocketCallbacks),
    ));

    tokio::select! {
        result = start_rpc_server(&addr, broker) => {
            result?;
            error!("RPC server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn run_topic(broker: &str, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let status = BrokerClient::new(broker).new_topic(name).await?;
    println!("{status}");
    Ok(())
}

async fn run_publish(
    broker: &str,
    topic: &str,
    message: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let status = BrokerClient::new(broker).publish(topic, message).await?;
    println!("{status}");
    Ok(())
}

async fn run_subscriber(
    broker: &str,
    listen: &str,
    topics: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let (handler, mut deliveries) = ChannelHandler::new();
    let listener = TcpListener::bind(listen).await?;
    info!("Subscriber endpoint listening on ws://{listen}");
    let endpoint = tokio::spawn(serve_subscriber(listener, Arc::new(handler)));

    let client = BrokerClient::new(broker);
    info!("Connect: {}", client.connect(listen).await?);
    for topic in topics {
        let status = client.subscribe(topic, listen).await?;
        if status.is_success() {
            info!("Subscribe {topic}: {status}");
        } else {
            warn!("Subscribe {topic}: {status}");
        }
    }

    loop {
        tokio::select! {
            delivery = deliveries.recv() => match delivery {
                Some(Delivery::Live { topic, message }) => println!("[{topic}] {message}"),
                Some(Delivery::DeadLetters(letters)) => {
                    for letter in letters {
                        println!("[{}] {} (dead letter)", letter.topic, letter.message);
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, unsubscribing.");
                break;
            }
        }
    }

    for topic in topics {
        if let Err(e) = client.unsubscribe(topic, listen).await {
            warn!("Unsubscribe {topic} failed: {e}");
        }
    }
    endpoint.abort();
    Ok(())
}
