//! Request/response over WebSocket
//!
//! Both directions of the protocol use the same shape: the caller opens a
//! WebSocket to `ws://{address}`, writes one JSON text frame per request and
//! reads exactly one JSON text frame back (an [`RpcResponse`]). A session can
//! carry several sequential requests.
//!
//! The server half (`serve_connection`) is generic over the request type so
//! the broker and subscriber endpoints share it.

use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, accept_async, connect_async};
use tracing::{debug, error, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::transport::message::RpcResponse;
use crate::utils::error::RpcError;

/// An open client-side session with one endpoint.
pub struct RpcSession {
    address: String,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl RpcSession {
    pub async fn open(address: &str) -> Result<Self, RpcError> {
        let url = format!("ws://{address}");
        let (stream, _response) = connect_async(url.as_str()).await?;
        Ok(Self {
            address: address.to_string(),
            stream,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send `request` and wait for its reply string.
    pub async fn call<R: Serialize>(&mut self, request: &R) -> Result<String, RpcError> {
        let body = serde_json::to_string(request)?;
        self.stream.send(WsMessage::text(body)).await?;

        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(text))) => return decode_reply(text.as_str()),
                Some(Ok(WsMessage::Close(_))) | None => return Err(RpcError::ConnectionClosed),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    pub async fn close(mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!("Closing session with {} failed: {}", self.address, e);
        }
    }
}

/// One-shot call: open a session, send one request, close.
pub async fn call<R: Serialize>(address: &str, request: &R) -> Result<String, RpcError> {
    let mut session = RpcSession::open(address).await?;
    let result = session.call(request).await;
    session.close().await;
    result
}

fn decode_reply(text: &str) -> Result<String, RpcError> {
    match serde_json::from_str::<RpcResponse>(text)? {
        RpcResponse::Reply { reply } => Ok(reply),
        RpcResponse::Error { message } => Err(RpcError::Remote(message)),
    }
}

/// Serve requests on an accepted TCP connection until the peer goes away.
///
/// Each text frame is decoded as `Req` and passed to `handle`; the returned
/// response is written back before the next frame is read. Undecodable
/// frames get an `RpcResponse::Error` and the session stays open.
pub async fn serve_connection<Req, F, Fut>(stream: TcpStream, session: &str, mut handle: F)
where
    Req: DeserializeOwned,
    F: FnMut(Req) -> Fut,
    Fut: Future<Output = RpcResponse>,
{
    let mut ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake error on {session}: {e}");
            return;
        }
    };

    while let Some(frame) = ws_stream.next().await {
        let msg = match frame {
            Ok(msg) => msg,
            Err(e) => {
                debug!("{session} read error: {e}");
                break;
            }
        };

        if msg.is_close() {
            break;
        }
        if !msg.is_text() {
            continue;
        }
        let Ok(text) = msg.to_text() else {
            continue;
        };

        let response = match serde_json::from_str::<Req>(text) {
            Ok(request) => handle(request).await,
            Err(err) => {
                warn!(
                    "Invalid request on {session}: {err} | {}",
                    text.chars().take(100).collect::<String>()
                );
                RpcResponse::Error {
                    message: format!("invalid request: {err}"),
                }
            }
        };

        let body = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize response on {session}: {e}");
                break;
            }
        };
        if let Err(e) = ws_stream.send(WsMessage::text(body)).await {
            debug!("Failed to reply on {session}: {e}");
            break;
        }
    }
}
