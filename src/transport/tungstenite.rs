//! Production WebSocket transport over tokio-tungstenite.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use super::{CloseReason, LinkEvent, Transport, TransportLink};
use crate::error::RealtimeError;
use crate::messages::WireFrame;

/// WebSocket transport factory.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, url: &str) -> Result<Box<dyn TransportLink>, RealtimeError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| RealtimeError::ConnectionFailed(e.to_string()))?;
        debug!(url, "websocket stream established");
        Ok(Box::new(WsLink { stream }))
    }
}

struct WsLink {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl TransportLink for WsLink {
    async fn send(&mut self, frame: WireFrame) -> Result<(), RealtimeError> {
        let json = serde_json::to_string(&frame)?;
        self.stream
            .send(Message::Text(json))
            .await
            .map_err(|e| RealtimeError::SendFailed(e.to_string()))
    }

    async fn next(&mut self) -> Option<LinkEvent> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<WireFrame>(&text) {
                        Ok(frame) => return Some(LinkEvent::Frame(frame)),
                        Err(e) => {
                            // Skip malformed frames rather than killing the link
                            warn!(error = %e, "failed to parse frame: {text}");
                        }
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    debug!("ping received, sending pong");
                    let _ = self.stream.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .unwrap_or_else(|| "close frame".to_string());
                    return Some(LinkEvent::Closed(CloseReason::Server(reason)));
                }
                Some(Ok(_)) => {
                    // Binary, Pong, raw Frame -- ignore
                }
                Some(Err(e)) => {
                    return Some(LinkEvent::Closed(CloseReason::Transport(e.to_string())));
                }
                None => return Some(LinkEvent::Closed(CloseReason::StreamEnded)),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}
