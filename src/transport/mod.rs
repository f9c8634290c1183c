//! Transport abstraction.
//!
//! The connection manager supervises exactly one [`TransportLink`] at a
//! time and knows nothing about WebSockets. The trait seam enables
//! dependency injection: [`tungstenite::WsTransport`] in production,
//! [`mock::MockTransport`] in tests.

mod mock;
mod tungstenite;

pub use mock::MockTransport;
pub use tungstenite::WsTransport;

use async_trait::async_trait;

use crate::error::RealtimeError;
use crate::messages::WireFrame;

/// Why a live link stopped delivering frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The server sent a close frame.
    Server(String),
    /// A transport-level error (IO, protocol) killed the link.
    Transport(String),
    /// The stream ended without a close frame.
    StreamEnded,
}

impl CloseReason {
    /// Server-initiated closes get surfaced to the user as a warning;
    /// silent drops do not.
    pub fn is_server_initiated(&self) -> bool {
        matches!(self, CloseReason::Server(_))
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::Server(reason) => write!(f, "server disconnect: {reason}"),
            CloseReason::Transport(reason) => write!(f, "transport error: {reason}"),
            CloseReason::StreamEnded => write!(f, "stream ended"),
        }
    }
}

/// One delivery from a live link.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Frame(WireFrame),
    Closed(CloseReason),
}

/// Factory for realtime links.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a link to `url`. Each call is one connection attempt; the
    /// transport performs no retries of its own; reconnection policy lives
    /// entirely in the connection manager.
    async fn connect(&self, url: &str) -> Result<Box<dyn TransportLink>, RealtimeError>;
}

/// A live bidirectional connection.
#[async_trait]
pub trait TransportLink: Send {
    /// Write one frame. Failures are reported but the link may still be
    /// readable; the supervisor decides whether to tear down.
    async fn send(&mut self, frame: WireFrame) -> Result<(), RealtimeError>;

    /// Next inbound delivery. `None` after the link has reported `Closed`.
    async fn next(&mut self) -> Option<LinkEvent>;

    /// Close the link. Idempotent.
    async fn close(&mut self);
}
