//! Error types for the realtime client.
//!
//! Connection failures never surface through the public API as errors; they
//! are reported via [`ConnectionState`](crate::client::ConnectionState)
//! transitions and dispatched events. `RealtimeError` is what the transport
//! seam and the session store speak internally.

use thiserror::Error;

/// Errors produced by the transport layer and the session store.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// The transport failed to establish a connection.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The connect attempt exceeded the configured timeout.
    #[error("connection timed out after {0}s")]
    ConnectTimeout(u64),

    /// A frame could not be written to the transport.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// A frame could not be serialized or deserialized.
    #[error("frame codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Reading or writing the session file failed.
    #[error("session store error: {0}")]
    SessionStore(#[from] std::io::Error),
}
