//! Autogent Realtime - the WebSocket connection layer for Autogent Studio
//!
//! Maintains one supervised connection to the Studio backend with manual
//! reconnection and heartbeats, dispatches inbound events to registered
//! handlers, and exposes a typed command surface for outbound events.

pub mod client;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod messages;
pub mod notify;
pub mod session;
pub mod transport;
