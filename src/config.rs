//! Client configuration.

use std::time::Duration;

use crate::session::SessionCredentials;

/// Configuration for the realtime client.
///
/// The defaults mirror the Studio backend's connection contract: five
/// reconnection attempts with a linear 1s backoff step, a 20s connect
/// timeout and a 30s heartbeat.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:5000/ws`.
    pub url: String,
    /// Reconnection attempts before the client gives up and goes `Failed`.
    pub max_reconnect_attempts: u32,
    /// Backoff step; the delay before attempt `n` is `n * reconnect_base_delay`.
    pub reconnect_base_delay: Duration,
    /// Upper bound on a single connect attempt.
    pub connect_timeout: Duration,
    /// Keep-alive period while connected.
    pub heartbeat_interval: Duration,
    /// Credentials re-sent as an `authenticate` event on every (re)connect.
    pub session: Option<SessionCredentials>,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:5000/ws".to_string(),
            max_reconnect_attempts: 5,
            reconnect_base_delay: Duration::from_millis(1000),
            connect_timeout: Duration::from_secs(20),
            heartbeat_interval: Duration::from_secs(30),
            session: None,
        }
    }
}

impl RealtimeConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_session(mut self, session: SessionCredentials) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_reconnect(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.max_reconnect_attempts = max_attempts;
        self.reconnect_base_delay = base_delay;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Delay before reconnection attempt `attempt` (1-based). Linear, not
    /// exponential: the backend expects clients back quickly.
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        self.reconnect_base_delay * attempt
    }
}
