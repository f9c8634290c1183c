//! Realtime connection manager.
//!
//! [`RealtimeClient`] owns exactly one transport link at a time, supervises
//! its lifecycle from a background task, publishes [`ConnectionState`]
//! through a watch channel, and fans inbound frames out through the
//! [`Dispatcher`](crate::dispatch::Dispatcher).
//!
//! Reconnection is a single manual state machine: the transport performs no
//! retries of its own. Failures never surface as errors to callers, only
//! as state transitions, dispatched `connection:*` events, and log lines.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep, timeout, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::RealtimeConfig;
use crate::dispatch::{Dispatcher, HandlerId};
use crate::error::RealtimeError;
use crate::messages::{ClientEvent, ServerEvent, WireFrame, CONNECTION_CLOSED, CONNECTION_EXHAUSTED};
use crate::notify::{NotificationKind, NotificationSink};
use crate::transport::{CloseReason, LinkEvent, Transport, TransportLink};

/// Outbound frames buffered between `emit` and the supervisor task.
const OUTBOUND_CAPACITY: usize = 100;

/// Lifecycle state of the single realtime connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Error,
    /// Reconnection attempts exhausted. Terminal until an explicit
    /// [`RealtimeClient::connect`].
    Failed,
}

/// Snapshot of the connection for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub state: ConnectionState,
    pub reconnect_attempts: u32,
    pub connected: bool,
}

/// Realtime connection and event-dispatch service.
///
/// One instance per process; collaborators share it by cloning (clones share
/// the underlying connection and handler registry).
#[derive(Clone)]
pub struct RealtimeClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: RealtimeConfig,
    transport: Arc<dyn Transport>,
    dispatcher: Dispatcher,
    sink: Option<Arc<dyn NotificationSink>>,
    state_tx: watch::Sender<ConnectionState>,
    outbound: Mutex<Option<mpsc::Sender<WireFrame>>>,
    supervisor: Mutex<Option<CancellationToken>>,
    running: AtomicBool,
    last_attempt: AtomicU32,
    /// Bumped by every `connect()`; a supervisor from an older generation
    /// may no longer publish state or tear down shared slots.
    generation: AtomicU64,
}

impl RealtimeClient {
    pub fn new(config: RealtimeConfig, transport: Arc<dyn Transport>) -> Self {
        Self::build(config, transport, None)
    }

    /// Client with user-visible notifications (connection toasts, safety
    /// alerts) routed through `sink`.
    pub fn with_notifications(
        config: RealtimeConfig,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self::build(config, transport, Some(sink))
    }

    fn build(
        config: RealtimeConfig,
        transport: Arc<dyn Transport>,
        sink: Option<Arc<dyn NotificationSink>>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let dispatcher = match &sink {
            Some(sink) => Dispatcher::with_sink(sink.clone()),
            None => Dispatcher::new(),
        };
        Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                dispatcher,
                sink,
                state_tx,
                outbound: Mutex::new(None),
                supervisor: Mutex::new(None),
                running: AtomicBool::new(false),
                last_attempt: AtomicU32::new(0),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Open the connection and start the supervisor task.
    ///
    /// Idempotent: a no-op while a supervisor is already live (connecting,
    /// connected or reconnecting). Call again after `Failed` to retry.
    pub fn connect(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            debug!("connect ignored: supervisor already running");
            return;
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let cancel = CancellationToken::new();
        *self.inner.outbound.lock().expect("outbound lock") = Some(outbound_tx);
        *self.inner.supervisor.lock().expect("supervisor lock") = Some(cancel.clone());

        let inner = self.inner.clone();
        tokio::spawn(run_supervisor(inner, generation, outbound_rx, cancel));
    }

    /// Close the connection, stop the heartbeat, and settle in
    /// `Disconnected`. Idempotent.
    ///
    /// The supervisor slot is released here, not in the cancelled task, so
    /// a `connect()` issued immediately afterwards starts a new session
    /// instead of being absorbed by the dying one.
    pub fn disconnect(&self) {
        let token = self.inner.supervisor.lock().expect("supervisor lock").take();
        if let Some(token) = token {
            info!("disconnecting");
            token.cancel();
        }
        self.inner.outbound.lock().expect("outbound lock").take();
        self.inner.running.store(false, Ordering::SeqCst);
        self.inner.set_state(ConnectionState::Disconnected);
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state_tx.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state(), ConnectionState::Connected)
    }

    /// Subscribe to connection state changes (drives UI status indicators).
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx().subscribe()
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        let state = self.state();
        ConnectionInfo {
            connected: state == ConnectionState::Connected,
            reconnect_attempts: self.inner.last_attempt.load(Ordering::SeqCst),
            state,
        }
    }

    /// Register `handler` for inbound `event` frames.
    pub fn on_message<F>(&self, event: &str, handler: F) -> HandlerId
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        self.inner.dispatcher.on_message(event, handler)
    }

    /// Remove a previously registered handler.
    pub fn off_message(&self, event: &str, id: HandlerId) -> bool {
        self.inner.dispatcher.off_message(event, id)
    }

    /// Send `event` to the backend, best effort.
    ///
    /// Sends only while `Connected`; otherwise the event is dropped with a
    /// logged warning. No queueing, no acknowledgment, at most once.
    pub fn emit(&self, event: ClientEvent) {
        if *self.inner.state_tx.borrow() != ConnectionState::Connected {
            warn!("cannot emit event: not connected");
            return;
        }

        let frame = match event.into_frame(Utc::now()) {
            Ok(frame) => frame,
            Err(e) => {
                error!("failed to encode outbound event: {e}");
                return;
            }
        };

        let sender = self.inner.outbound.lock().expect("outbound lock").clone();
        match sender {
            Some(tx) => {
                if let Err(e) = tx.try_send(frame) {
                    warn!("dropping outbound event: {e}");
                }
            }
            None => warn!("cannot emit event: no active connection"),
        }
    }

    fn state_tx(&self) -> &watch::Sender<ConnectionState> {
        &self.inner.state_tx
    }
}

impl ClientInner {
    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }

    /// Publish `state` on behalf of supervisor `generation`; a stale
    /// supervisor racing its replacement gets ignored.
    fn publish(&self, generation: u64, state: ConnectionState) {
        if self.generation.load(Ordering::SeqCst) == generation {
            self.state_tx.send_replace(state);
        }
    }

    fn notify(&self, message: &str, kind: NotificationKind, duration: Duration) {
        if let Some(sink) = &self.sink {
            sink.notify(message, kind, duration);
        }
    }

    /// Release supervisor resources so a later `connect()` starts fresh.
    /// No-op for an outdated generation: the slots then belong to a newer
    /// supervisor.
    fn teardown(&self, generation: u64) {
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        self.outbound.lock().expect("outbound lock").take();
        self.supervisor.lock().expect("supervisor lock").take();
        self.running.store(false, Ordering::SeqCst);
    }
}

enum SessionEnd {
    Cancelled,
    Closed(CloseReason),
}

/// Connect, run the session, reconnect with linear backoff, give up after
/// the configured attempt cap.
async fn run_supervisor(
    inner: Arc<ClientInner>,
    generation: u64,
    mut outbound_rx: mpsc::Receiver<WireFrame>,
    cancel: CancellationToken,
) {
    let max_attempts = inner.config.max_reconnect_attempts;
    let mut attempt: u32 = 0;

    loop {
        if attempt == 0 {
            inner.publish(generation, ConnectionState::Connecting);
        }
        info!(url = %inner.config.url, attempt, "🔗 connecting");

        let connecting = timeout(
            inner.config.connect_timeout,
            inner.transport.connect(&inner.config.url),
        );
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = connecting => result,
        };

        let failure = match result {
            Ok(Ok(link)) => {
                attempt = 0;
                inner.last_attempt.store(0, Ordering::SeqCst);
                match run_session(&inner, generation, link, &mut outbound_rx, &cancel).await {
                    SessionEnd::Cancelled => break,
                    SessionEnd::Closed(reason) => {
                        inner.publish(generation, ConnectionState::Disconnected);
                        info!("🔌 disconnected: {reason}");
                        inner
                            .dispatcher
                            .dispatch(CONNECTION_CLOSED, &json!({ "reason": reason.to_string() }));
                        if reason.is_server_initiated() {
                            inner.notify(
                                "Server disconnected. Reconnecting...",
                                NotificationKind::Warning,
                                Duration::from_secs(5),
                            );
                        }
                        reason.to_string()
                    }
                }
            }
            Ok(Err(e)) => {
                inner.publish(generation, ConnectionState::Error);
                e.to_string()
            }
            Err(_elapsed) => {
                inner.publish(generation, ConnectionState::Error);
                RealtimeError::ConnectTimeout(inner.config.connect_timeout.as_secs()).to_string()
            }
        };

        attempt += 1;
        if attempt > max_attempts {
            error!("❌ giving up after {max_attempts} reconnection attempts: {failure}");
            inner.publish(generation, ConnectionState::Failed);
            inner
                .dispatcher
                .dispatch(CONNECTION_EXHAUSTED, &json!({ "attempts": max_attempts }));
            inner.notify(
                "Connection lost. Please refresh the page.",
                NotificationKind::Error,
                Duration::from_secs(10),
            );
            inner.teardown(generation);
            return;
        }

        inner.last_attempt.store(attempt, Ordering::SeqCst);
        inner.publish(generation, ConnectionState::Reconnecting { attempt });
        let delay = inner.config.reconnect_delay(attempt);
        warn!(
            "🔄 reconnecting (attempt {attempt}/{max_attempts}) in {}ms: {failure}",
            delay.as_millis()
        );
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            () = sleep(delay) => {}
        }
    }

    inner.publish(generation, ConnectionState::Disconnected);
    inner.teardown(generation);
    info!("connection supervisor stopped");
}

/// Drive one live link: heartbeat, outbound sends, inbound dispatch.
///
/// The heartbeat timer only exists inside this function, which is what
/// guarantees it never fires outside the `Connected` state.
async fn run_session(
    inner: &Arc<ClientInner>,
    generation: u64,
    mut link: Box<dyn TransportLink>,
    outbound_rx: &mut mpsc::Receiver<WireFrame>,
    cancel: &CancellationToken,
) -> SessionEnd {
    inner.publish(generation, ConnectionState::Connected);
    info!("🔗 connected");
    inner.notify(
        "Connected to Autogent Studio",
        NotificationKind::Success,
        Duration::from_secs(3),
    );

    // Re-authenticate the session on every (re)connect
    if let Some(session) = &inner.config.session {
        let auth = ClientEvent::Authenticate {
            user_id: session.user_id.clone(),
            session_token: session.session_token.clone(),
        };
        match auth.into_frame(Utc::now()) {
            Ok(frame) => {
                if let Err(e) = link.send(frame).await {
                    error!("failed to re-authenticate: {e}");
                }
            }
            Err(e) => error!("failed to encode authenticate: {e}"),
        }
    }

    let period = inner.config.heartbeat_interval;
    let mut heartbeat = interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let end = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break SessionEnd::Cancelled,
            _ = heartbeat.tick() => {
                debug!("💓 heartbeat");
                match ClientEvent::Heartbeat.into_frame(Utc::now()) {
                    Ok(frame) => {
                        if let Err(e) = link.send(frame).await {
                            warn!("heartbeat send failed: {e}");
                        }
                    }
                    Err(e) => error!("failed to encode heartbeat: {e}"),
                }
            }
            frame = outbound_rx.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = link.send(frame).await {
                        error!("send failed: {e}");
                    }
                }
                None => break SessionEnd::Cancelled,
            },
            delivery = link.next() => match delivery {
                Some(LinkEvent::Frame(frame)) => {
                    let event = ServerEvent::from_frame(frame);
                    inner.dispatcher.dispatch_event(&event);
                }
                Some(LinkEvent::Closed(reason)) => break SessionEnd::Closed(reason),
                None => break SessionEnd::Closed(CloseReason::StreamEnded),
            },
        }
    };

    link.close().await;
    // Anything still queued dies with the link: at-most-once only
    while outbound_rx.try_recv().is_ok() {}
    end
}
