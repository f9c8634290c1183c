//! Scriptable in-memory transport for tests.
//!
//! Records every frame the client sends, lets tests inject inbound frames
//! and close the live link, and can be scripted to fail connect attempts to
//! exercise the reconnection state machine.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{CloseReason, LinkEvent, Transport, TransportLink};
use crate::error::RealtimeError;
use crate::messages::WireFrame;

/// In-memory transport with frame recording and connection scripting.
///
/// Clones share state, so a test can keep one handle while the client owns
/// another.
#[derive(Clone, Default)]
pub struct MockTransport {
    shared: Arc<MockShared>,
}

#[derive(Default)]
struct MockShared {
    sent: Mutex<Vec<WireFrame>>,
    connect_failures: Mutex<VecDeque<String>>,
    connects: AtomicUsize,
    current: Mutex<Option<mpsc::UnboundedSender<LinkEvent>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next `n` connect attempts to fail with `reason`.
    pub fn fail_next_connects(&self, n: usize, reason: &str) {
        let mut failures = self.shared.connect_failures.lock().unwrap();
        for _ in 0..n {
            failures.push_back(reason.to_string());
        }
    }

    /// Total connect attempts observed, successful or not.
    pub fn connect_count(&self) -> usize {
        self.shared.connects.load(Ordering::SeqCst)
    }

    /// All frames sent over any link so far, in send order.
    pub fn sent_frames(&self) -> Vec<WireFrame> {
        self.shared.sent.lock().unwrap().clone()
    }

    /// Frames sent for a specific event name.
    pub fn sent_with_event(&self, event: &str) -> Vec<WireFrame> {
        self.sent_frames()
            .into_iter()
            .filter(|frame| frame.event == event)
            .collect()
    }

    pub fn clear_sent(&self) {
        self.shared.sent.lock().unwrap().clear();
    }

    /// Deliver an inbound frame on the live link. Returns `false` when no
    /// link is open.
    pub fn inject(&self, frame: WireFrame) -> bool {
        let current = self.shared.current.lock().unwrap();
        match current.as_ref() {
            Some(tx) => tx.send(LinkEvent::Frame(frame)).is_ok(),
            None => false,
        }
    }

    /// Close the live link with `reason`. Returns `false` when no link is
    /// open.
    pub fn close_current(&self, reason: CloseReason) -> bool {
        let mut current = self.shared.current.lock().unwrap();
        match current.take() {
            Some(tx) => tx.send(LinkEvent::Closed(reason)).is_ok(),
            None => false,
        }
    }

    pub fn has_live_link(&self) -> bool {
        self.shared.current.lock().unwrap().is_some()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, _url: &str) -> Result<Box<dyn TransportLink>, RealtimeError> {
        self.shared.connects.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = self.shared.connect_failures.lock().unwrap().pop_front() {
            return Err(RealtimeError::ConnectionFailed(reason));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *self.shared.current.lock().unwrap() = Some(tx.clone());
        Ok(Box::new(MockLink {
            shared: self.shared.clone(),
            rx,
            tx,
        }))
    }
}

struct MockLink {
    shared: Arc<MockShared>,
    rx: mpsc::UnboundedReceiver<LinkEvent>,
    tx: mpsc::UnboundedSender<LinkEvent>,
}

#[async_trait]
impl TransportLink for MockLink {
    async fn send(&mut self, frame: WireFrame) -> Result<(), RealtimeError> {
        self.shared.sent.lock().unwrap().push(frame);
        Ok(())
    }

    async fn next(&mut self) -> Option<LinkEvent> {
        self.rx.recv().await
    }

    async fn close(&mut self) {
        // Only clear the slot if it still belongs to this link; a newer
        // connect may have replaced it already
        let mut current = self.shared.current.lock().unwrap();
        if current
            .as_ref()
            .is_some_and(|tx| tx.same_channel(&self.tx))
        {
            current.take();
        }
    }
}
