//! Common test utilities for integration tests.
//!
//! Provides a recording notification sink and helpers for driving the
//! connection state machine under tokio's paused clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;

use autogent_realtime::client::ConnectionState;
use autogent_realtime::notify::{NotificationKind, NotificationSink};

/// One captured notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub kind: NotificationKind,
    pub duration: Duration,
}

/// Sink that records every notification for later assertion.
#[derive(Default)]
pub struct RecordingSink {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.toasts().into_iter().map(|t| t.message).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, message: &str, kind: NotificationKind, duration: Duration) {
        self.toasts.lock().unwrap().push(Toast {
            message: message.to_string(),
            kind,
            duration,
        });
    }
}

/// Block until the connection reaches `want`.
///
/// Under the paused clock the timeout only fires once every task is idle,
/// so a wrong expectation fails fast instead of hanging.
pub async fn wait_for_state(rx: &mut watch::Receiver<ConnectionState>, want: ConnectionState) {
    let result = timeout(Duration::from_secs(300), async {
        loop {
            if *rx.borrow_and_update() == want {
                return;
            }
            rx.changed().await.expect("state channel closed");
        }
    })
    .await;
    assert!(result.is_ok(), "timed out waiting for state {want:?}");
}

/// Let spawned connection tasks run without advancing the clock.
pub async fn settle() {
    for _ in 0..25 {
        tokio::task::yield_now().await;
    }
}
