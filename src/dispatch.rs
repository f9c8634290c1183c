//! Event dispatcher and handler registry.
//!
//! A string-keyed publish/subscribe bus decoupling inbound wire events from
//! feature code. Handlers run in registration order; one handler's panic is
//! caught and logged without affecting its siblings or the connection.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use crate::messages::{NotificationPayload, SafetyAlertPayload, ServerEvent, Severity};
use crate::notify::{NotificationKind, NotificationSink};

/// Callback registered against an event name.
pub type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Token identifying one registration, returned by
/// [`Dispatcher::on_message`] and consumed by [`Dispatcher::off_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(Uuid);

struct Registration {
    id: HandlerId,
    handler: Handler,
}

/// Ordered, string-keyed handler registry.
///
/// Any collaborator may register or remove handlers at any time; an event
/// name is shared ground, never owned by a single subscriber. The same
/// closure may be registered twice and will then run twice per frame.
pub struct Dispatcher {
    handlers: Mutex<HashMap<String, Vec<Registration>>>,
    sink: Option<Arc<dyn NotificationSink>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
            sink: None,
        }
    }

    /// Registry with built-in notification side effects enabled.
    pub fn with_sink(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
            sink: Some(sink),
        }
    }

    /// Register `handler` for `event`, appending to the ordered list.
    pub fn on_message<F>(&self, event: &str, handler: F) -> HandlerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = HandlerId(Uuid::new_v4());
        let mut handlers = self.handlers.lock().expect("handler registry poisoned");
        handlers.entry(event.to_string()).or_default().push(Registration {
            id,
            handler: Arc::new(handler),
        });
        id
    }

    /// Remove the registration identified by `id`. Returns `false` when the
    /// id was not registered for `event`.
    pub fn off_message(&self, event: &str, id: HandlerId) -> bool {
        let mut handlers = self.handlers.lock().expect("handler registry poisoned");
        let Some(list) = handlers.get_mut(event) else {
            return false;
        };
        let Some(pos) = list.iter().position(|reg| reg.id == id) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            handlers.remove(event);
        }
        true
    }

    /// Number of handlers currently registered for `event`.
    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers
            .lock()
            .expect("handler registry poisoned")
            .get(event)
            .map_or(0, Vec::len)
    }

    /// Fan `payload` out to every handler registered for `event`, in
    /// registration order. A panicking handler is logged and skipped;
    /// delivery to the remaining handlers continues.
    pub fn dispatch(&self, event: &str, payload: &Value) {
        // Snapshot outside the lock so handlers can re-register freely
        let snapshot: Vec<Handler> = {
            let handlers = self.handlers.lock().expect("handler registry poisoned");
            match handlers.get(event) {
                Some(list) => list.iter().map(|reg| reg.handler.clone()).collect(),
                None => {
                    debug!(event, "no handlers registered");
                    return;
                }
            }
        };

        for handler in snapshot {
            let result = panic::catch_unwind(AssertUnwindSafe(|| handler(payload)));
            if let Err(cause) = result {
                let cause = panic_message(&cause);
                error!(event, cause, "message handler panicked");
            }
        }
    }

    /// Route one inbound event: generic fan-out first, then the built-in
    /// side effects layered on specific event tags.
    pub fn dispatch_event(&self, event: &ServerEvent) {
        self.dispatch(event.name(), event.data());
        self.apply_builtins(event);
    }

    fn apply_builtins(&self, event: &ServerEvent) {
        let Some(sink) = &self.sink else { return };

        match event {
            ServerEvent::SafetyAlertBroadcast(data) => {
                match serde_json::from_value::<SafetyAlertPayload>(data.clone()) {
                    Ok(alert) => {
                        let icon = Severity::parse(&alert.severity)
                            .map(Severity::icon)
                            .unwrap_or("⚠️");
                        sink.notify(
                            &format!("{icon} Safety Alert: {}", alert.message),
                            NotificationKind::Error,
                            Duration::from_secs(10),
                        );
                    }
                    Err(e) => debug!(error = %e, "malformed safety alert payload"),
                }
            }
            ServerEvent::DiscoveryMade(data) => {
                let title = data["discovery"]["title"]
                    .as_str()
                    .unwrap_or("Research breakthrough");
                sink.notify(
                    &format!("🔬 New Discovery: {title}"),
                    NotificationKind::Success,
                    Duration::from_secs(8),
                );
            }
            ServerEvent::SystemMessage(data) => {
                if let Ok(msg) = serde_json::from_value::<NotificationPayload>(data.clone()) {
                    sink.notify(&msg.message, NotificationKind::Info, Duration::from_secs(5));
                }
            }
            ServerEvent::Notification(data) => {
                if let Ok(msg) = serde_json::from_value::<NotificationPayload>(data.clone()) {
                    let kind = msg
                        .kind
                        .as_deref()
                        .map_or(NotificationKind::Info, NotificationKind::parse);
                    sink.notify(&msg.message, kind, Duration::from_secs(5));
                }
            }
            _ => {}
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(cause: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = cause.downcast_ref::<&str>() {
        s
    } else if let Some(s) = cause.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
