//! Inbound event dispatch integration tests.
//!
//! Frames injected through the in-memory transport must reach registered
//! handlers in order, survive handler panics, and trigger the built-in
//! notification side effects.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use autogent_realtime::client::{ConnectionState, RealtimeClient};
use autogent_realtime::config::RealtimeConfig;
use autogent_realtime::messages::WireFrame;
use autogent_realtime::notify::NotificationKind;
use autogent_realtime::transport::MockTransport;

use common::{settle, wait_for_state, RecordingSink};

async fn connected_client(transport: &MockTransport) -> RealtimeClient {
    let client = RealtimeClient::new(
        RealtimeConfig::default(),
        Arc::new(transport.clone()),
    );
    let mut state_rx = client.state_receiver();
    client.connect();
    wait_for_state(&mut state_rx, ConnectionState::Connected).await;
    client
}

#[tokio::test(start_paused = true)]
async fn test_injected_frame_reaches_handler() {
    let transport = MockTransport::new();
    let client = connected_client(&transport).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    client.on_message("new_message", move |payload| {
        seen_clone.lock().unwrap().push(payload.clone());
    });

    assert!(transport.inject(WireFrame::new(
        "new_message",
        json!({"room_id": "r1", "message": "hi"}),
    )));
    settle().await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["message"], "hi");
}

#[tokio::test(start_paused = true)]
async fn test_handlers_run_in_registration_order() {
    let transport = MockTransport::new();
    let client = connected_client(&transport).await;

    let order = Arc::new(Mutex::new(Vec::new()));
    for tag in ["a", "b", "c"] {
        let order = order.clone();
        client.on_message("workflow_updated", move |_| {
            order.lock().unwrap().push(tag);
        });
    }

    transport.inject(WireFrame::new("workflow_updated", json!({})));
    settle().await;

    assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
}

#[tokio::test(start_paused = true)]
async fn test_removed_handler_stops_receiving() {
    let transport = MockTransport::new();
    let client = connected_client(&transport).await;

    let count = Arc::new(Mutex::new(0));
    let count_clone = count.clone();
    let id = client.on_message("user_typing", move |_| {
        *count_clone.lock().unwrap() += 1;
    });

    transport.inject(WireFrame::new("user_typing", json!({})));
    settle().await;
    assert_eq!(*count.lock().unwrap(), 1);

    assert!(client.off_message("user_typing", id));
    transport.inject(WireFrame::new("user_typing", json!({})));
    settle().await;
    assert_eq!(*count.lock().unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_handler_panic_spares_siblings_and_connection() {
    let transport = MockTransport::new();
    let client = connected_client(&transport).await;

    let reached = Arc::new(Mutex::new(0));
    client.on_message("quantum_circuit_updated", |_| panic!("handler bug"));
    let reached_clone = reached.clone();
    client.on_message("quantum_circuit_updated", move |_| {
        *reached_clone.lock().unwrap() += 1;
    });

    transport.inject(WireFrame::new("quantum_circuit_updated", json!({})));
    settle().await;
    assert_eq!(*reached.lock().unwrap(), 1);

    // The connection shrugs off the panic and keeps dispatching
    assert!(client.is_connected());
    transport.inject(WireFrame::new("quantum_circuit_updated", json!({})));
    settle().await;
    assert_eq!(*reached.lock().unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_event_names_still_dispatch() {
    let transport = MockTransport::new();
    let client = connected_client(&transport).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    client.on_message("introduced_next_release", move |payload| {
        seen_clone.lock().unwrap().push(payload.clone());
    });

    transport.inject(WireFrame::new("introduced_next_release", json!({"v": 2})));
    settle().await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["v"], 2);
}

#[tokio::test(start_paused = true)]
async fn test_safety_alert_builtin_toast() {
    let transport = MockTransport::new();
    let sink = RecordingSink::new();
    let client = RealtimeClient::with_notifications(
        RealtimeConfig::default(),
        Arc::new(transport.clone()),
        sink.clone(),
    );
    let mut state_rx = client.state_receiver();
    client.connect();
    wait_for_state(&mut state_rx, ConnectionState::Connected).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    client.on_message("safety_alert_broadcast", move |payload| {
        seen_clone.lock().unwrap().push(payload.clone());
    });

    transport.inject(WireFrame::new(
        "safety_alert_broadcast",
        json!({
            "alert_type": "value_drift",
            "severity": "critical",
            "message": "Alignment drift detected"
        }),
    ));
    settle().await;

    // The generic handler fires alongside exactly one built-in toast
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["severity"], "critical");

    let toasts: Vec<_> = sink
        .toasts()
        .into_iter()
        .filter(|t| t.message.contains("Safety Alert"))
        .collect();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].message, "💀 Safety Alert: Alignment drift detected");
    assert_eq!(toasts[0].kind, NotificationKind::Error);
    assert_eq!(toasts[0].duration, Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_safety_alert_unknown_severity_falls_back() {
    let transport = MockTransport::new();
    let sink = RecordingSink::new();
    let client = RealtimeClient::with_notifications(
        RealtimeConfig::default(),
        Arc::new(transport.clone()),
        sink.clone(),
    );
    let mut state_rx = client.state_receiver();
    client.connect();
    wait_for_state(&mut state_rx, ConnectionState::Connected).await;

    transport.inject(WireFrame::new(
        "safety_alert_broadcast",
        json!({
            "alert_type": "anomaly",
            "severity": "apocalyptic",
            "message": "unmapped level"
        }),
    ));
    settle().await;

    let messages = sink.messages();
    assert!(messages.contains(&"⚠️ Safety Alert: unmapped level".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_discovery_builtin_toast() {
    let transport = MockTransport::new();
    let sink = RecordingSink::new();
    let client = RealtimeClient::with_notifications(
        RealtimeConfig::default(),
        Arc::new(transport.clone()),
        sink.clone(),
    );
    let mut state_rx = client.state_receiver();
    client.connect();
    wait_for_state(&mut state_rx, ConnectionState::Connected).await;

    transport.inject(WireFrame::new(
        "discovery_made",
        json!({"discovery": {"title": "Room-temp superconductor"}}),
    ));
    transport.inject(WireFrame::new("discovery_made", json!({})));
    settle().await;

    let toasts: Vec<_> = sink
        .toasts()
        .into_iter()
        .filter(|t| t.message.starts_with("🔬"))
        .collect();
    assert_eq!(toasts.len(), 2);
    assert_eq!(toasts[0].message, "🔬 New Discovery: Room-temp superconductor");
    assert_eq!(toasts[1].message, "🔬 New Discovery: Research breakthrough");
    assert_eq!(toasts[0].kind, NotificationKind::Success);
    assert_eq!(toasts[0].duration, Duration::from_secs(8));
}

#[tokio::test(start_paused = true)]
async fn test_notification_builtin_uses_wire_type() {
    let transport = MockTransport::new();
    let sink = RecordingSink::new();
    let client = RealtimeClient::with_notifications(
        RealtimeConfig::default(),
        Arc::new(transport.clone()),
        sink.clone(),
    );
    let mut state_rx = client.state_receiver();
    client.connect();
    wait_for_state(&mut state_rx, ConnectionState::Connected).await;

    transport.inject(WireFrame::new(
        "notification",
        json!({"message": "Export ready", "type": "success"}),
    ));
    transport.inject(WireFrame::new(
        "system_message",
        json!({"message": "Maintenance at midnight"}),
    ));
    settle().await;

    let toasts = sink.toasts();
    let export = toasts
        .iter()
        .find(|t| t.message == "Export ready")
        .expect("notification toast");
    assert_eq!(export.kind, NotificationKind::Success);
    assert_eq!(export.duration, Duration::from_secs(5));

    let system = toasts
        .iter()
        .find(|t| t.message == "Maintenance at midnight")
        .expect("system message toast");
    assert_eq!(system.kind, NotificationKind::Info);
}

#[tokio::test(start_paused = true)]
async fn test_builtin_runs_after_user_handlers() {
    let transport = MockTransport::new();
    let sink = RecordingSink::new();
    let client = RealtimeClient::with_notifications(
        RealtimeConfig::default(),
        Arc::new(transport.clone()),
        sink.clone(),
    );
    let mut state_rx = client.state_receiver();
    client.connect();
    wait_for_state(&mut state_rx, ConnectionState::Connected).await;

    let saw_payload = Arc::new(Mutex::new(false));
    let saw_clone = saw_payload.clone();
    client.on_message("system_message", move |payload| {
        assert_eq!(payload["message"], "hello");
        *saw_clone.lock().unwrap() = true;
    });

    transport.inject(WireFrame::new("system_message", json!({"message": "hello"})));
    settle().await;

    assert!(*saw_payload.lock().unwrap());
    assert_eq!(sink.messages(), vec!["Connected to Autogent Studio", "hello"]);
}
