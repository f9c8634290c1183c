//! Wire-level event vocabulary.
//!
//! Every frame on the wire is a JSON envelope `{ "event": <name>, "data":
//! <object> }`. Outbound events are the closed [`ClientEvent`] enum; inbound
//! events are [`ServerEvent`], with an `Other` escape hatch so handlers can
//! be registered for names this build does not know about yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RealtimeError;

/// Dispatched locally when the transport closes; payload `{ "reason": ... }`.
pub const CONNECTION_CLOSED: &str = "connection:closed";

/// Dispatched locally when reconnection attempts are exhausted; payload
/// `{ "attempts": ... }`.
pub const CONNECTION_EXHAUSTED: &str = "connection:exhausted";

/// Every server event name this build recognizes, in wire form.
pub const ALL_SERVER_EVENTS: &[&str] = &[
    "new_message",
    "user_typing",
    "workflow_updated",
    "workflow_execution_status",
    "quantum_circuit_updated",
    "quantum_execution_complete",
    "training_status_updated",
    "federated_node_status",
    "spike_data_received",
    "neuromorphic_device_status",
    "safety_alert_broadcast",
    "alignment_test_result",
    "research_progress_updated",
    "discovery_made",
    "transaction_confirmed",
    "nft_minted",
    "system_message",
    "notification",
    "file_processed",
    "knowledge_base_updated",
];

/// Raw envelope carried in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl WireFrame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

// ── Outbound events ──────────────────────────────────────────────────

/// Events this client sends to the backend.
///
/// Serializes to the wire envelope directly; the variant name is the wire
/// event name. The envelope timestamp is stamped by [`ClientEvent::into_frame`]
/// at send time, never ahead of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Authenticate {
        user_id: String,
        session_token: String,
    },
    JoinRoom {
        room_id: String,
    },
    LeaveRoom {
        room_id: String,
    },
    JoinChatRoom {
        room_id: String,
    },
    LeaveChatRoom {
        room_id: String,
    },
    SendMessage {
        room_id: String,
        message: String,
    },
    TypingStart {
        room_id: String,
    },
    TypingStop {
        room_id: String,
    },
    WorkflowUpdate {
        workflow_id: String,
        data: Value,
    },
    ExecuteWorkflow {
        workflow_id: String,
    },
    QuantumCircuitUpdate {
        circuit_id: String,
        circuit_data: Value,
    },
    ExecuteQuantumCircuit {
        circuit_id: String,
        parameters: Value,
    },
    FederatedTrainingStatus {
        training_id: String,
        status: String,
        progress: f64,
    },
    RegisterFederatedNode {
        node_id: String,
        node_info: Value,
    },
    NeuromorphicSpikeData {
        device_id: String,
        spike_data: Value,
    },
    NeuromorphicDeviceUpdate {
        device_id: String,
        status: String,
    },
    SafetyAlert {
        alert_type: String,
        severity: Severity,
        message: String,
    },
    RequestAlignmentTest {
        model_id: String,
        test_type: String,
    },
    ResearchProgress {
        project_id: String,
        progress: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        discovery: Option<Value>,
    },
    ReportDiscovery {
        project_id: String,
        discovery: Value,
    },
    BlockchainTransaction {
        transaction_data: Value,
    },
    MintNft {
        nft_data: Value,
    },
    Heartbeat,
}

impl ClientEvent {
    /// Build the outbound envelope, stamping `timestamp` into the payload.
    ///
    /// Every emitted action carries an ISO-8601 timestamp generated at send
    /// time; the payload object is created here even for events whose domain
    /// payload is empty (`heartbeat`).
    pub fn into_frame(self, timestamp: DateTime<Utc>) -> Result<WireFrame, RealtimeError> {
        let value = serde_json::to_value(&self)?;
        let mut envelope = match value {
            Value::Object(map) => map,
            other => {
                return Err(RealtimeError::SendFailed(format!(
                    "outbound event serialized to non-object: {other}"
                )))
            }
        };

        let event = envelope
            .remove("event")
            .and_then(|v| v.as_str().map(String::from))
            .ok_or_else(|| RealtimeError::SendFailed("outbound event missing tag".into()))?;

        let mut data = match envelope.remove("data") {
            Some(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        data.insert(
            "timestamp".to_string(),
            Value::String(timestamp.to_rfc3339()),
        );

        Ok(WireFrame::new(event, Value::Object(data)))
    }
}

// ── Inbound events ───────────────────────────────────────────────────

/// Events the backend pushes to this client.
///
/// Payloads are feature-defined JSON except where the backend contract pins
/// a shape ([`SafetyAlertPayload`], [`NotificationPayload`]). Unknown event
/// names land in `Other` and still flow through generic dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    NewMessage(Value),
    UserTyping(Value),
    WorkflowUpdated(Value),
    WorkflowExecutionStatus(Value),
    QuantumCircuitUpdated(Value),
    QuantumExecutionComplete(Value),
    TrainingStatusUpdated(Value),
    FederatedNodeStatus(Value),
    SpikeDataReceived(Value),
    NeuromorphicDeviceStatus(Value),
    SafetyAlertBroadcast(Value),
    AlignmentTestResult(Value),
    ResearchProgressUpdated(Value),
    DiscoveryMade(Value),
    TransactionConfirmed(Value),
    NftMinted(Value),
    SystemMessage(Value),
    Notification(Value),
    FileProcessed(Value),
    KnowledgeBaseUpdated(Value),
    Other { event: String, data: Value },
}

impl ServerEvent {
    /// Classify an inbound frame. Never fails; unrecognized names become
    /// `Other` so that forward-compatible handlers still fire.
    pub fn from_frame(frame: WireFrame) -> Self {
        let WireFrame { event, data } = frame;
        match event.as_str() {
            "new_message" => ServerEvent::NewMessage(data),
            "user_typing" => ServerEvent::UserTyping(data),
            "workflow_updated" => ServerEvent::WorkflowUpdated(data),
            "workflow_execution_status" => ServerEvent::WorkflowExecutionStatus(data),
            "quantum_circuit_updated" => ServerEvent::QuantumCircuitUpdated(data),
            "quantum_execution_complete" => ServerEvent::QuantumExecutionComplete(data),
            "training_status_updated" => ServerEvent::TrainingStatusUpdated(data),
            "federated_node_status" => ServerEvent::FederatedNodeStatus(data),
            "spike_data_received" => ServerEvent::SpikeDataReceived(data),
            "neuromorphic_device_status" => ServerEvent::NeuromorphicDeviceStatus(data),
            "safety_alert_broadcast" => ServerEvent::SafetyAlertBroadcast(data),
            "alignment_test_result" => ServerEvent::AlignmentTestResult(data),
            "research_progress_updated" => ServerEvent::ResearchProgressUpdated(data),
            "discovery_made" => ServerEvent::DiscoveryMade(data),
            "transaction_confirmed" => ServerEvent::TransactionConfirmed(data),
            "nft_minted" => ServerEvent::NftMinted(data),
            "system_message" => ServerEvent::SystemMessage(data),
            "notification" => ServerEvent::Notification(data),
            "file_processed" => ServerEvent::FileProcessed(data),
            "knowledge_base_updated" => ServerEvent::KnowledgeBaseUpdated(data),
            _ => ServerEvent::Other { event, data },
        }
    }

    /// Wire name of this event, used as the dispatch key.
    pub fn name(&self) -> &str {
        match self {
            ServerEvent::NewMessage(_) => "new_message",
            ServerEvent::UserTyping(_) => "user_typing",
            ServerEvent::WorkflowUpdated(_) => "workflow_updated",
            ServerEvent::WorkflowExecutionStatus(_) => "workflow_execution_status",
            ServerEvent::QuantumCircuitUpdated(_) => "quantum_circuit_updated",
            ServerEvent::QuantumExecutionComplete(_) => "quantum_execution_complete",
            ServerEvent::TrainingStatusUpdated(_) => "training_status_updated",
            ServerEvent::FederatedNodeStatus(_) => "federated_node_status",
            ServerEvent::SpikeDataReceived(_) => "spike_data_received",
            ServerEvent::NeuromorphicDeviceStatus(_) => "neuromorphic_device_status",
            ServerEvent::SafetyAlertBroadcast(_) => "safety_alert_broadcast",
            ServerEvent::AlignmentTestResult(_) => "alignment_test_result",
            ServerEvent::ResearchProgressUpdated(_) => "research_progress_updated",
            ServerEvent::DiscoveryMade(_) => "discovery_made",
            ServerEvent::TransactionConfirmed(_) => "transaction_confirmed",
            ServerEvent::NftMinted(_) => "nft_minted",
            ServerEvent::SystemMessage(_) => "system_message",
            ServerEvent::Notification(_) => "notification",
            ServerEvent::FileProcessed(_) => "file_processed",
            ServerEvent::KnowledgeBaseUpdated(_) => "knowledge_base_updated",
            ServerEvent::Other { event, .. } => event,
        }
    }

    /// Raw payload, regardless of variant.
    pub fn data(&self) -> &Value {
        match self {
            ServerEvent::NewMessage(data)
            | ServerEvent::UserTyping(data)
            | ServerEvent::WorkflowUpdated(data)
            | ServerEvent::WorkflowExecutionStatus(data)
            | ServerEvent::QuantumCircuitUpdated(data)
            | ServerEvent::QuantumExecutionComplete(data)
            | ServerEvent::TrainingStatusUpdated(data)
            | ServerEvent::FederatedNodeStatus(data)
            | ServerEvent::SpikeDataReceived(data)
            | ServerEvent::NeuromorphicDeviceStatus(data)
            | ServerEvent::AlignmentTestResult(data)
            | ServerEvent::ResearchProgressUpdated(data)
            | ServerEvent::DiscoveryMade(data)
            | ServerEvent::TransactionConfirmed(data)
            | ServerEvent::NftMinted(data)
            | ServerEvent::SafetyAlertBroadcast(data)
            | ServerEvent::SystemMessage(data)
            | ServerEvent::Notification(data)
            | ServerEvent::FileProcessed(data)
            | ServerEvent::KnowledgeBaseUpdated(data)
            | ServerEvent::Other { data, .. } => data,
        }
    }
}

// ── Pinned payload shapes ────────────────────────────────────────────

/// Payload of `safety_alert_broadcast`.
///
/// `severity` stays a string on the wire; the backend occasionally invents
/// new levels and unknown ones fall back to the default icon.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SafetyAlertPayload {
    pub alert_type: String,
    pub severity: String,
    pub message: String,
}

/// Payload of `system_message` and `notification`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NotificationPayload {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Severity levels of a safety alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    /// Icon shown in the built-in safety alert toast.
    pub fn icon(self) -> &'static str {
        match self {
            Severity::Low => "⚠️",
            Severity::Medium => "🚨",
            Severity::High => "🔴",
            Severity::Critical => "💀",
        }
    }
}
