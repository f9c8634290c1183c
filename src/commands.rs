//! Outbound command surface.
//!
//! Typed wrappers over [`RealtimeClient::emit`](crate::client::RealtimeClient::emit)
//! so feature code speaks a domain vocabulary instead of raw event names and
//! payloads. Every wrapper stamps a fresh timestamp at send time and is
//! fire-and-forget: no result, no acknowledgment, dropped with a logged
//! warning while not connected.

use serde_json::Value;

use crate::client::RealtimeClient;
use crate::messages::{ClientEvent, Severity};

impl RealtimeClient {
    /// Re-send session identity; normally done automatically on (re)connect.
    pub fn authenticate(&self, user_id: &str, session_token: &str) {
        self.emit(ClientEvent::Authenticate {
            user_id: user_id.to_string(),
            session_token: session_token.to_string(),
        });
    }

    // ── Room management ──────────────────────────────────────────────

    pub fn join_room(&self, room_id: &str) {
        self.emit(ClientEvent::JoinRoom {
            room_id: room_id.to_string(),
        });
    }

    pub fn leave_room(&self, room_id: &str) {
        self.emit(ClientEvent::LeaveRoom {
            room_id: room_id.to_string(),
        });
    }

    pub fn join_chat_room(&self, room_id: &str) {
        self.emit(ClientEvent::JoinChatRoom {
            room_id: room_id.to_string(),
        });
    }

    pub fn leave_chat_room(&self, room_id: &str) {
        self.emit(ClientEvent::LeaveChatRoom {
            room_id: room_id.to_string(),
        });
    }

    // ── Chat ─────────────────────────────────────────────────────────

    pub fn send_chat_message(&self, room_id: &str, message: &str) {
        self.emit(ClientEvent::SendMessage {
            room_id: room_id.to_string(),
            message: message.to_string(),
        });
    }

    pub fn start_typing(&self, room_id: &str) {
        self.emit(ClientEvent::TypingStart {
            room_id: room_id.to_string(),
        });
    }

    pub fn stop_typing(&self, room_id: &str) {
        self.emit(ClientEvent::TypingStop {
            room_id: room_id.to_string(),
        });
    }

    // ── Workflow orchestration ───────────────────────────────────────

    pub fn update_workflow(&self, workflow_id: &str, data: Value) {
        self.emit(ClientEvent::WorkflowUpdate {
            workflow_id: workflow_id.to_string(),
            data,
        });
    }

    pub fn execute_workflow(&self, workflow_id: &str) {
        self.emit(ClientEvent::ExecuteWorkflow {
            workflow_id: workflow_id.to_string(),
        });
    }

    // ── Quantum computing ────────────────────────────────────────────

    pub fn update_quantum_circuit(&self, circuit_id: &str, circuit_data: Value) {
        self.emit(ClientEvent::QuantumCircuitUpdate {
            circuit_id: circuit_id.to_string(),
            circuit_data,
        });
    }

    pub fn execute_quantum_circuit(&self, circuit_id: &str, parameters: Value) {
        self.emit(ClientEvent::ExecuteQuantumCircuit {
            circuit_id: circuit_id.to_string(),
            parameters,
        });
    }

    // ── Federated learning ───────────────────────────────────────────

    pub fn update_training_status(&self, training_id: &str, status: &str, progress: f64) {
        self.emit(ClientEvent::FederatedTrainingStatus {
            training_id: training_id.to_string(),
            status: status.to_string(),
            progress,
        });
    }

    pub fn register_federated_node(&self, node_id: &str, node_info: Value) {
        self.emit(ClientEvent::RegisterFederatedNode {
            node_id: node_id.to_string(),
            node_info,
        });
    }

    // ── Neuromorphic computing ───────────────────────────────────────

    pub fn send_spike_data(&self, device_id: &str, spike_data: Value) {
        self.emit(ClientEvent::NeuromorphicSpikeData {
            device_id: device_id.to_string(),
            spike_data,
        });
    }

    pub fn update_neuromorphic_device(&self, device_id: &str, status: &str) {
        self.emit(ClientEvent::NeuromorphicDeviceUpdate {
            device_id: device_id.to_string(),
            status: status.to_string(),
        });
    }

    // ── AI safety ────────────────────────────────────────────────────

    pub fn report_safety_alert(&self, alert_type: &str, severity: Severity, message: &str) {
        self.emit(ClientEvent::SafetyAlert {
            alert_type: alert_type.to_string(),
            severity,
            message: message.to_string(),
        });
    }

    pub fn request_alignment_test(&self, model_id: &str, test_type: &str) {
        self.emit(ClientEvent::RequestAlignmentTest {
            model_id: model_id.to_string(),
            test_type: test_type.to_string(),
        });
    }

    // ── Research and discovery ───────────────────────────────────────

    pub fn update_research_progress(&self, project_id: &str, progress: f64, discovery: Option<Value>) {
        self.emit(ClientEvent::ResearchProgress {
            project_id: project_id.to_string(),
            progress,
            discovery,
        });
    }

    pub fn report_discovery(&self, project_id: &str, discovery: Value) {
        self.emit(ClientEvent::ReportDiscovery {
            project_id: project_id.to_string(),
            discovery,
        });
    }

    // ── Blockchain ───────────────────────────────────────────────────

    pub fn broadcast_transaction(&self, transaction_data: Value) {
        self.emit(ClientEvent::BlockchainTransaction { transaction_data });
    }

    pub fn mint_nft(&self, nft_data: Value) {
        self.emit(ClientEvent::MintNft { nft_data });
    }
}
