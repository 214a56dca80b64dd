//! Agent inventory and assignment models

use serde::{Deserialize, Serialize};

/// Connection status reported by the monitoring backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Active,
    Disconnected,
    Pending,
    NeverConnected,
    #[serde(other)]
    Unknown,
}

/// One monitored endpoint from the inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    pub status: AgentStatus,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
}

/// Maps one user to one agent. A user may hold multiple assignments.
/// Created by an external admin action; read-only to this core.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AgentAssignment {
    pub user_email: String,
    /// Zero-padded to width 3.
    pub agent_id: String,
    pub agent_name: String,
}
