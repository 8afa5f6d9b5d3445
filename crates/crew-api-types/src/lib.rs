//! Wire types shared by the crew-studio client crates.
//!
//! Request and response bodies for the crew backend's REST surface, plus the
//! realtime event union in [`events`].

use serde::{Deserialize, Serialize};

pub mod events;

pub use events::{CrewEvent, EventDecodeError, EventDetail};

// ── Catalog ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub badge: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsResponse {
    #[serde(default)]
    pub tools: Vec<ToolInfo>,
}

// ── Session setup ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// One agent as the backend receives it on `POST /sessions/{id}/agents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPayload {
    pub name: String,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    #[serde(default)]
    pub tools: Vec<String>,
}

/// One task as the backend receives it on `POST /sessions/{id}/tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub description: String,
    pub expected_output: String,
    pub agent_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPayload {
    pub model_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyPayload {
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartPayload {
    pub topic: String,
}

// ── Session read-back ──

/// `GET /sessions/{id}`. The backend also echoes the attached key; it is
/// deliberately not modelled so it never ends up in client memory twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub agents: Vec<AgentPayload>,
    #[serde(default)]
    pub tasks: Vec<TaskPayload>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub current_step: u32,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// `GET /sessions/{id}/result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultResponse {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub logs: Vec<serde_json::Value>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStats {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub tasks_completed: u64,
    #[serde(default)]
    pub messages_sent: u64,
}

/// `GET /sessions/{id}/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub total_agents: u64,
    #[serde(default)]
    pub total_tasks: u64,
    #[serde(default)]
    pub agent_stats: Vec<AgentStats>,
    #[serde(default)]
    pub total_logs: u64,
}

// ── Settings ──

/// `POST /settings/validate-key` response. A missing `valid` field counts as
/// a rejection, not as an unreachable validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateKeyResponse {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub message: Option<String>,
}
