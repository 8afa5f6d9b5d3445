use crew_api_types::{AgentPayload, TaskPayload};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Model selected when nothing else was chosen, and after a reset.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-05-20";

/// Progress step a fresh session starts at.
pub const INITIAL_STEP: u32 = 1;
/// Progress step reached once the crew has completed.
pub const FINAL_STEP: u32 = 5;

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Created,
    Running,
    Completed,
    Error,
}

impl SessionStatus {
    /// Returns `true` when a transition from `self` to `target` is valid.
    /// Reset to `Idle` is always allowed and not listed here.
    pub fn can_transition_to(&self, target: &SessionStatus) -> bool {
        matches!(
            (self, target),
            (SessionStatus::Idle, SessionStatus::Created)
                | (SessionStatus::Created, SessionStatus::Running)
                | (SessionStatus::Running, SessionStatus::Completed)
                | (SessionStatus::Running, SessionStatus::Error)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Error)
    }

    /// Map a backend status string. The backend tracks intermediate setup
    /// states that the client folds into `Created`.
    pub fn from_server(status: &str) -> Option<SessionStatus> {
        match status {
            "created" | "agents_defined" | "model_selected" | "tasks_defined" => {
                Some(SessionStatus::Created)
            }
            "running" => Some(SessionStatus::Running),
            "completed" => Some(SessionStatus::Completed),
            "error" => Some(SessionStatus::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Created => "created",
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Agent drafts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDraft {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    #[serde(default)]
    pub tools: Vec<String>,
}

impl AgentDraft {
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            tools: Vec::new(),
        }
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn to_payload(&self) -> AgentPayload {
        AgentPayload {
            name: self.name.clone(),
            role: self.role.clone(),
            goal: self.goal.clone(),
            backstory: self.backstory.clone(),
            tools: self.tools.clone(),
        }
    }
}

/// Partial update for an [`AgentDraft`]; `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct AgentPatch {
    pub name: Option<String>,
    pub role: Option<String>,
    pub goal: Option<String>,
    pub backstory: Option<String>,
    pub tools: Option<Vec<String>>,
}

impl AgentPatch {
    pub fn apply(self, agent: &mut AgentDraft) {
        if let Some(name) = self.name {
            agent.name = name;
        }
        if let Some(role) = self.role {
            agent.role = role;
        }
        if let Some(goal) = self.goal {
            agent.goal = goal;
        }
        if let Some(backstory) = self.backstory {
            agent.backstory = backstory;
        }
        if let Some(tools) = self.tools {
            agent.tools = tools;
        }
    }
}

// ---------------------------------------------------------------------------
// Task drafts
// ---------------------------------------------------------------------------

/// A unit of work bound to an agent *by name*. Renaming or removing the agent
/// does not touch the task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub id: Uuid,
    pub description: String,
    pub expected_output: String,
    pub agent_name: String,
}

impl TaskDraft {
    pub fn new(
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            expected_output: expected_output.into(),
            agent_name: agent_name.into(),
        }
    }

    pub fn to_payload(&self) -> TaskPayload {
        TaskPayload {
            description: self.description.clone(),
            expected_output: self.expected_output.clone(),
            agent_name: self.agent_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub description: Option<String>,
    pub expected_output: Option<String>,
    pub agent_name: Option<String>,
}

impl TaskPatch {
    pub fn apply(self, task: &mut TaskDraft) {
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(expected_output) = self.expected_output {
            task.expected_output = expected_output;
        }
        if let Some(agent_name) = self.agent_name {
            task.agent_name = agent_name;
        }
    }
}
