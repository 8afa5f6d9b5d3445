//! Application store: wizard drafts, session lifecycle and the realtime
//! event reducer.
//!
//! The store is plain data mutated through `&mut self`. It performs no I/O;
//! the session controller in `crew-client` owns one instance, issues the
//! backend calls and feeds every inbound event through [`AppStore::apply`].

use crew_api_types::{CrewEvent, ModelInfo, ToolInfo};
use uuid::Uuid;

use crate::types::{
    AgentDraft, AgentPatch, SessionStatus, TaskDraft, TaskPatch, DEFAULT_MODEL, FINAL_STEP,
    INITIAL_STEP,
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no active session")]
    NoSession,
    #[error("a session is already active ({0})")]
    SessionExists(String),
    #[error("cannot start a session in state {0}")]
    NotStartable(SessionStatus),
    #[error("unknown agent {0}")]
    UnknownAgent(Uuid),
    #[error("unknown task {0}")]
    UnknownTask(Uuid),
}

/// What applying one event did. Terminal variants are returned only for the
/// first terminal transition, so callers can hang one-shot reactions (leave
/// the execution view, print the result) on them safely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Appended to the log, nothing else.
    Logged,
    /// Progress step moved; not logged.
    StepChanged(u32),
    /// The run just completed.
    Completed,
    /// The run just failed.
    Failed,
    /// Unknown kind; state untouched.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct AppStore {
    session_id: Option<String>,
    status: SessionStatus,
    current_step: u32,

    agents: Vec<AgentDraft>,
    tasks: Vec<TaskDraft>,
    selected_model: String,
    topic: String,

    logs: Vec<CrewEvent>,
    result: Option<String>,
    is_running: bool,

    available_models: Vec<ModelInfo>,
    available_tools: Vec<ToolInfo>,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AppStore {
    pub fn new() -> Self {
        Self {
            session_id: None,
            status: SessionStatus::Idle,
            current_step: INITIAL_STEP,
            agents: Vec::new(),
            tasks: Vec::new(),
            selected_model: DEFAULT_MODEL.to_string(),
            topic: String::new(),
            logs: Vec::new(),
            result: None,
            is_running: false,
            available_models: Vec::new(),
            available_tools: Vec::new(),
        }
    }

    // ── Read-only projection ──

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn agents(&self) -> &[AgentDraft] {
        &self.agents
    }

    pub fn tasks(&self) -> &[TaskDraft] {
        &self.tasks
    }

    pub fn selected_model(&self) -> &str {
        &self.selected_model
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn logs(&self) -> &[CrewEvent] {
        &self.logs
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn available_models(&self) -> &[ModelInfo] {
        &self.available_models
    }

    pub fn available_tools(&self) -> &[ToolInfo] {
        &self.available_tools
    }

    /// Tasks whose agent name matches no current agent. Reported, never
    /// cleaned up.
    pub fn dangling_tasks(&self) -> Vec<&TaskDraft> {
        self.tasks
            .iter()
            .filter(|t| !self.agents.iter().any(|a| a.name == t.agent_name))
            .collect()
    }

    // ── Catalogs ──

    pub fn set_models(&mut self, models: Vec<ModelInfo>) {
        self.available_models = models;
    }

    pub fn set_tools(&mut self, tools: Vec<ToolInfo>) {
        self.available_tools = tools;
    }

    // ── Drafts ──

    pub fn add_agent(&mut self, agent: AgentDraft) -> Uuid {
        let id = agent.id;
        self.agents.push(agent);
        id
    }

    pub fn update_agent(&mut self, id: Uuid, patch: AgentPatch) -> Result<(), StoreError> {
        let agent = self
            .agents
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::UnknownAgent(id))?;
        patch.apply(agent);
        Ok(())
    }

    pub fn remove_agent(&mut self, id: Uuid) -> Result<AgentDraft, StoreError> {
        let idx = self
            .agents
            .iter()
            .position(|a| a.id == id)
            .ok_or(StoreError::UnknownAgent(id))?;
        Ok(self.agents.remove(idx))
    }

    pub fn add_task(&mut self, task: TaskDraft) -> Uuid {
        let id = task.id;
        self.tasks.push(task);
        id
    }

    pub fn update_task(&mut self, id: Uuid, patch: TaskPatch) -> Result<(), StoreError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::UnknownTask(id))?;
        patch.apply(task);
        Ok(())
    }

    pub fn remove_task(&mut self, id: Uuid) -> Result<TaskDraft, StoreError> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::UnknownTask(id))?;
        Ok(self.tasks.remove(idx))
    }

    pub fn set_model(&mut self, model_id: impl Into<String>) {
        self.selected_model = model_id.into();
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.topic = topic.into();
    }

    // ── Lifecycle ──

    /// `idle -> created`.
    pub fn session_created(&mut self, session_id: impl Into<String>) -> Result<(), StoreError> {
        if let Some(existing) = &self.session_id {
            return Err(StoreError::SessionExists(existing.clone()));
        }
        let session_id = session_id.into();
        tracing::info!(session = %session_id, "session created");
        self.session_id = Some(session_id);
        self.status = SessionStatus::Created;
        self.current_step = INITIAL_STEP;
        Ok(())
    }

    /// `created -> running`. Clears the log of any previous attempt.
    pub fn begin_run(&mut self) -> Result<(), StoreError> {
        if self.session_id.is_none() {
            return Err(StoreError::NoSession);
        }
        if !self.status.can_transition_to(&SessionStatus::Running) {
            return Err(StoreError::NotStartable(self.status));
        }
        self.logs.clear();
        self.is_running = true;
        self.status = SessionStatus::Running;
        Ok(())
    }

    /// The start calls failed; the session is finished.
    pub fn run_failed(&mut self) {
        self.is_running = false;
        self.status = SessionStatus::Error;
    }

    /// Fold one realtime event into the store. Total over every input.
    pub fn apply(&mut self, event: CrewEvent) -> Effect {
        let effect = match &event {
            CrewEvent::AgentStarted(_)
            | CrewEvent::AgentThinking(_)
            | CrewEvent::AgentAction(_)
            | CrewEvent::AgentCompleted(_)
            | CrewEvent::AgentCommunication(_)
            | CrewEvent::CrewStarted(_)
            | CrewEvent::TaskCreated(_)
            | CrewEvent::AgentCreated(_) => Effect::Logged,

            CrewEvent::CrewCompleted(_) if self.status == SessionStatus::Error => {
                tracing::debug!(session = ?self.session_id, "crew_completed after error, logged only");
                Effect::Logged
            }

            CrewEvent::CrewCompleted(detail) => {
                if let Some(result) = &detail.result {
                    self.result = Some(result.clone());
                }
                self.is_running = false;
                self.current_step = FINAL_STEP;
                if self.status == SessionStatus::Completed {
                    Effect::Logged
                } else {
                    tracing::info!(session = ?self.session_id, "crew completed");
                    self.status = SessionStatus::Completed;
                    Effect::Completed
                }
            }

            CrewEvent::Error(_) if self.status == SessionStatus::Completed => {
                tracing::debug!(session = ?self.session_id, "error after completion, logged only");
                Effect::Logged
            }

            CrewEvent::Error(detail) => {
                self.is_running = false;
                if self.status == SessionStatus::Error {
                    Effect::Logged
                } else {
                    tracing::error!(
                        session = ?self.session_id,
                        message = detail.message.as_deref().unwrap_or(""),
                        "crew reported an error"
                    );
                    self.status = SessionStatus::Error;
                    Effect::Failed
                }
            }

            CrewEvent::StepUpdate(detail) => match detail.step {
                Some(step) => {
                    self.current_step = step;
                    return Effect::StepChanged(step);
                }
                None => {
                    tracing::debug!("step_update without a step");
                    return Effect::Ignored;
                }
            },

            CrewEvent::Unknown { kind, .. } => {
                tracing::debug!(kind = %kind, "ignoring unknown event");
                return Effect::Ignored;
            }
        };

        self.logs.push(event);
        effect
    }

    /// Overwrite result and status from `GET /sessions/{id}/result`. Unknown
    /// server statuses leave the current status alone, and so does anything
    /// that would move a terminal session to another status.
    pub fn result_fetched(&mut self, result: Option<String>, status: &str) {
        self.result = result;
        if let Some(status) = SessionStatus::from_server(status) {
            if self.status.is_terminal() && status != self.status {
                tracing::debug!(current = %self.status, fetched = %status, "keeping terminal status");
                return;
            }
            self.status = status;
            if status.is_terminal() {
                self.is_running = false;
            }
        }
    }

    /// Back to `idle`, discarding everything session-scoped. The model and
    /// tool catalogs are kept.
    pub fn reset(&mut self) {
        let models = std::mem::take(&mut self.available_models);
        let tools = std::mem::take(&mut self.available_tools);
        *self = Self::new();
        self.available_models = models;
        self.available_tools = tools;
    }
}
