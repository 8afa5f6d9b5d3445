//! Drives one crew session end to end.
//!
//! The controller owns the [`AppStore`], the [`Wizard`] cursor and the
//! session's [`RealtimeChannel`]. Every state change goes through a method
//! here; callers only ever see `&AppStore`.

use crew_api_types::{CrewEvent, ResultResponse, SessionStats};
use crew_core::config::{ApiConfig, RealtimeConfig};
use crew_core::presets;
use crew_core::store::{AppStore, Effect, StoreError};
use crew_core::types::{AgentDraft, AgentPatch, TaskDraft, TaskPatch};
use crew_core::wizard::{StepAction, Wizard, WizardStep};
use uuid::Uuid;

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::realtime::{ConnectionState, RealtimeChannel};

/// Outcome of a successful [`SessionController::advance_wizard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The step was persisted and the cursor moved.
    Step(WizardStep),
    /// Review was left; the run has been started.
    Started,
}

#[derive(Debug)]
pub struct SessionController {
    api: ApiClient,
    api_config: ApiConfig,
    realtime: RealtimeConfig,
    store: AppStore,
    wizard: Wizard,
    channel: Option<RealtimeChannel>,
}

impl SessionController {
    pub fn new(api: ApiClient, api_config: ApiConfig, realtime: RealtimeConfig) -> Self {
        Self {
            api,
            api_config,
            realtime,
            store: AppStore::new(),
            wizard: Wizard::new(),
            channel: None,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn connection_state(&self) -> Option<ConnectionState> {
        self.channel.as_ref().map(RealtimeChannel::state)
    }

    // ── Catalogs ──

    /// Fetch models and tools. A failed catalog leaves the previous one in
    /// place and is only logged.
    pub async fn load_catalogs(&mut self) {
        match self.api.list_models().await {
            Ok(models) => self.store.set_models(models),
            Err(e) => tracing::warn!(error = %e, "could not load models"),
        }
        match self.api.list_tools().await {
            Ok(tools) => self.store.set_tools(tools),
            Err(e) => tracing::warn!(error = %e, "could not load tools"),
        }
    }

    // ── Session ──

    /// Create a backend session and open its realtime channel. Returns once
    /// the first connection attempt has settled, so no event emitted after
    /// `start` can be missed.
    pub async fn create_session(&mut self) -> Result<String, ClientError> {
        if let Some(existing) = self.store.session_id() {
            return Err(StoreError::SessionExists(existing.to_string()).into());
        }
        let session_id = self.api.create_session().await?;
        self.store.session_created(session_id.clone())?;

        let url = self.api_config.session_ws_url(&session_id);
        let channel = RealtimeChannel::connect(url, &self.realtime);
        if let ConnectionState::Failed(reason) = channel.ready().await {
            tracing::warn!(
                session = %session_id,
                url = %channel.url(),
                error = %reason,
                "realtime channel unavailable"
            );
        }
        self.channel = Some(channel);
        Ok(session_id)
    }

    // ── Drafts ──

    pub fn add_agent(&mut self, agent: AgentDraft) -> Uuid {
        self.store.add_agent(agent)
    }

    pub fn update_agent(&mut self, id: Uuid, patch: AgentPatch) -> Result<(), ClientError> {
        Ok(self.store.update_agent(id, patch)?)
    }

    pub fn remove_agent(&mut self, id: Uuid) -> Result<AgentDraft, ClientError> {
        Ok(self.store.remove_agent(id)?)
    }

    pub fn add_task(&mut self, task: TaskDraft) -> Uuid {
        self.store.add_task(task)
    }

    pub fn update_task(&mut self, id: Uuid, patch: TaskPatch) -> Result<(), ClientError> {
        Ok(self.store.update_task(id, patch)?)
    }

    pub fn remove_task(&mut self, id: Uuid) -> Result<TaskDraft, ClientError> {
        Ok(self.store.remove_task(id)?)
    }

    pub fn set_model(&mut self, model_id: impl Into<String>) {
        self.store.set_model(model_id);
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.store.set_topic(topic);
    }

    /// Append the researcher/writer/editor preset.
    pub fn load_default_agents(&mut self) {
        for agent in presets::default_agents() {
            self.store.add_agent(agent);
        }
    }

    // ── Wizard ──

    /// Persist the current step, then move on. Nothing advances if the gate
    /// or the write fails. `api_key` is attached before the run starts.
    pub async fn advance_wizard(&mut self, api_key: Option<&str>) -> Result<Advance, ClientError> {
        let action = self.wizard.plan(&self.store)?;
        let session_id = self.require_session()?;

        match action {
            StepAction::SaveAgents => {
                let agents: Vec<_> = self.store.agents().iter().map(AgentDraft::to_payload).collect();
                self.api.save_agents(&session_id, &agents).await?;
            }
            StepAction::SaveModel => {
                self.api
                    .save_model(&session_id, self.store.selected_model())
                    .await?;
            }
            StepAction::SaveTasks => {
                let tasks: Vec<_> = self.store.tasks().iter().map(TaskDraft::to_payload).collect();
                self.api.save_tasks(&session_id, &tasks).await?;
            }
            StepAction::Start => {
                self.start(api_key).await?;
                return Ok(Advance::Started);
            }
        }

        match self.wizard.complete_step() {
            Some(step) => Ok(Advance::Step(step)),
            None => Ok(Advance::Started),
        }
    }

    /// Move the cursor back one step. Already-persisted data is untouched.
    pub fn back_wizard(&mut self) -> bool {
        self.wizard.back()
    }

    /// `created -> running`, then attach the key (when there is one) and
    /// post `start`. Either call failing ends the session in `error`.
    pub async fn start(&mut self, api_key: Option<&str>) -> Result<(), ClientError> {
        let session_id = self.require_session()?;
        self.store.begin_run()?;
        tracing::info!(session = %session_id, topic = self.store.topic(), "starting crew");

        if let Err(e) = self.post_start(&session_id, api_key).await {
            tracing::error!(session = %session_id, error = %e, "could not start crew");
            self.store.run_failed();
            return Err(e);
        }
        Ok(())
    }

    async fn post_start(&self, session_id: &str, api_key: Option<&str>) -> Result<(), ClientError> {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.api.set_api_key(session_id, key).await?;
        }
        self.api.start(session_id, self.store.topic()).await
    }

    fn require_session(&self) -> Result<String, ClientError> {
        self.store
            .session_id()
            .map(str::to_string)
            .ok_or(ClientError::Store(StoreError::NoSession))
    }

    // ── Realtime ──

    /// Apply every buffered event without waiting. Returns the effects in
    /// arrival order.
    pub fn pump(&mut self) -> Vec<Effect> {
        let Some(channel) = &self.channel else {
            return Vec::new();
        };
        let mut effects = Vec::new();
        while let Some(event) = channel.try_recv() {
            effects.push(self.store.apply(event));
        }
        effects
    }

    /// Wait for the next event, apply it, and hand back a copy with its
    /// effect. `None` when there is no channel or it has closed and drained.
    pub async fn next_event(&mut self) -> Option<(CrewEvent, Effect)> {
        let event = self.channel.as_ref()?.recv().await?;
        let effect = self.store.apply(event.clone());
        Some((event, effect))
    }

    // ── Read-back ──

    /// Pull the final result over REST and fold it into the store.
    pub async fn fetch_result(&mut self) -> Result<ResultResponse, ClientError> {
        let session_id = self.require_session()?;
        let resp = self.api.fetch_result(&session_id).await?;
        self.store.result_fetched(resp.result.clone(), &resp.status);
        Ok(resp)
    }

    pub async fn stats(&self) -> Result<SessionStats, ClientError> {
        let session_id = self.require_session()?;
        self.api.fetch_stats(&session_id).await
    }

    /// Close the channel and return to `idle`.
    pub fn reset(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
        self.store.reset();
        self.wizard.reset();
        tracing::info!("session reset");
    }
}
