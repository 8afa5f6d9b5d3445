//! Linear four-step crew setup: agents, model, tasks, review.
//!
//! The wizard is only a cursor plus gate logic. It decides which backend
//! write has to succeed before the cursor may move; the controller performs
//! that write and then calls [`Wizard::complete_step`].

use crate::store::AppStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    #[default]
    Agents,
    Model,
    Tasks,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::Agents,
        WizardStep::Model,
        WizardStep::Tasks,
        WizardStep::Review,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::Agents => "agents",
            WizardStep::Model => "model",
            WizardStep::Tasks => "tasks",
            WizardStep::Review => "review",
        }
    }

    fn next(self) -> Option<WizardStep> {
        Self::ALL.get(self.index() + 1).copied()
    }

    fn prev(self) -> Option<WizardStep> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }
}

/// What has to happen before the cursor leaves the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    SaveAgents,
    SaveModel,
    SaveTasks,
    /// Leaving review starts the run.
    Start,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("add at least one agent before continuing")]
    NoAgents,
    #[error("add at least one task before continuing")]
    NoTasks,
}

#[derive(Debug, Clone, Default)]
pub struct Wizard {
    step: WizardStep,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn can_advance(&self, store: &AppStore) -> bool {
        self.plan(store).is_ok()
    }

    /// Gate check plus the write that must precede advancing.
    pub fn plan(&self, store: &AppStore) -> Result<StepAction, WizardError> {
        match self.step {
            WizardStep::Agents if store.agents().is_empty() => Err(WizardError::NoAgents),
            WizardStep::Agents => Ok(StepAction::SaveAgents),
            WizardStep::Model => Ok(StepAction::SaveModel),
            WizardStep::Tasks if store.tasks().is_empty() => Err(WizardError::NoTasks),
            WizardStep::Tasks => Ok(StepAction::SaveTasks),
            WizardStep::Review => Ok(StepAction::Start),
        }
    }

    /// Move forward after the planned write succeeded. Returns the new step,
    /// or `None` when leaving review (the run has begun).
    pub fn complete_step(&mut self) -> Option<WizardStep> {
        let next = self.step.next()?;
        self.step = next;
        Some(next)
    }

    /// Show the previous step. Nothing already persisted is reopened.
    pub fn back(&mut self) -> bool {
        match self.step.prev() {
            Some(prev) => {
                self.step = prev;
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.step = WizardStep::Agents;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgentDraft, TaskDraft};

    #[test]
    fn agents_step_needs_an_agent() {
        let mut store = AppStore::new();
        let wizard = Wizard::new();
        assert_eq!(wizard.plan(&store), Err(WizardError::NoAgents));
        assert!(!wizard.can_advance(&store));

        store.add_agent(AgentDraft::new("A", "r", "g", "b"));
        assert_eq!(wizard.plan(&store), Ok(StepAction::SaveAgents));
    }

    #[test]
    fn model_step_always_passes() {
        let store = AppStore::new();
        let mut wizard = Wizard::new();
        wizard.complete_step();
        assert_eq!(wizard.step(), WizardStep::Model);
        assert_eq!(wizard.plan(&store), Ok(StepAction::SaveModel));
    }

    #[test]
    fn tasks_step_needs_a_task() {
        let mut store = AppStore::new();
        let mut wizard = Wizard::new();
        wizard.complete_step();
        wizard.complete_step();
        assert_eq!(wizard.plan(&store), Err(WizardError::NoTasks));

        store.add_task(TaskDraft::new("d", "e", "A"));
        assert_eq!(wizard.plan(&store), Ok(StepAction::SaveTasks));
    }

    #[test]
    fn review_starts_and_has_no_next_step() {
        let store = AppStore::new();
        let mut wizard = Wizard::new();
        for expected in [WizardStep::Model, WizardStep::Tasks, WizardStep::Review] {
            assert_eq!(wizard.complete_step(), Some(expected));
        }
        assert_eq!(wizard.plan(&store), Ok(StepAction::Start));
        assert_eq!(wizard.complete_step(), None);
        assert_eq!(wizard.step(), WizardStep::Review);
    }

    #[test]
    fn back_stops_at_first_step() {
        let mut wizard = Wizard::new();
        assert!(!wizard.back());
        wizard.complete_step();
        assert!(wizard.back());
        assert_eq!(wizard.step(), WizardStep::Agents);
    }
}
