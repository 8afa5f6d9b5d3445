//! Derived views over the event log: who is working, who is done, and how
//! far the run has come. Pure functions; nothing here is stored.

use crew_api_types::CrewEvent;
use serde::Serialize;

use crate::types::AgentDraft;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Waiting,
    Working,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentActivity {
    pub name: String,
    pub status: AgentStatus,
    pub events: usize,
    pub actions: usize,
    pub thoughts: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_events: usize,
    pub completed_tasks: usize,
    pub actions: usize,
    pub thoughts: usize,
}

/// Per-agent status in agent order. An agent is done once any
/// `agent_completed` names it, working once it has any other event.
pub fn agent_activity(agents: &[AgentDraft], logs: &[CrewEvent]) -> Vec<AgentActivity> {
    agents
        .iter()
        .map(|agent| {
            let mine: Vec<&CrewEvent> = logs
                .iter()
                .filter(|e| e.agent() == Some(agent.name.as_str()))
                .collect();

            let status = if mine.iter().any(|e| matches!(e, CrewEvent::AgentCompleted(_))) {
                AgentStatus::Done
            } else if mine.is_empty() {
                AgentStatus::Waiting
            } else {
                AgentStatus::Working
            };

            AgentActivity {
                name: agent.name.clone(),
                status,
                events: mine.len(),
                actions: mine
                    .iter()
                    .filter(|e| matches!(e, CrewEvent::AgentAction(_)))
                    .count(),
                thoughts: mine
                    .iter()
                    .filter(|e| matches!(e, CrewEvent::AgentThinking(_)))
                    .count(),
            }
        })
        .collect()
}

/// Agent named by the most recent log entry that names one.
pub fn active_agent(logs: &[CrewEvent]) -> Option<&str> {
    logs.iter().rev().find_map(CrewEvent::agent)
}

/// Fraction of tasks finished, in `0.0..=1.0`. Zero tasks means no progress.
pub fn progress(logs: &[CrewEvent], task_count: usize) -> f64 {
    if task_count == 0 {
        return 0.0;
    }
    let done = logs
        .iter()
        .filter(|e| matches!(e, CrewEvent::AgentCompleted(_)))
        .count();
    (done as f64 / task_count as f64).min(1.0)
}

pub fn summary(logs: &[CrewEvent]) -> RunSummary {
    logs.iter().fold(
        RunSummary {
            total_events: logs.len(),
            ..RunSummary::default()
        },
        |mut acc, e| {
            match e {
                CrewEvent::AgentCompleted(_) => acc.completed_tasks += 1,
                CrewEvent::AgentAction(_) => acc.actions += 1,
                CrewEvent::AgentThinking(_) => acc.thoughts += 1,
                _ => {}
            }
            acc
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn log(values: &[serde_json::Value]) -> Vec<CrewEvent> {
        values
            .iter()
            .cloned()
            .map(|v| CrewEvent::from_value(v).unwrap())
            .collect()
    }

    fn crew() -> Vec<AgentDraft> {
        ["Researcher", "Writer", "Editor"]
            .into_iter()
            .map(|n| AgentDraft::new(n, "r", "g", "b"))
            .collect()
    }

    #[test]
    fn statuses_follow_the_log() {
        let logs = log(&[
            json!({"type": "agent_started", "agent": "Researcher"}),
            json!({"type": "agent_action", "agent": "Researcher", "tool": "internet_search"}),
            json!({"type": "agent_completed", "agent": "Researcher"}),
            json!({"type": "agent_thinking", "agent": "Writer"}),
        ]);

        let activity = agent_activity(&crew(), &logs);
        assert_eq!(activity[0].status, AgentStatus::Done);
        assert_eq!(activity[0].actions, 1);
        assert_eq!(activity[1].status, AgentStatus::Working);
        assert_eq!(activity[1].thoughts, 1);
        assert_eq!(activity[2].status, AgentStatus::Waiting);
        assert_eq!(activity[2].events, 0);
    }

    #[test]
    fn active_agent_is_latest_named() {
        let logs = log(&[
            json!({"type": "agent_started", "agent": "Writer"}),
            json!({"type": "crew_started"}),
        ]);
        assert_eq!(active_agent(&logs), Some("Writer"));
        assert_eq!(active_agent(&[]), None);
    }

    #[test]
    fn progress_is_capped() {
        let logs = log(&[
            json!({"type": "agent_completed", "agent": "A"}),
            json!({"type": "agent_completed", "agent": "B"}),
            json!({"type": "agent_completed", "agent": "C"}),
        ]);
        assert_eq!(progress(&logs, 0), 0.0);
        assert_eq!(progress(&logs, 6), 0.5);
        assert_eq!(progress(&logs, 2), 1.0);
    }

    #[test]
    fn summary_counts_kinds() {
        let logs = log(&[
            json!({"type": "agent_thinking", "agent": "A"}),
            json!({"type": "agent_action", "agent": "A"}),
            json!({"type": "agent_action", "agent": "A"}),
            json!({"type": "agent_completed", "agent": "A"}),
            json!({"type": "crew_completed", "result": "x"}),
        ]);
        let s = summary(&logs);
        assert_eq!(s.total_events, 5);
        assert_eq!(s.actions, 2);
        assert_eq!(s.thoughts, 1);
        assert_eq!(s.completed_tasks, 1);
    }
}
