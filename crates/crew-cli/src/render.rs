//! One-line rendering of realtime events for the terminal.

use crew_api_types::{CrewEvent, EventDetail};

/// `HH:MM:SS` out of an RFC 3339 timestamp, or blanks.
fn clock(event: &CrewEvent) -> String {
    event
        .timestamp()
        .and_then(|ts| ts.get(11..19))
        .unwrap_or("        ")
        .to_string()
}

fn or<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    value.as_deref().unwrap_or(fallback)
}

fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{cut}...")
}

fn body(event: &CrewEvent) -> String {
    let empty = EventDetail::default();
    let d = event.detail().unwrap_or(&empty);
    let agent = or(&d.agent, "?");

    match event {
        CrewEvent::CrewStarted(_) => format!("crew started{}", suffix(&d.message)),
        CrewEvent::AgentCreated(_) => format!("agent {agent} ready"),
        CrewEvent::TaskCreated(_) => match (d.task_number, d.total_tasks) {
            (Some(n), Some(total)) => format!("task {n}/{total}: {}", truncate(or(&d.task, ""), 80)),
            _ => format!("task: {}", truncate(or(&d.task, or(&d.message, "")), 80)),
        },
        CrewEvent::AgentStarted(_) => format!("{agent} started{}", suffix(&d.task)),
        CrewEvent::AgentThinking(_) => {
            let thought = d.thought.as_ref().or(d.message.as_ref());
            format!("{agent} thinking: {}", truncate(thought.map_or("", String::as_str), 100))
        }
        CrewEvent::AgentAction(_) => {
            let what = d.tool.as_ref().or(d.action.as_ref()).or(d.message.as_ref());
            format!("{agent} -> {}", truncate(what.map_or("", String::as_str), 100))
        }
        CrewEvent::AgentCompleted(_) => format!("{agent} done{}", suffix(&d.output)),
        CrewEvent::AgentCommunication(_) => format!(
            "{} => {}: {}",
            or(&d.from, "?"),
            or(&d.to, "?"),
            truncate(or(&d.message, ""), 100)
        ),
        CrewEvent::CrewCompleted(_) => match d.result_length {
            Some(len) => format!("crew completed ({len} chars)"),
            None => "crew completed".to_string(),
        },
        CrewEvent::Error(_) => format!("ERROR: {}", or(&d.message, "unknown error")),
        CrewEvent::StepUpdate(_) => match d.step {
            Some(step) => format!("step {step}"),
            None => "step update".to_string(),
        },
        CrewEvent::Unknown { kind, .. } if kind.is_empty() => "(untyped event)".to_string(),
        CrewEvent::Unknown { kind, .. } => format!("({kind})"),
    }
}

fn suffix(value: &Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => format!(": {}", truncate(text, 80)),
        _ => String::new(),
    }
}

pub fn format_event(event: &CrewEvent) -> String {
    format!("{} {}", clock(event), body(event))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ev(value: serde_json::Value) -> CrewEvent {
        CrewEvent::from_value(value).unwrap()
    }

    #[test]
    fn shows_clock_from_timestamp() {
        let line = format_event(&ev(json!({
            "type": "agent_started",
            "agent": "Writer",
            "timestamp": "2025-05-01T09:15:42.123Z"
        })));
        assert_eq!(line, "09:15:42 Writer started");
    }

    #[test]
    fn missing_timestamp_keeps_alignment() {
        let line = format_event(&ev(json!({"type": "crew_started"})));
        assert_eq!(line, "         crew started");
    }

    #[test]
    fn communication_and_errors() {
        let line = body(&ev(json!({
            "type": "agent_communication", "from": "Researcher", "to": "Writer", "message": "notes attached"
        })));
        assert_eq!(line, "Researcher => Writer: notes attached");

        assert_eq!(body(&ev(json!({"type": "error"}))), "ERROR: unknown error");
    }

    #[test]
    fn long_thoughts_are_truncated() {
        let thought = "x".repeat(300);
        let line = body(&ev(json!({"type": "agent_thinking", "agent": "A", "thought": thought})));
        assert!(line.ends_with("..."));
        assert!(line.len() < 130);
    }

    #[test]
    fn tasks_with_numbers() {
        let line = body(&ev(json!({
            "type": "task_created", "task": "Write intro", "task_number": 1, "total_tasks": 3
        })));
        assert_eq!(line, "task 1/3: Write intro");
    }

    #[test]
    fn unknown_kinds_are_named() {
        assert_eq!(body(&ev(json!({"type": "heartbeat"}))), "(heartbeat)");
        assert_eq!(body(&ev(json!({"no_type": true}))), "(untyped event)");
    }
}
