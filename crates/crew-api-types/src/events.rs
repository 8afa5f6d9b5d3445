//! Realtime events pushed by the crew backend over the session WebSocket.
//!
//! Every frame is a JSON object discriminated by its `type` field. Known
//! kinds decode into a [`CrewEvent`] variant carrying an [`EventDetail`];
//! anything else is preserved verbatim as [`CrewEvent::Unknown`] so a newer
//! backend never breaks an older client.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Fields shared by all known event kinds. Which ones are populated depends
/// on the kind; everything the client does not model lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tasks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_length: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One realtime message from the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum CrewEvent {
    AgentStarted(EventDetail),
    AgentThinking(EventDetail),
    AgentAction(EventDetail),
    AgentCompleted(EventDetail),
    AgentCommunication(EventDetail),
    CrewStarted(EventDetail),
    TaskCreated(EventDetail),
    AgentCreated(EventDetail),
    CrewCompleted(EventDetail),
    Error(EventDetail),
    StepUpdate(EventDetail),
    /// A kind this client does not know. `kind` is empty when the frame had
    /// no string `type` at all.
    Unknown { kind: String, raw: Value },
}

#[derive(Debug, thiserror::Error)]
pub enum EventDecodeError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed `{kind}` event: {source}")]
    Fields {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CrewEvent {
    /// Decode a raw text frame.
    pub fn from_json(text: &str) -> Result<Self, EventDecodeError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Decode an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, EventDecodeError> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Ok(CrewEvent::Unknown {
                    kind: String::new(),
                    raw: other,
                })
            }
        };

        let kind = map.get("type").and_then(Value::as_str).map(str::to_owned);
        let Some(kind) = kind else {
            return Ok(CrewEvent::Unknown {
                kind: String::new(),
                raw: Value::Object(map),
            });
        };

        let ctor: Option<fn(EventDetail) -> CrewEvent> = match kind.as_str() {
            "agent_started" => Some(CrewEvent::AgentStarted),
            "agent_thinking" => Some(CrewEvent::AgentThinking),
            "agent_action" => Some(CrewEvent::AgentAction),
            "agent_completed" => Some(CrewEvent::AgentCompleted),
            "agent_communication" => Some(CrewEvent::AgentCommunication),
            "crew_started" => Some(CrewEvent::CrewStarted),
            "task_created" => Some(CrewEvent::TaskCreated),
            "agent_created" => Some(CrewEvent::AgentCreated),
            "crew_completed" => Some(CrewEvent::CrewCompleted),
            "error" => Some(CrewEvent::Error),
            "step_update" => Some(CrewEvent::StepUpdate),
            _ => None,
        };
        let Some(ctor) = ctor else {
            return Ok(CrewEvent::Unknown {
                kind,
                raw: Value::Object(map),
            });
        };

        map.remove("type");
        let stray = normalize_fields(&mut map);
        let mut detail: EventDetail = serde_json::from_value(Value::Object(map))
            .map_err(|source| EventDecodeError::Fields {
                kind: kind.clone(),
                source,
            })?;
        detail.extra.extend(stray);
        Ok(ctor(detail))
    }

    /// The wire `type` string.
    pub fn kind(&self) -> &str {
        match self {
            CrewEvent::AgentStarted(_) => "agent_started",
            CrewEvent::AgentThinking(_) => "agent_thinking",
            CrewEvent::AgentAction(_) => "agent_action",
            CrewEvent::AgentCompleted(_) => "agent_completed",
            CrewEvent::AgentCommunication(_) => "agent_communication",
            CrewEvent::CrewStarted(_) => "crew_started",
            CrewEvent::TaskCreated(_) => "task_created",
            CrewEvent::AgentCreated(_) => "agent_created",
            CrewEvent::CrewCompleted(_) => "crew_completed",
            CrewEvent::Error(_) => "error",
            CrewEvent::StepUpdate(_) => "step_update",
            CrewEvent::Unknown { kind, .. } => kind,
        }
    }

    pub fn detail(&self) -> Option<&EventDetail> {
        match self {
            CrewEvent::AgentStarted(d)
            | CrewEvent::AgentThinking(d)
            | CrewEvent::AgentAction(d)
            | CrewEvent::AgentCompleted(d)
            | CrewEvent::AgentCommunication(d)
            | CrewEvent::CrewStarted(d)
            | CrewEvent::TaskCreated(d)
            | CrewEvent::AgentCreated(d)
            | CrewEvent::CrewCompleted(d)
            | CrewEvent::Error(d)
            | CrewEvent::StepUpdate(d) => Some(d),
            CrewEvent::Unknown { .. } => None,
        }
    }

    fn detail_mut(&mut self) -> Option<&mut EventDetail> {
        match self {
            CrewEvent::AgentStarted(d)
            | CrewEvent::AgentThinking(d)
            | CrewEvent::AgentAction(d)
            | CrewEvent::AgentCompleted(d)
            | CrewEvent::AgentCommunication(d)
            | CrewEvent::CrewStarted(d)
            | CrewEvent::TaskCreated(d)
            | CrewEvent::AgentCreated(d)
            | CrewEvent::CrewCompleted(d)
            | CrewEvent::Error(d)
            | CrewEvent::StepUpdate(d) => Some(d),
            CrewEvent::Unknown { .. } => None,
        }
    }

    /// Agent name the event refers to, if any.
    pub fn agent(&self) -> Option<&str> {
        self.detail().and_then(|d| d.agent.as_deref())
    }

    pub fn message(&self) -> Option<&str> {
        self.detail().and_then(|d| d.message.as_deref())
    }

    pub fn timestamp(&self) -> Option<&str> {
        match self {
            CrewEvent::Unknown { raw, .. } => raw.get("timestamp").and_then(Value::as_str),
            other => other.detail().and_then(|d| d.timestamp.as_deref()),
        }
    }

    /// Set `timestamp` to the receipt time unless the backend supplied one.
    pub fn stamp_receipt(&mut self, at: DateTime<Utc>) {
        let stamp = at.to_rfc3339_opts(SecondsFormat::Millis, true);
        match self {
            CrewEvent::Unknown { raw, .. } => {
                if let Value::Object(map) = raw {
                    map.entry("timestamp").or_insert(Value::String(stamp));
                }
            }
            other => {
                if let Some(detail) = other.detail_mut() {
                    if detail.timestamp.is_none() {
                        detail.timestamp = Some(stamp);
                    }
                }
            }
        }
    }

    /// Re-encode as the JSON object the backend would have sent.
    pub fn to_value(&self) -> Value {
        match self {
            CrewEvent::Unknown { raw, .. } => raw.clone(),
            other => {
                let mut map = match other.detail().map(serde_json::to_value) {
                    Some(Ok(Value::Object(map))) => map,
                    _ => Map::new(),
                };
                map.insert("type".into(), Value::String(other.kind().to_string()));
                Value::Object(map)
            }
        }
    }
}

const TEXT_FIELDS: [&str; 12] = [
    "agent", "message", "timestamp", "thought", "tool", "action", "output", "result", "task",
    "from", "to", "status",
];
const COUNT_FIELDS: [&str; 4] = ["task_number", "total_tasks", "step", "result_length"];

/// Bring the typed fields of a frame into the shape [`EventDetail`] expects.
/// Scalars in text fields become strings and numeric strings in count
/// fields become numbers. Anything else is taken out and returned, to be
/// kept in `extra`, so one odd field never costs the whole event.
fn normalize_fields(map: &mut Map<String, Value>) -> Map<String, Value> {
    let mut stray = Map::new();

    for key in TEXT_FIELDS {
        match map.get(key) {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(Value::Number(_)) | Some(Value::Bool(_)) => {
                if let Some(value) = map.get_mut(key) {
                    *value = Value::String(value.to_string());
                }
            }
            Some(_) => {
                if let Some(value) = map.remove(key) {
                    stray.insert(key.to_string(), value);
                }
            }
        }
    }

    for key in COUNT_FIELDS {
        let limit = if key == "result_length" {
            u64::MAX
        } else {
            u64::from(u32::MAX)
        };
        let count = match map.get(key) {
            None | Some(Value::Null) => continue,
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(text)) => text.trim().parse::<u64>().ok(),
            Some(_) => None,
        };
        match count.filter(|n| *n <= limit) {
            Some(n) => {
                map.insert(key.to_string(), Value::from(n));
            }
            None => {
                if let Some(value) = map.remove(key) {
                    stray.insert(key.to_string(), value);
                }
            }
        }
    }

    stray
}

impl Serialize for CrewEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CrewEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        CrewEvent::from_value(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn decodes_known_kind_with_detail() {
        let event = CrewEvent::from_json(
            r#"{"type":"agent_thinking","agent":"Researcher","thought":"search first"}"#,
        )
        .unwrap();

        match &event {
            CrewEvent::AgentThinking(d) => {
                assert_eq!(d.agent.as_deref(), Some("Researcher"));
                assert_eq!(d.thought.as_deref(), Some("search first"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(event.kind(), "agent_thinking");
    }

    #[test]
    fn unknown_kind_is_preserved() {
        let event = CrewEvent::from_value(json!({"type": "pong", "n": 3})).unwrap();
        assert_eq!(event.kind(), "pong");
        assert!(event.detail().is_none());
        assert_eq!(event.to_value()["n"], 3);
    }

    #[test]
    fn missing_type_decodes_as_unknown() {
        let event = CrewEvent::from_value(json!({"message": "hi"})).unwrap();
        assert!(matches!(event, CrewEvent::Unknown { ref kind, .. } if kind.is_empty()));

        let event = CrewEvent::from_value(json!(42)).unwrap();
        assert!(matches!(event, CrewEvent::Unknown { .. }));
    }

    #[test]
    fn odd_field_types_keep_the_event() {
        let event = CrewEvent::from_value(json!({"type": "crew_completed", "result": 42})).unwrap();
        assert!(matches!(&event, CrewEvent::CrewCompleted(d) if d.result.as_deref() == Some("42")));

        let event = CrewEvent::from_value(json!({
            "type": "crew_completed", "result": "R", "task_number": "1"
        }))
        .unwrap();
        match &event {
            CrewEvent::CrewCompleted(d) => {
                assert_eq!(d.result.as_deref(), Some("R"));
                assert_eq!(d.task_number, Some(1));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn unusable_fields_move_to_extra() {
        let event = CrewEvent::from_value(json!({
            "type": "agent_started", "agent": "A", "step": -1, "output": {"text": "x"}
        }))
        .unwrap();
        let detail = event.detail().unwrap();
        assert!(matches!(event, CrewEvent::AgentStarted(_)));
        assert_eq!(event.agent(), Some("A"));
        assert_eq!(detail.step, None);
        assert_eq!(detail.extra["step"], -1);
        assert_eq!(detail.extra["output"]["text"], "x");

        let value = event.to_value();
        assert_eq!(value["step"], -1);
        assert_eq!(value["type"], "agent_started");

        let event = CrewEvent::from_value(json!({"type": "step_update", "step": "two"})).unwrap();
        assert!(matches!(event, CrewEvent::StepUpdate(ref d) if d.step.is_none()));
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(CrewEvent::from_json("{not json").is_err());
    }

    #[test]
    fn extra_fields_survive_reencoding() {
        let event = CrewEvent::from_value(json!({
            "type": "agent_action",
            "agent": "Writer",
            "tool_input": {"query": "rust"}
        }))
        .unwrap();

        let value = event.to_value();
        assert_eq!(value["type"], "agent_action");
        assert_eq!(value["tool_input"]["query"], "rust");
        assert!(value.get("thought").is_none());
    }

    #[test]
    fn stamp_receipt_only_fills_missing_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();

        let mut fresh = CrewEvent::from_value(json!({"type": "crew_started"})).unwrap();
        fresh.stamp_receipt(at);
        assert_eq!(fresh.timestamp(), Some("2026-01-02T03:04:05.000Z"));

        let mut sent = CrewEvent::from_value(json!({
            "type": "crew_started",
            "timestamp": "2025-12-31T23:59:59"
        }))
        .unwrap();
        sent.stamp_receipt(at);
        assert_eq!(sent.timestamp(), Some("2025-12-31T23:59:59"));

        let mut unknown = CrewEvent::from_value(json!({"type": "mystery"})).unwrap();
        unknown.stamp_receipt(at);
        assert!(unknown.timestamp().is_some());
    }

    #[test]
    fn serde_roundtrip_through_value() {
        let event: CrewEvent =
            serde_json::from_value(json!({"type": "crew_completed", "result": "FINAL"})).unwrap();
        assert!(matches!(&event, CrewEvent::CrewCompleted(d) if d.result.as_deref() == Some("FINAL")));
        let text = serde_json::to_string(&event).unwrap();
        assert!(text.contains("\"crew_completed\""));
    }
}
