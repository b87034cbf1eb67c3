use finboard_core::RecordError;
use finboard_core::RecordOutcome;
use finboard_core::RuntimeAction;
use finboard_core::ToolEventSink;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolInvocationStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub invocation_id: u64,
    pub tool_id: String,
    pub tenant_id: String,
    /// Only read by tools that take a range, e.g. `7d`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub invocation_id: u64,
    pub tool_id: String,
    pub status: ToolInvocationStatus,
    pub payload: Option<Value>,
    pub logs: Vec<String>,
}

/// One lifecycle notification as an agent runtime emits it. The phase stays a
/// string so malformed input is rejected by the store, not by the decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolEvent {
    pub tool_name: String,
    pub phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ToolEvent {
    pub fn new(
        tool_name: impl Into<String>,
        phase: impl Into<String>,
        payload: Option<Value>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            phase: phase.into(),
            payload,
        }
    }

    pub fn into_action(self) -> RuntimeAction {
        RuntimeAction::ToolEvent {
            tool_name: self.tool_name,
            phase: self.phase,
            payload: self.payload,
        }
    }

    pub fn deliver<S>(self, sink: &mut S) -> Result<RecordOutcome, RecordError>
    where
        S: ToolEventSink + ?Sized,
    {
        sink.on_tool_event(&self.tool_name, &self.phase, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use finboard_core::ResultStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn tool_event_decodes_without_payload() {
        let event: ToolEvent =
            serde_json::from_str(r#"{"tool_name":"get_sla_compliance","phase":"inProgress"}"#)
                .expect("decode");
        assert_eq!(event, ToolEvent::new("get_sla_compliance", "inProgress", None));
    }

    #[test]
    fn delivered_events_reach_the_store_pending_batch() {
        let mut store = ResultStore::new();
        let payload = json!({ "uptime": 99.9 });
        let event = ToolEvent::new("get_sla_compliance", "complete", Some(payload));
        let outcome = event.deliver(&mut store).expect("accepted");
        assert_eq!(outcome, RecordOutcome::FlushScheduled);
        assert_eq!(store.pending_len(), 1);
        assert!(store.committed().is_empty());
    }

    #[test]
    fn into_action_keeps_the_wire_phase() {
        let action = ToolEvent::new("get_sla_compliance", "executing", None).into_action();
        match action {
            RuntimeAction::ToolEvent { phase, .. } => assert_eq!(phase, "executing"),
            other => panic!("unexpected action {other:?}"),
        }
    }
}
