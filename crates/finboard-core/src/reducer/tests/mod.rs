use pretty_assertions::assert_eq;
use serde_json::Value;

pub(super) use super::reduce;
pub(super) use crate::actions::DashAction;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::reducer::DashEffect;
pub(super) use crate::record::ToolPhase;
pub(super) use crate::selector::resolve;
pub(super) use crate::state::ChatRole;
pub(super) use crate::state::DashState;
pub(super) use crate::state::LogBuffer;
pub(super) use crate::state::LogLevel;
pub(super) use crate::turn::DeferredTask;
pub(super) use crate::turn::TurnQueue;

mod chat;
mod tool_focus;

fn state() -> DashState {
    DashState::new("tenant-demo-001".to_string())
}

fn run_user(state: &mut DashState, action: UserAction) -> Vec<DashEffect> {
    reduce(state, DashAction::User(action))
}

fn run_runtime(state: &mut DashState, action: RuntimeAction) -> Vec<DashEffect> {
    reduce(state, DashAction::Runtime(action))
}

fn tool_event(name: &str, phase: &str, payload: Option<Value>) -> RuntimeAction {
    RuntimeAction::ToolEvent {
        tool_name: name.to_string(),
        phase: phase.to_string(),
        payload,
    }
}

/// Feeds events through the reducer the way the UI loop does: effects that
/// ask for a flush are deferred and only run when the next turn begins.
struct Harness {
    state: DashState,
    queue: TurnQueue,
}

impl Harness {
    fn new() -> Self {
        Self {
            state: state(),
            queue: TurnQueue::new(),
        }
    }

    fn dispatch(&mut self, action: DashAction) -> Vec<DashEffect> {
        let effects = reduce(&mut self.state, action);
        for effect in &effects {
            if *effect == DashEffect::ScheduleFlush {
                self.queue.defer(DeferredTask::FlushResults);
            }
        }
        effects
    }

    fn event(&mut self, name: &str, phase: &str, payload: Option<Value>) -> Vec<DashEffect> {
        self.dispatch(DashAction::Runtime(tool_event(name, phase, payload)))
    }

    fn select(&mut self, name: &str) -> Vec<DashEffect> {
        self.dispatch(DashAction::User(UserAction::SelectTool {
            name: name.to_string(),
        }))
    }

    /// Starts the next turn and runs whatever the previous one deferred.
    fn next_turn(&mut self) {
        for task in self.queue.begin_turn() {
            match task {
                DeferredTask::FlushResults => {
                    self.dispatch(DashAction::Runtime(RuntimeAction::FlushResults));
                }
            }
        }
    }

    fn resolved_name(&self) -> Option<String> {
        resolve(self.state.results.committed())
            .record()
            .map(|record| record.tool_name.clone())
    }
}

#[test]
fn harness_defers_flush_to_the_next_turn() {
    let mut harness = Harness::new();
    let effects = harness.event("get_sla_compliance", "pending", None);
    assert_eq!(effects, vec![DashEffect::ScheduleFlush]);
    assert!(harness.state.results.committed().is_empty());

    harness.next_turn();
    assert_eq!(harness.state.results.committed().len(), 1);
    assert!(harness.queue.is_idle());
}
