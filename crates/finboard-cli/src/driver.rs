use finboard_core::reduce;
use finboard_core::turn::DeferredTask;
use finboard_core::turn::TurnQueue;
use finboard_core::DashAction;
use finboard_core::DashEffect;
use finboard_core::DashState;
use finboard_core::RuntimeAction;
use tracing::trace;

/// Owns the dashboard state and the deferral queue. Flush requests coming out
/// of the reducer are queued here; every other effect goes back to the caller.
pub struct Driver {
    pub state: DashState,
    queue: TurnQueue,
}

impl Driver {
    pub fn new(state: DashState) -> Self {
        Self {
            state,
            queue: TurnQueue::new(),
        }
    }

    /// Starts a turn by running whatever the previous turn deferred.
    pub fn begin_turn(&mut self) -> Vec<DashEffect> {
        let mut effects = Vec::new();
        for task in self.queue.begin_turn() {
            match task {
                DeferredTask::FlushResults => {
                    effects.extend(self.dispatch(DashAction::Runtime(RuntimeAction::FlushResults)));
                }
            }
        }
        effects
    }

    pub fn dispatch(&mut self, action: DashAction) -> Vec<DashEffect> {
        let mut effects = reduce(&mut self.state, action);
        effects.retain(|effect| {
            if *effect == DashEffect::ScheduleFlush {
                let queued = self.queue.defer(DeferredTask::FlushResults);
                trace!(turn = self.queue.turn(), queued, "flush deferred");
                false
            } else {
                true
            }
        });
        effects
    }

    pub fn has_deferred_work(&self) -> bool {
        !self.queue.is_idle()
    }
}
