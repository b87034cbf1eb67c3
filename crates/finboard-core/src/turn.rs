/// Work that must not run in the turn that requested it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    FlushResults,
}

/// Single-threaded deferral queue driven by the UI loop. Tasks deferred during
/// a turn run at the start of the next one; the same task is queued at most
/// once per turn.
#[derive(Debug, Default)]
pub struct TurnQueue {
    next: Vec<DeferredTask>,
    turn: u64,
}

impl TurnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer(&mut self, task: DeferredTask) -> bool {
        if self.next.contains(&task) {
            return false;
        }
        self.next.push(task);
        true
    }

    /// Starts a new turn and hands back the tasks deferred by the previous one.
    pub fn begin_turn(&mut self) -> Vec<DeferredTask> {
        self.turn = self.turn.saturating_add(1);
        std::mem::take(&mut self.next)
    }

    pub fn is_idle(&self) -> bool {
        self.next.is_empty()
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }
}
