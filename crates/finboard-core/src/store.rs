//! Tool result store: the single owner of "latest result per tool name".
//!
//! Writes never touch the read model directly. `record` appends to a pending
//! batch and tells the caller whether a flush has to be deferred to the next
//! scheduling turn; `flush` commits the whole batch in one step. Readers only
//! ever see committed [`Snapshot`]s, which are copy-on-write and never change
//! once handed out.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use tracing::trace;

use crate::error::RecordError;
use crate::record::ToolInvocationRecord;
use crate::record::ToolPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First write of a batch: the caller must defer one flush.
    FlushScheduled,
    /// A flush is already pending for this batch.
    Buffered,
}

/// Immutable view of the committed read model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    records: Arc<BTreeMap<String, ToolInvocationRecord>>,
    selected: Option<String>,
    version: u64,
}

impl Snapshot {
    pub fn records(&self) -> &BTreeMap<String, ToolInvocationRecord> {
        &self.records
    }

    pub fn get(&self, tool_name: &str) -> Option<&ToolInvocationRecord> {
        self.records.get(tool_name)
    }

    pub fn contains(&self, tool_name: &str) -> bool {
        self.records.contains_key(tool_name)
    }

    /// Record with the highest `observed_at`, the implicit selection.
    pub fn latest(&self) -> Option<&ToolInvocationRecord> {
        self.records.values().max_by_key(|record| record.observed_at)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records ordered by observation, oldest first.
    pub fn by_observation(&self) -> Vec<&ToolInvocationRecord> {
        let mut records: Vec<&ToolInvocationRecord> = self.records.values().collect();
        records.sort_by_key(|record| record.observed_at);
        records
    }
}

/// Everything a flush made visible, in the order it was recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub version: u64,
    pub transitions: Vec<ToolInvocationRecord>,
    /// Set when observers recorded during the flush and a new one is due.
    pub follow_up_scheduled: bool,
}

impl Commit {
    pub fn distinct_tools(&self) -> usize {
        let mut names: Vec<&str> = self
            .transitions
            .iter()
            .map(|record| record.tool_name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names.len()
    }
}

#[derive(Debug, Default)]
struct PendingBatch {
    records: Vec<ToolInvocationRecord>,
    flush_scheduled: bool,
    next_tick: u64,
}

impl PendingBatch {
    fn record(
        &mut self,
        tool_name: &str,
        phase: ToolPhase,
        payload: Option<Value>,
    ) -> Result<RecordOutcome, RecordError> {
        let tool_name = tool_name.trim();
        if tool_name.is_empty() {
            return Err(RecordError::EmptyToolName);
        }

        let payload = if phase.is_complete() {
            payload
        } else {
            if payload.is_some() {
                debug!(
                    tool = tool_name,
                    phase = phase.label(),
                    "dropping payload before completion"
                );
            }
            None
        };

        self.next_tick = self.next_tick.saturating_add(1);
        self.records.push(ToolInvocationRecord {
            tool_name: tool_name.to_string(),
            phase,
            payload,
            observed_at: self.next_tick,
            received_at_ms: chrono::Utc::now().timestamp_millis(),
        });
        trace!(tool = tool_name, phase = phase.label(), tick = self.next_tick, "buffered");

        if self.flush_scheduled {
            Ok(RecordOutcome::Buffered)
        } else {
            self.flush_scheduled = true;
            Ok(RecordOutcome::FlushScheduled)
        }
    }

    fn take(&mut self) -> Vec<ToolInvocationRecord> {
        self.flush_scheduled = false;
        std::mem::take(&mut self.records)
    }
}

/// Write handle onto the pending batch only. Handed to render passes and
/// flush observers; nothing written through it is visible before the next
/// flush.
#[derive(Debug)]
pub struct Recorder<'a> {
    batch: &'a mut PendingBatch,
}

impl Recorder<'_> {
    pub fn record(
        &mut self,
        tool_name: &str,
        phase: ToolPhase,
        payload: Option<Value>,
    ) -> Result<RecordOutcome, RecordError> {
        self.batch.record(tool_name, phase, payload)
    }

    pub fn record_raw(
        &mut self,
        tool_name: &str,
        phase: &str,
        payload: Option<Value>,
    ) -> Result<RecordOutcome, RecordError> {
        record_raw(self.batch, tool_name, phase, payload)
    }
}

/// Where agent runtimes deliver tool lifecycle notifications.
pub trait ToolEventSink {
    fn on_tool_event(
        &mut self,
        tool_name: &str,
        phase: &str,
        payload: Option<Value>,
    ) -> Result<RecordOutcome, RecordError>;
}

#[derive(Debug, Default)]
pub struct ResultStore {
    committed: Snapshot,
    pending: PendingBatch,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        tool_name: &str,
        phase: ToolPhase,
        payload: Option<Value>,
    ) -> Result<RecordOutcome, RecordError> {
        self.pending.record(tool_name, phase, payload)
    }

    /// Boundary form: the phase arrives as the runtime's wire string.
    pub fn record_raw(
        &mut self,
        tool_name: &str,
        phase: &str,
        payload: Option<Value>,
    ) -> Result<RecordOutcome, RecordError> {
        record_raw(&mut self.pending, tool_name, phase, payload)
    }

    pub fn recorder(&mut self) -> Recorder<'_> {
        Recorder {
            batch: &mut self.pending,
        }
    }

    /// Read the committed model and write to the pending batch in the same
    /// pass.
    pub fn split(&mut self) -> (&Snapshot, Recorder<'_>) {
        (
            &self.committed,
            Recorder {
                batch: &mut self.pending,
            },
        )
    }

    pub fn flush(&mut self) -> Option<Commit> {
        self.flush_with(|_, _| {})
    }

    /// Commits the pending batch atomically, then shows every committed
    /// transition to `observer`. Records the observer makes land in a fresh
    /// batch.
    pub fn flush_with<F>(&mut self, mut observer: F) -> Option<Commit>
    where
        F: FnMut(&ToolInvocationRecord, &mut Recorder<'_>),
    {
        let batch = self.pending.take();
        if batch.is_empty() {
            return None;
        }

        let records = Arc::make_mut(&mut self.committed.records);
        for record in &batch {
            records.insert(record.tool_name.clone(), record.clone());
        }
        self.committed.version = self.committed.version.saturating_add(1);
        debug!(
            version = self.committed.version,
            transitions = batch.len(),
            tools = self.committed.records.len(),
            "flushed tool results"
        );

        let mut recorder = Recorder {
            batch: &mut self.pending,
        };
        for record in &batch {
            observer(record, &mut recorder);
        }

        Some(Commit {
            version: self.committed.version,
            transitions: batch,
            follow_up_scheduled: self.pending.flush_scheduled,
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        self.committed.clone()
    }

    pub fn committed(&self) -> &Snapshot {
        &self.committed
    }

    /// Only tools already committed can be focused. Names are trimmed the
    /// same way `record` trims them.
    pub fn select(&mut self, tool_name: &str) -> bool {
        let tool_name = tool_name.trim();
        if !self.committed.contains(tool_name) {
            debug!(tool = tool_name, "ignoring selection of unknown tool");
            return false;
        }
        self.committed.selected = Some(tool_name.to_string());
        true
    }

    pub fn clear_selection(&mut self) {
        self.committed.selected = None;
    }

    pub fn pending_len(&self) -> usize {
        self.pending.records.len()
    }

    pub fn flush_scheduled(&self) -> bool {
        self.pending.flush_scheduled
    }

    /// Session end. Ticks keep counting so observation order stays global.
    pub fn reset(&mut self) {
        let version = self.committed.version.saturating_add(1);
        self.committed = Snapshot {
            records: Arc::default(),
            selected: None,
            version,
        };
        self.pending.records.clear();
        self.pending.flush_scheduled = false;
    }
}

fn record_raw(
    batch: &mut PendingBatch,
    tool_name: &str,
    phase: &str,
    payload: Option<Value>,
) -> Result<RecordOutcome, RecordError> {
    if tool_name.trim().is_empty() {
        return Err(RecordError::EmptyToolName);
    }
    let phase = ToolPhase::parse(phase)?;
    batch.record(tool_name, phase, payload)
}

impl ToolEventSink for ResultStore {
    fn on_tool_event(
        &mut self,
        tool_name: &str,
        phase: &str,
        payload: Option<Value>,
    ) -> Result<RecordOutcome, RecordError> {
        self.record_raw(tool_name, phase, payload)
    }
}
