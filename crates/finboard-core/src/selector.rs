//! Decides which tool result the main panel shows.
//!
//! Everything here is a pure function of a [`Snapshot`]; render passes call
//! it every frame.

use crate::record::ToolInvocationRecord;
use crate::record::ToolPhase;
use crate::store::Snapshot;
use crate::tool_registry::ToolId;
use crate::tool_registry::ToolRegistry;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    Record(&'a ToolInvocationRecord),
    Idle,
}

impl<'a> Resolved<'a> {
    pub fn record(self) -> Option<&'a ToolInvocationRecord> {
        match self {
            Self::Record(record) => Some(record),
            Self::Idle => None,
        }
    }
}

/// Explicit selection wins, then the most recently observed record, then idle.
pub fn resolve(snapshot: &Snapshot) -> Resolved<'_> {
    if let Some(record) = snapshot.selected().and_then(|name| snapshot.get(name)) {
        return Resolved::Record(record);
    }
    match snapshot.latest() {
        Some(record) => Resolved::Record(record),
        None => Resolved::Idle,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Panel<'a> {
    Idle,
    Tool {
        tool: ToolId,
        record: &'a ToolInvocationRecord,
    },
}

pub fn panel_for(resolved: Resolved<'_>) -> Panel<'_> {
    match resolved {
        Resolved::Idle => Panel::Idle,
        Resolved::Record(record) => match ToolId::from_name(&record.tool_name) {
            Some(tool) => Panel::Tool { tool, record },
            None => Panel::Idle,
        },
    }
}

pub fn resolve_panel(snapshot: &Snapshot) -> Panel<'_> {
    panel_for(resolve(snapshot))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCard {
    pub tool_name: String,
    pub label: String,
    pub phase: ToolPhase,
    /// Currently shown in the main panel.
    pub active: bool,
    /// Pinned by the operator rather than following the latest result.
    pub pinned: bool,
}

/// Cards in observation order, oldest first.
pub fn tool_cards(snapshot: &Snapshot) -> Vec<ToolCard> {
    let active = resolve(snapshot).record().map(|record| record.tool_name.as_str());
    snapshot
        .by_observation()
        .into_iter()
        .map(|record| ToolCard {
            tool_name: record.tool_name.clone(),
            label: ToolRegistry::lookup(&record.tool_name)
                .map(|spec| spec.card_label.to_string())
                .unwrap_or_else(|| record.tool_name.clone()),
            phase: record.phase,
            active: active == Some(record.tool_name.as_str()),
            pinned: snapshot.selected() == Some(record.tool_name.as_str()),
        })
        .collect()
}

/// Name of the card `step` positions away from the active one, wrapping.
pub fn neighbour_card(snapshot: &Snapshot, step: isize) -> Option<String> {
    let cards = tool_cards(snapshot);
    if cards.is_empty() {
        return None;
    }
    let len = cards.len() as isize;
    let current = cards
        .iter()
        .position(|card| card.active)
        .map_or(len - 1, |idx| idx as isize);
    let next = (current + step).rem_euclid(len) as usize;
    Some(cards[next].tool_name.clone())
}
