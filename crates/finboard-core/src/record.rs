use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::RecordError;

/// Lifecycle of a single tool invocation. Ordered: a well-behaved source only
/// moves forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ToolPhase {
    #[serde(alias = "inProgress", alias = "in_progress")]
    Pending,
    #[serde(alias = "executing")]
    Running,
    Complete,
}

impl ToolPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Complete => "complete",
        }
    }

    pub fn is_complete(self) -> bool {
        self == Self::Complete
    }

    /// Accepts the wire names used by agent runtimes as well as our own labels.
    pub fn parse(input: &str) -> Result<Self, RecordError> {
        match input.trim() {
            "pending" | "inProgress" | "in_progress" => Ok(Self::Pending),
            "running" | "executing" => Ok(Self::Running),
            "complete" => Ok(Self::Complete),
            other => Err(RecordError::InvalidPhase(other.to_string())),
        }
    }
}

impl FromStr for ToolPhase {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRecord {
    pub tool_name: String,
    pub phase: ToolPhase,
    /// Only carried once the invocation is complete.
    pub payload: Option<Value>,
    /// Logical tick assigned by the store on acceptance; strictly increasing.
    pub observed_at: u64,
    /// Wall clock, display only.
    pub received_at_ms: i64,
}

impl ToolInvocationRecord {
    pub fn is_in_progress(&self) -> bool {
        !self.phase.is_complete()
    }
}
