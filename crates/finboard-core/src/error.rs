use thiserror::Error;

/// Contract violations raised at the `record` call site. A rejected event
/// never reaches the pending batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("tool event rejected: tool name is empty")]
    EmptyToolName,
    #[error("tool event rejected: unknown phase `{0}`")]
    InvalidPhase(String),
}
