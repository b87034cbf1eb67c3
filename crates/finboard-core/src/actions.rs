use serde_json::Value;

#[derive(Debug, Clone)]
pub enum DashAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

#[derive(Debug, Clone)]
pub enum UserAction {
    ChatInput(char),
    ChatBackspace,
    ChatPaste(String),
    SubmitChat,
    UseSuggestion(usize),
    ToggleFocus,
    SelectTool { name: String },
    SelectNextCard,
    SelectPrevCard,
    FollowLatest,
    ToggleRawPayload,
    CopyPayload,
    CycleTheme,
    ToggleActivity,
    ToggleHelp,
    CloseOverlay,
    NewSession,
    Quit,
}

#[derive(Debug, Clone)]
pub enum RuntimeAction {
    /// Lifecycle notification from the agent. The phase is the runtime's wire
    /// string and is validated by the store.
    ToolEvent {
        tool_name: String,
        phase: String,
        payload: Option<Value>,
    },
    FlushResults,
    AssistantToken(String),
    AssistantMeta(String),
    AssistantFinished,
    SetTenant(String),
    AppendLog(String),
    /// Outcome of a `CopyToClipboard` effect; the error is the host's message.
    ClipboardCopied(Result<(), String>),
}

/// Starter prompts shown on the welcome panel.
pub const PROMPT_SUGGESTIONS: [&str; 4] = [
    "Show me transaction volume for the last 7 days",
    "Are we meeting our SLA targets this month?",
    "What's the breakdown of payment channels?",
    "Give me a full FinOps summary for my tenant",
];
