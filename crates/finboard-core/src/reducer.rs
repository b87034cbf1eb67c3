use chrono::Utc;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::actions::DashAction;
use super::actions::RuntimeAction;
use super::actions::UserAction;
use super::actions::PROMPT_SUGGESTIONS;
use super::selector::neighbour_card;
use super::selector::resolve;
use super::state::ChatMessage;
use super::state::ChatRole;
use super::state::DashFocus;
use super::state::DashOverlay;
use super::state::DashState;
use super::state::LogEntry;
use super::state::LogLevel;
use super::state::LogSource;
use super::state::StreamStats;
use super::store::RecordOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashEffect {
    RequestFrame,
    /// Queue one `FlushResults` for the next scheduling turn.
    ScheduleFlush,
    SubmitPrompt {
        prompt: String,
        tenant_id: String,
    },
    CopyToClipboard(String),
    /// The session was reset; in-flight agent output belongs to the old one.
    NewSession {
        session_id: u64,
    },
    Quit,
}

pub fn reduce(state: &mut DashState, action: DashAction) -> Vec<DashEffect> {
    match action {
        DashAction::User(user) => reduce_user(state, user),
        DashAction::Runtime(runtime) => reduce_runtime(state, runtime),
    }
}

fn reduce_user(state: &mut DashState, action: UserAction) -> Vec<DashEffect> {
    match action {
        UserAction::ChatInput(c) => {
            state.interaction.chat_input.push(c);
            vec![DashEffect::RequestFrame]
        }
        UserAction::ChatBackspace => {
            state.interaction.chat_input.pop();
            vec![DashEffect::RequestFrame]
        }
        UserAction::ChatPaste(text) => {
            let flattened = text.replace(['\r', '\n'], " ");
            state.interaction.chat_input.push_str(&flattened);
            vec![DashEffect::RequestFrame]
        }
        UserAction::SubmitChat => submit_chat(state),
        UserAction::UseSuggestion(index) => {
            let Some(prompt) = PROMPT_SUGGESTIONS.get(index) else {
                return Vec::new();
            };
            state.interaction.chat_input = (*prompt).to_string();
            submit_chat(state)
        }
        UserAction::ToggleFocus => {
            state.interaction.focus = match state.interaction.focus {
                DashFocus::Chat => DashFocus::Cards,
                DashFocus::Cards => DashFocus::Chat,
            };
            vec![DashEffect::RequestFrame]
        }
        UserAction::SelectTool { name } => select_tool(state, &name),
        UserAction::SelectNextCard => {
            match neighbour_card(state.results.committed(), 1) {
                Some(name) => select_tool(state, &name),
                None => Vec::new(),
            }
        }
        UserAction::SelectPrevCard => {
            match neighbour_card(state.results.committed(), -1) {
                Some(name) => select_tool(state, &name),
                None => Vec::new(),
            }
        }
        UserAction::FollowLatest => {
            if state.results.committed().selected().is_none() {
                return Vec::new();
            }
            state.results.clear_selection();
            push_log(state, LogLevel::Debug, LogSource::App, None, "following latest result");
            vec![DashEffect::RequestFrame]
        }
        UserAction::ToggleRawPayload => {
            state.interaction.raw_payload = !state.interaction.raw_payload;
            vec![DashEffect::RequestFrame]
        }
        UserAction::CopyPayload => {
            let committed = state.results.committed();
            let text = resolve(committed)
                .record()
                .and_then(|record| record.payload.as_ref())
                .and_then(|payload| serde_json::to_string_pretty(payload).ok());
            match text {
                Some(text) => vec![DashEffect::CopyToClipboard(text)],
                None => {
                    push_log(
                        state,
                        LogLevel::Info,
                        LogSource::App,
                        None,
                        "no completed payload to copy",
                    );
                    vec![DashEffect::RequestFrame]
                }
            }
        }
        UserAction::CycleTheme => {
            state.customization.theme = state.customization.theme.next();
            vec![DashEffect::RequestFrame]
        }
        UserAction::ToggleActivity => {
            state.customization.show_activity = !state.customization.show_activity;
            vec![DashEffect::RequestFrame]
        }
        UserAction::ToggleHelp => {
            state.interaction.overlay = match state.interaction.overlay {
                DashOverlay::Help => DashOverlay::None,
                DashOverlay::None => DashOverlay::Help,
            };
            vec![DashEffect::RequestFrame]
        }
        UserAction::CloseOverlay => {
            if state.interaction.overlay == DashOverlay::None {
                return Vec::new();
            }
            state.interaction.overlay = DashOverlay::None;
            vec![DashEffect::RequestFrame]
        }
        UserAction::NewSession => {
            state.results.reset();
            state.chat.clear();
            state.interaction.chat_input.clear();
            state.interaction.live_assistant_preview.clear();
            state.interaction.agent_busy = false;
            state.interaction.raw_payload = false;
            state.stats = StreamStats::default();
            state.header.session_id = state.header.session_id.saturating_add(1);
            info!(session_id = state.header.session_id, "started new session");
            push_log(state, LogLevel::Info, LogSource::App, None, "new session");
            vec![
                DashEffect::NewSession {
                    session_id: state.header.session_id,
                },
                DashEffect::RequestFrame,
            ]
        }
        UserAction::Quit => vec![DashEffect::Quit],
    }
}

fn submit_chat(state: &mut DashState) -> Vec<DashEffect> {
    let prompt = state.interaction.chat_input.trim().to_string();
    if prompt.is_empty() {
        state.interaction.chat_input.clear();
        return Vec::new();
    }
    if state.interaction.agent_busy {
        push_log(
            state,
            LogLevel::Warn,
            LogSource::App,
            None,
            "agent is still answering; prompt kept in the input",
        );
        return vec![DashEffect::RequestFrame];
    }

    state.interaction.chat_input.clear();
    state.interaction.live_assistant_preview.clear();
    state.interaction.agent_busy = true;
    state.chat.push(ChatMessage {
        role: ChatRole::User,
        text: prompt.clone(),
    });
    push_log(
        state,
        LogLevel::Info,
        LogSource::App,
        None,
        &format!("> {prompt}"),
    );
    vec![
        DashEffect::SubmitPrompt {
            prompt,
            tenant_id: state.header.tenant_id.to_string(),
        },
        DashEffect::RequestFrame,
    ]
}

fn select_tool(state: &mut DashState, name: &str) -> Vec<DashEffect> {
    if state.results.select(name) {
        vec![DashEffect::RequestFrame]
    } else {
        Vec::new()
    }
}

fn reduce_runtime(state: &mut DashState, action: RuntimeAction) -> Vec<DashEffect> {
    match action {
        RuntimeAction::ToolEvent {
            tool_name,
            phase,
            payload,
        } => match state.results.record_raw(&tool_name, &phase, payload) {
            Ok(outcome) => {
                state.stats.accepted_events += 1;
                match outcome {
                    RecordOutcome::FlushScheduled => vec![DashEffect::ScheduleFlush],
                    RecordOutcome::Buffered => Vec::new(),
                }
            }
            Err(err) => {
                warn!(tool = %tool_name, phase = %phase, error = %err, "dropping tool event");
                state.stats.rejected_events += 1;
                push_log(
                    state,
                    LogLevel::Warn,
                    LogSource::Store,
                    Some(tool_name),
                    &err.to_string(),
                );
                Vec::new()
            }
        },
        RuntimeAction::FlushResults => {
            let Some(commit) = state.results.flush() else {
                return Vec::new();
            };
            state.stats.flushes += 1;
            for record in &commit.transitions {
                push_log(
                    state,
                    LogLevel::Debug,
                    LogSource::Store,
                    Some(record.tool_name.clone()),
                    record.phase.label(),
                );
            }
            debug!(
                version = commit.version,
                tools = commit.distinct_tools(),
                "committed tool results"
            );
            let mut effects = vec![DashEffect::RequestFrame];
            if commit.follow_up_scheduled {
                effects.push(DashEffect::ScheduleFlush);
            }
            effects
        }
        RuntimeAction::AssistantToken(token) => {
            state.interaction.live_assistant_preview.push_str(&token);
            Vec::new()
        }
        RuntimeAction::AssistantMeta(message) => {
            push_log(state, LogLevel::Info, LogSource::Agent, None, &message);
            Vec::new()
        }
        RuntimeAction::AssistantFinished => {
            let text = std::mem::take(&mut state.interaction.live_assistant_preview);
            let text = text.trim();
            if !text.is_empty() {
                state.chat.push(ChatMessage {
                    role: ChatRole::Assistant,
                    text: text.to_string(),
                });
            }
            state.interaction.agent_busy = false;
            Vec::new()
        }
        RuntimeAction::SetTenant(tenant_id) => {
            let tenant_id = tenant_id.trim();
            if !tenant_id.is_empty() {
                state.header.tenant_id = tenant_id.into();
            }
            Vec::new()
        }
        RuntimeAction::AppendLog(value) => {
            push_log(state, LogLevel::Info, LogSource::App, None, &value);
            Vec::new()
        }
        RuntimeAction::ClipboardCopied(Ok(())) => {
            push_log(
                state,
                LogLevel::Info,
                LogSource::App,
                None,
                "copied payload to clipboard",
            );
            vec![DashEffect::RequestFrame]
        }
        RuntimeAction::ClipboardCopied(Err(err)) => {
            warn!(error = %err, "clipboard copy failed");
            push_log(
                state,
                LogLevel::Warn,
                LogSource::App,
                None,
                &format!("clipboard copy failed: {err}"),
            );
            vec![DashEffect::RequestFrame]
        }
    }
}

fn push_log(
    state: &mut DashState,
    level: LogLevel,
    source: LogSource,
    context: Option<String>,
    message: &str,
) {
    state.logs.append(LogEntry {
        seq: 0,
        level,
        ts_ms: Some(Utc::now().timestamp_millis()),
        source,
        context,
        message: message.to_string(),
        session_id: state.header.session_id,
    });
}

#[cfg(test)]
mod tests;
