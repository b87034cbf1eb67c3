use super::*;
use pretty_assertions::assert_eq;

fn type_text(state: &mut DashState, text: &str) {
    for c in text.chars() {
        run_user(state, UserAction::ChatInput(c));
    }
}

#[test]
fn submit_sends_the_prompt_with_the_tenant() {
    let mut state = state();
    type_text(&mut state, "  sla status?  ");

    let effects = run_user(&mut state, UserAction::SubmitChat);
    assert_eq!(
        effects,
        vec![
            DashEffect::SubmitPrompt {
                prompt: "sla status?".to_string(),
                tenant_id: "tenant-demo-001".to_string(),
            },
            DashEffect::RequestFrame,
        ]
    );
    assert!(state.interaction.agent_busy);
    assert!(state.interaction.chat_input.is_empty());
    assert_eq!(state.chat.len(), 1);
    assert_eq!(state.chat[0].role, ChatRole::User);
}

#[test]
fn blank_input_is_not_submitted() {
    let mut state = state();
    type_text(&mut state, "   ");
    assert_eq!(run_user(&mut state, UserAction::SubmitChat), Vec::<DashEffect>::new());
    assert!(state.chat.is_empty());
    assert!(state.interaction.chat_input.is_empty());
}

#[test]
fn prompt_is_held_while_the_agent_is_busy() {
    let mut state = state();
    type_text(&mut state, "first");
    run_user(&mut state, UserAction::SubmitChat);
    type_text(&mut state, "second");

    let effects = run_user(&mut state, UserAction::SubmitChat);
    assert_eq!(effects, vec![DashEffect::RequestFrame]);
    assert_eq!(state.interaction.chat_input, "second");
    assert_eq!(state.chat.len(), 1);
}

#[test]
fn suggestion_submits_its_prompt() {
    let mut state = state();
    let effects = run_user(&mut state, UserAction::UseSuggestion(1));
    assert!(matches!(
        effects.first(),
        Some(DashEffect::SubmitPrompt { prompt, .. })
            if prompt == "Are we meeting our SLA targets this month?"
    ));
    assert_eq!(run_user(&mut state, UserAction::UseSuggestion(9)), Vec::<DashEffect>::new());
}

#[test]
fn streamed_tokens_become_one_assistant_message() {
    let mut state = state();
    type_text(&mut state, "hi");
    run_user(&mut state, UserAction::SubmitChat);

    run_runtime(&mut state, RuntimeAction::AssistantToken("Checking ".to_string()));
    run_runtime(&mut state, RuntimeAction::AssistantToken("SLA.".to_string()));
    assert_eq!(state.interaction.live_assistant_preview, "Checking SLA.");

    run_runtime(&mut state, RuntimeAction::AssistantFinished);
    assert!(!state.interaction.agent_busy);
    assert!(state.interaction.live_assistant_preview.is_empty());
    assert_eq!(state.chat.last().map(|m| m.text.as_str()), Some("Checking SLA."));
    assert_eq!(state.chat.last().map(|m| m.role), Some(ChatRole::Assistant));
}

#[test]
fn paste_flattens_newlines() {
    let mut state = state();
    run_user(&mut state, UserAction::ChatPaste("a\nb\r\nc".to_string()));
    assert_eq!(state.interaction.chat_input, "a b  c");
}
