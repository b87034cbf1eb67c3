use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn harness_with(names: &[&str]) -> Harness {
    let mut harness = Harness::new();
    for name in names {
        harness.event(name, "complete", Some(json!({ "tool": name })));
    }
    harness.next_turn();
    harness
}

#[test]
fn explicit_selection_survives_newer_results() {
    let mut harness = harness_with(&["get_transaction_summary"]);
    assert_eq!(
        harness.select("get_transaction_summary"),
        vec![DashEffect::RequestFrame]
    );

    harness.event("get_sla_compliance", "complete", Some(json!({ "y": 2 })));
    harness.next_turn();

    assert_eq!(
        harness.resolved_name().as_deref(),
        Some("get_transaction_summary")
    );
}

#[test]
fn selecting_a_tool_that_is_only_pending_in_the_batch_is_ignored() {
    let mut harness = Harness::new();
    harness.event("get_sla_compliance", "pending", None);

    assert_eq!(harness.select("get_sla_compliance"), Vec::<DashEffect>::new());
    assert_eq!(harness.state.results.committed().selected(), None);
}

#[test]
fn selecting_an_unknown_tool_keeps_the_current_selection() {
    let mut harness = harness_with(&["get_sla_compliance", "get_transaction_summary"]);
    harness.select("get_sla_compliance");

    assert_eq!(harness.select("get_weather"), Vec::<DashEffect>::new());
    assert_eq!(
        harness.state.results.committed().selected(),
        Some("get_sla_compliance")
    );
}

#[test]
fn card_navigation_wraps_through_observation_order() {
    let mut harness = harness_with(&[
        "get_transaction_summary",
        "get_sla_compliance",
        "get_payment_channel_breakdown",
    ]);

    run_user(&mut harness.state, UserAction::SelectNextCard);
    assert_eq!(
        harness.resolved_name().as_deref(),
        Some("get_transaction_summary")
    );

    run_user(&mut harness.state, UserAction::SelectPrevCard);
    assert_eq!(
        harness.resolved_name().as_deref(),
        Some("get_payment_channel_breakdown")
    );
}

#[test]
fn card_navigation_on_an_empty_store_does_nothing() {
    let mut state = state();
    assert_eq!(run_user(&mut state, UserAction::SelectNextCard), Vec::<DashEffect>::new());
    assert_eq!(run_user(&mut state, UserAction::SelectPrevCard), Vec::<DashEffect>::new());
}

#[test]
fn follow_latest_drops_the_pin() {
    let mut harness = harness_with(&["get_transaction_summary", "get_sla_compliance"]);
    harness.select("get_transaction_summary");

    let effects = run_user(&mut harness.state, UserAction::FollowLatest);
    assert_eq!(effects, vec![DashEffect::RequestFrame]);
    assert_eq!(harness.resolved_name().as_deref(), Some("get_sla_compliance"));

    assert_eq!(run_user(&mut harness.state, UserAction::FollowLatest), Vec::<DashEffect>::new());
}

#[test]
fn copy_payload_copies_the_resolved_payload() {
    let mut harness = Harness::new();
    harness.event("get_sla_compliance", "complete", Some(json!({ "uptime": 99.9 })));
    harness.next_turn();

    let logged_before = harness.state.logs.iter().count();
    let effects = run_user(&mut harness.state, UserAction::CopyPayload);
    assert_eq!(
        effects,
        vec![DashEffect::CopyToClipboard("{\n  \"uptime\": 99.9\n}".to_string())]
    );
    assert_eq!(harness.state.logs.iter().count(), logged_before);
}

#[test]
fn clipboard_outcome_is_logged_after_the_copy_runs() {
    let mut state = state();
    let effects = run_runtime(&mut state, RuntimeAction::ClipboardCopied(Ok(())));
    assert_eq!(effects, vec![DashEffect::RequestFrame]);
    let last = state.logs.iter().last().expect("log entry");
    assert_eq!(last.level, LogLevel::Info);
    assert_eq!(last.message, "copied payload to clipboard");

    run_runtime(
        &mut state,
        RuntimeAction::ClipboardCopied(Err("no display available".to_string())),
    );
    let last = state.logs.iter().last().expect("log entry");
    assert_eq!(last.level, LogLevel::Warn);
    assert_eq!(last.message, "clipboard copy failed: no display available");
}

#[test]
fn copy_payload_without_a_completed_result_only_logs() {
    let mut harness = Harness::new();
    harness.event("get_sla_compliance", "running", None);
    harness.next_turn();

    let effects = run_user(&mut harness.state, UserAction::CopyPayload);
    assert_eq!(effects, vec![DashEffect::RequestFrame]);
    let last = harness.state.logs.iter().last().expect("log entry");
    assert_eq!(last.message, "no completed payload to copy");
}
