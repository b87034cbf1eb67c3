//! Non-interactive commands: print commits and panels as plain text.

use std::io::Write;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::bail;
use anyhow::Context;
use finboard_core::selector::resolve_panel;
use finboard_core::selector::tool_cards;
use finboard_core::Commit;
use finboard_core::Config;
use finboard_core::DashAction;
use finboard_core::DashEffect;
use finboard_core::DashState;
use finboard_core::ResultStore;
use finboard_core::RuntimeAction;
use finboard_core::Snapshot;
use finboard_core::UiTheme;
use finboard_core::UserAction;
use finboard_exec::load_script;
use finboard_exec::AgentSession;
use finboard_exec::ReplayStep;
use finboard_exec::SimulatedToolExecutor;
use tracing::info;
use tracing::warn;

use crate::driver::Driver;
use crate::palette::palette_for;
use crate::render::render_panel;
use crate::render::to_plain_text;
use crate::render::RenderOptions;

/// Feeds a recorded script straight into a store, flushing at every turn
/// marker and once more at the end if anything is left pending.
pub fn run_replay<W: Write>(path: &Path, tenant_id: &str, out: &mut W) -> anyhow::Result<()> {
    let steps = load_script(path)?;
    info!(path = %path.display(), steps = steps.len(), "replaying script");

    let mut store = ResultStore::new();
    let mut rejected = 0usize;
    for step in steps {
        match step {
            ReplayStep::Event(event) => {
                let tool_name = event.tool_name.clone();
                if let Err(err) = event.deliver(&mut store) {
                    warn!(tool = %tool_name, error = %err, "dropping tool event");
                    writeln!(out, "rejected {tool_name:?}: {err}")?;
                    rejected += 1;
                }
            }
            ReplayStep::EndTurn => flush_and_print(&mut store, tenant_id, out)?,
        }
    }
    if store.pending_len() > 0 {
        flush_and_print(&mut store, tenant_id, out)?;
    }
    if rejected > 0 {
        writeln!(out, "{rejected} event(s) rejected")?;
    }
    Ok(())
}

fn flush_and_print<W: Write>(
    store: &mut ResultStore,
    tenant_id: &str,
    out: &mut W,
) -> anyhow::Result<()> {
    let Some(commit) = store.flush() else {
        return Ok(());
    };
    print_commit(&commit, out)?;
    print_panel(store.committed(), tenant_id, out)
}

/// Runs one agent turn through the same reducer and turn queue as the TUI,
/// one agent event per turn.
pub fn run_ask<W: Write>(
    config: &Config,
    prompt: &str,
    tenant_id: Option<&str>,
    out: &mut W,
) -> anyhow::Result<()> {
    let mut driver = Driver::new(DashState::from_config(config));
    if let Some(tenant_id) = tenant_id {
        driver.dispatch(DashAction::Runtime(RuntimeAction::SetTenant(
            tenant_id.to_string(),
        )));
    }
    driver.state.interaction.chat_input = prompt.to_string();
    let effects = driver.dispatch(DashAction::User(UserAction::SubmitChat));
    let Some((prompt, tenant_id)) = effects.into_iter().find_map(|effect| match effect {
        DashEffect::SubmitPrompt { prompt, tenant_id } => Some((prompt, tenant_id)),
        _ => None,
    }) else {
        bail!("prompt is empty");
    };

    let (tx, rx) = mpsc::channel();
    let executor = SimulatedToolExecutor::new(config.agent.seed);
    let mut session = AgentSession::new(executor, Duration::ZERO);
    session.run_turn(&prompt, &tenant_id, &|event| {
        let _ = tx.send(event);
    });
    drop(tx);

    let mut last_version = driver.state.results.committed().version();
    for event in rx.iter() {
        driver.begin_turn();
        print_if_committed(&driver, &mut last_version, out)?;
        driver.dispatch(DashAction::Runtime(event.into_action()));
    }
    while driver.has_deferred_work() {
        driver.begin_turn();
        print_if_committed(&driver, &mut last_version, out)?;
    }

    print_panel(driver.state.results.committed(), &driver.state.header.tenant_id, out)?;
    if let Some(answer) = driver.state.chat.last() {
        writeln!(out, "\n{}", answer.text)?;
    }
    let stats = driver.state.stats;
    info!(
        accepted = stats.accepted_events,
        rejected = stats.rejected_events,
        flushes = stats.flushes,
        "ask finished"
    );
    out.flush().context("failed to write output")
}

fn print_if_committed<W: Write>(
    driver: &Driver,
    last_version: &mut u64,
    out: &mut W,
) -> anyhow::Result<()> {
    let committed = driver.state.results.committed();
    if committed.version() == *last_version {
        return Ok(());
    }
    *last_version = committed.version();
    let cards: Vec<String> = tool_cards(committed)
        .into_iter()
        .map(|card| format!("{}={}", card.tool_name, card.phase.label()))
        .collect();
    writeln!(out, "commit v{}: {}", committed.version(), cards.join(" "))?;
    Ok(())
}

fn print_commit<W: Write>(commit: &Commit, out: &mut W) -> anyhow::Result<()> {
    let transitions: Vec<String> = commit
        .transitions
        .iter()
        .map(|record| format!("{}={}", record.tool_name, record.phase.label()))
        .collect();
    writeln!(out, "commit v{}: {}", commit.version, transitions.join(" "))?;
    Ok(())
}

fn print_panel<W: Write>(snapshot: &Snapshot, tenant_id: &str, out: &mut W) -> anyhow::Result<()> {
    let options = RenderOptions {
        palette: palette_for(UiTheme::Classic),
        theme: UiTheme::Classic,
        tenant_id,
        raw_payload: false,
        spinner: "...",
    };
    let (title, lines) = render_panel(resolve_panel(snapshot), options);
    writeln!(out, "== {title} ==")?;
    writeln!(out, "{}", to_plain_text(&lines))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    fn replay(script: &str) -> String {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("script.jsonl");
        fs::write(&path, script).expect("write script");
        let mut out = Vec::new();
        run_replay(&path, "tenant-demo-001", &mut out).expect("replay");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn replay_collapses_each_turn_into_one_commit() {
        let output = replay(concat!(
            "{\"tool_name\": \"get_sla_compliance\", \"phase\": \"pending\"}\n",
            "{\"tool_name\": \"get_sla_compliance\", \"phase\": \"running\"}\n",
            "{\"turn\": true}\n",
            "{\"tool_name\": \"get_sla_compliance\", \"phase\": \"complete\", \"payload\": {\"uptime\": 99.9}}\n",
        ));
        let commits: Vec<&str> = output.lines().filter(|line| line.starts_with("commit")).collect();
        assert_eq!(
            commits,
            vec![
                "commit v1: get_sla_compliance=pending get_sla_compliance=running",
                "commit v2: get_sla_compliance=complete",
            ]
        );
        assert!(output.contains("== SLA Compliance =="));
        assert!(output.contains("Unexpected payload shape"));
    }

    #[test]
    fn replay_reports_rejected_events_and_keeps_going() {
        let output = replay(concat!(
            "{\"tool_name\": \"\", \"phase\": \"pending\"}\n",
            "{\"tool_name\": \"get_transaction_summary\", \"phase\": \"finished\"}\n",
            "{\"turn\": true}\n",
        ));
        assert!(output.starts_with("rejected \"\""));
        assert!(output.ends_with("2 event(s) rejected\n"));
        assert!(!output.contains("commit"));
    }

    #[test]
    fn ask_prints_commits_and_the_final_panel() {
        let mut config = Config::default();
        config.agent.seed = Some(3);
        let mut out = Vec::new();
        run_ask(&config, "Are we meeting our SLA targets?", Some("tenant-acme"), &mut out)
            .expect("ask");
        let output = String::from_utf8(out).expect("utf8");

        assert!(output.contains("commit v1: get_sla_compliance=pending"));
        assert!(output.contains("get_sla_compliance=complete"));
        assert!(output.contains("== SLA Compliance =="));
        assert!(output.contains("Tenant tenant-acme"));
        assert!(output.contains("SLA: uptime"));
    }

    #[test]
    fn ask_without_intent_shows_the_welcome_panel() {
        let mut out = Vec::new();
        run_ask(&Config::default(), "hello", None, &mut out).expect("ask");
        let output = String::from_utf8(out).expect("utf8");
        assert!(!output.contains("commit"));
        assert!(output.starts_with("== FinOps Agent =="));
        assert!(output.contains("I'm your FinOps assistant."));
    }

    #[test]
    fn blank_prompt_is_an_error() {
        let mut out = Vec::new();
        let err = run_ask(&Config::default(), "   ", None, &mut out).expect_err("blank");
        assert_eq!(err.to_string(), "prompt is empty");
    }
}
