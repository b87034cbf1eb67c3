//! Recorded tool event streams.
//!
//! One JSON object per line: either a [`ToolEvent`] or `{"turn": true}`,
//! which ends the current scheduling turn. Blank lines and lines starting
//! with `#` are skipped.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::contracts::ToolEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum ReplayStep {
    Event(ToolEvent),
    EndTurn,
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read replay script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("replay script line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptLine {
    Turn { turn: bool },
    Event(ToolEvent),
}

pub fn parse_script(input: &str) -> Result<Vec<ReplayStep>, ReplayError> {
    let mut steps = Vec::new();
    for (idx, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parsed: ScriptLine = serde_json::from_str(line).map_err(|source| ReplayError::Parse {
            line: idx + 1,
            source,
        })?;
        match parsed {
            ScriptLine::Turn { turn: true } => steps.push(ReplayStep::EndTurn),
            ScriptLine::Turn { turn: false } => {}
            ScriptLine::Event(event) => steps.push(ReplayStep::Event(event)),
        }
    }
    Ok(steps)
}

pub fn load_script(path: &Path) -> Result<Vec<ReplayStep>, ReplayError> {
    let input = fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script(&input)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_events_and_turn_markers() {
        let script = r#"
# scenario A
{"tool_name": "get_sla_compliance", "phase": "pending"}
{"tool_name": "get_sla_compliance", "phase": "running"}
{"tool_name": "get_sla_compliance", "phase": "complete", "payload": {"uptime": 99.9}}
{"turn": true}
"#;
        let steps = parse_script(script).expect("parse");
        assert_eq!(
            steps,
            vec![
                ReplayStep::Event(ToolEvent::new("get_sla_compliance", "pending", None)),
                ReplayStep::Event(ToolEvent::new("get_sla_compliance", "running", None)),
                ReplayStep::Event(ToolEvent::new(
                    "get_sla_compliance",
                    "complete",
                    Some(json!({ "uptime": 99.9 }))
                )),
                ReplayStep::EndTurn,
            ]
        );
    }

    #[test]
    fn unknown_phases_are_left_for_the_store_to_reject() {
        let steps = parse_script(r#"{"tool_name": "a", "phase": "finished"}"#).expect("parse");
        assert_eq!(
            steps,
            vec![ReplayStep::Event(ToolEvent::new("a", "finished", None))]
        );
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let err = parse_script("{\"turn\": true}\n\nnot json\n").expect_err("should fail");
        match err {
            ReplayError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn load_script_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, r#"{{"tool_name": "get_sla_compliance", "phase": "pending"}}"#)
            .expect("write");
        writeln!(file, r#"{{"turn": true}}"#).expect("write");

        let steps = load_script(file.path()).expect("load");
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn missing_script_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_script(&dir.path().join("missing.jsonl")).expect_err("missing");
        assert!(matches!(err, ReplayError::Io { .. }));
    }
}
