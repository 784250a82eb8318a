//! Command handlers and dump-file loading shared between them.

pub mod config_cmd;
pub mod events;
pub mod replay;
pub mod verify;

use std::path::Path;

use ozw_core::OzwManager;

use crate::error::CliError;

/// One message of a broker dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpLine {
    /// 1-based line number in the file.
    pub line: usize,
    pub topic: String,
    pub payload: String,
}

/// Split a dump line at its first comma. The payload may itself contain
/// commas; it may also be empty (a delete marker).
fn parse_line(raw: &str) -> Result<(&str, &str), &'static str> {
    let (topic, payload) = raw.split_once(',').ok_or("missing ',' between topic and payload")?;
    let topic = topic.trim();
    if topic.is_empty() {
        return Err("empty topic");
    }
    Ok((topic, payload.trim()))
}

/// Read every message of a dump file. Blank lines are skipped; anything
/// else that is not `topic,payload` aborts the load.
pub fn read_dump(path: &Path) -> Result<Vec<DumpLine>, CliError> {
    let text = std::fs::read_to_string(path)?;
    let mut out = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let (topic, payload) = parse_line(raw).map_err(|reason| CliError::DumpLine {
            path: path.display().to_string(),
            line: idx + 1,
            reason: reason.into(),
        })?;
        out.push(DumpLine {
            line: idx + 1,
            topic: topic.to_owned(),
            payload: payload.to_owned(),
        });
    }
    tracing::debug!(path = %path.display(), messages = out.len(), "loaded dump");
    Ok(out)
}

/// Feed a dump through `manager` in file order. The first message the
/// manager rejects stops the replay with its line number.
pub fn replay_into(manager: &mut OzwManager, path: &Path, dump: &[DumpLine]) -> Result<(), CliError> {
    for msg in dump {
        manager
            .receive_message(&msg.topic, &msg.payload)
            .map_err(|e| CliError::DumpLine {
                path: path.display().to_string(),
                line: msg.line,
                reason: e.to_string(),
            })?;
    }
    Ok(())
}
