//! The engine's structured end-of-run event.
//!
//! The engine prints one JSON line such as
//! `{"event": "WORKFLOW_FINISHED", "status": "SUCCESS", "duration": 812}` when
//! the root run ends. Seeing it lets a caller finish the run before the
//! process exits. A malformed line is simply not an event, so the caller
//! keeps waiting for process exit.

use serde::{Deserialize, Serialize};

use super::protocol::FINISHED_EVENT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowFinished {
    pub event: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

impl WorkflowFinished {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("SUCCESS")
    }
}

/// Parse a single line as a `WORKFLOW_FINISHED` event.
pub fn parse_finished_line(line: &str) -> Option<WorkflowFinished> {
    if !line.contains(FINISHED_EVENT) {
        return None;
    }
    let start = line.find('{')?;
    let end = line.rfind('}')?;
    if end < start {
        return None;
    }
    let event: WorkflowFinished = serde_json::from_str(&line[start..=end]).ok()?;
    (event.event == FINISHED_EVENT).then_some(event)
}

/// First well-formed `WORKFLOW_FINISHED` event anywhere in a stdout chunk.
pub fn detect_completion(chunk: &str) -> Option<WorkflowFinished> {
    chunk.lines().find_map(parse_finished_line)
}
