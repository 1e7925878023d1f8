//! Markers of the engine's stdout line protocol.

use serde::{Deserialize, Serialize};

/// Prefix the engine writes before every line it emits.
pub const ENGINE_TAG: &str = "[JAVA-STDOUT]:";

pub const INPUT_DATA: &str = "-> INPUT DATA:";
pub const CONFIG: &str = "-> CONFIG:";
pub const OUTPUT_DATA: &str = "OUTPUT DATA -->:";
pub const EXEC_DETAILS: &str = "NODE_EXEC_DETAILS -->:";
pub const ERROR_RESULT: &str = "Resultado: ERROR -->";
pub const DURATION: &str = "DURATION -->:";

pub const FINISHED_EVENT: &str = "WORKFLOW_FINISHED";

pub const DEFAULT_FALLBACK_LABEL: &str = "Nodo";
pub const DEFAULT_FALLBACK_ERROR: &str = "Execution error";

/// Tunable parts of the protocol. Every field has a default, so a partial
/// JSON object is enough to override one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TraceProtocol {
    /// Tag that must precede the bracketed node id on node-scoped lines.
    pub engine_tag: String,
    /// Label used when a step's node is not in the workflow.
    pub fallback_label: String,
    /// Error text used when `Resultado: ERROR -->` carries no message.
    pub fallback_error: String,
}

impl Default for TraceProtocol {
    fn default() -> Self {
        TraceProtocol {
            engine_tag: ENGINE_TAG.into(),
            fallback_label: DEFAULT_FALLBACK_LABEL.into(),
            fallback_error: DEFAULT_FALLBACK_ERROR.into(),
        }
    }
}

impl TraceProtocol {
    /// Node id of a node-scoped line (`<tag> [<id>] ...`), or `None` for
    /// global log lines.
    pub fn node_tag<'l>(&self, line: &'l str) -> Option<&'l str> {
        let start = line.find(self.engine_tag.as_str())? + self.engine_tag.len();
        let rest = line[start..].trim_start().strip_prefix('[')?;
        let end = rest.find(']')?;
        let id = rest[..end].trim();
        (!id.is_empty()).then_some(id)
    }
}
