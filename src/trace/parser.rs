//! Line-oriented state machine that rebuilds execution steps from engine stdout.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::NodeLabelLookup;
use super::completion::{self, WorkflowFinished};
use super::protocol::{
    CONFIG, DURATION, ERROR_RESULT, EXEC_DETAILS, INPUT_DATA, OUTPUT_DATA, TraceProtocol,
};
use super::result::{ExecutionStep, StepStatus};

static NODE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Nodo:\s+\S+\s+\[([^\]]+)\]").expect("invalid node header regex")
});

static DURATION_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"DURATION -->:\s+(\d+)ms").expect("invalid duration regex")
});

/// Final output of a parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    /// Steps in the order their init line first appeared.
    pub steps: Vec<ExecutionStep>,
    /// Last `WORKFLOW_FINISHED` event seen, if any.
    pub completion: Option<WorkflowFinished>,
}

/// Incremental trace parser.
///
/// Chunks may split lines anywhere; only complete lines are applied until
/// [`TraceParser::finish`] flushes the trailing partial line. Any chunking of
/// a buffer gives the same trace as parsing the whole buffer at once.
pub struct TraceParser<'a, L: NodeLabelLookup + ?Sized> {
    labels: &'a L,
    protocol: TraceProtocol,
    steps: Vec<ExecutionStep>,
    by_id: HashMap<String, usize>,
    pending: String,
    completion: Option<WorkflowFinished>,
}

impl<'a, L: NodeLabelLookup + ?Sized> TraceParser<'a, L> {
    pub fn new(labels: &'a L) -> Self {
        Self::with_protocol(labels, TraceProtocol::default())
    }

    pub fn with_protocol(labels: &'a L, protocol: TraceProtocol) -> Self {
        TraceParser {
            labels,
            protocol,
            steps: Vec::new(),
            by_id: HashMap::new(),
            pending: String::new(),
            completion: None,
        }
    }

    /// Apply every complete line of `chunk`, buffering the unterminated tail.
    pub fn feed(&mut self, chunk: &str) {
        self.pending.push_str(chunk);
        let Some(last_newline) = self.pending.rfind('\n') else {
            return;
        };
        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);
        for line in complete.lines() {
            self.apply_line(line);
        }
    }

    pub fn steps(&self) -> &[ExecutionStep] {
        &self.steps
    }

    pub fn completion(&self) -> Option<&WorkflowFinished> {
        self.completion.as_ref()
    }

    pub fn finish(mut self) -> Trace {
        let tail = std::mem::take(&mut self.pending);
        if !tail.is_empty() {
            self.apply_line(&tail);
        }
        Trace {
            steps: self.steps,
            completion: self.completion,
        }
    }

    fn apply_line(&mut self, line: &str) {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(event) = completion::parse_finished_line(line) {
            self.completion = Some(event);
        }

        let Some(node_id) = self.protocol.node_tag(line) else {
            return;
        };

        let index = match self.by_id.get(node_id) {
            Some(&index) => index,
            None => {
                // Nothing attaches to a node until its init line shows up
                let Some(caps) = NODE_HEADER.captures(line) else {
                    return;
                };
                let node_type = caps[1].trim();
                let label = self
                    .labels
                    .node_label(node_id)
                    .unwrap_or(self.protocol.fallback_label.as_str())
                    .to_string();
                tracing::trace!(node_id, node_type, "opening execution step");
                self.steps.push(ExecutionStep::new(node_id, node_type, label));
                self.by_id.insert(node_id.to_string(), self.steps.len() - 1);
                self.steps.len() - 1
            }
        };

        apply_markers(&mut self.steps[index], line, &self.protocol);
    }
}

fn apply_markers(step: &mut ExecutionStep, line: &str, protocol: &TraceProtocol) {
    if let Some(tail) = marker_tail(line, INPUT_DATA) {
        step.input_data = parse_json_fragment(tail);
    }
    if let Some(tail) = marker_tail(line, CONFIG) {
        step.config_data = parse_json_fragment(tail);
    }
    if let Some(tail) = marker_tail(line, OUTPUT_DATA) {
        step.output_data = parse_json_fragment(tail);
    }
    if let Some(tail) = marker_tail(line, EXEC_DETAILS) {
        step.details = parse_json_fragment(tail);
    }
    if let Some(tail) = marker_tail(line, ERROR_RESULT) {
        let message = tail.trim();
        step.status = StepStatus::Error;
        step.error = Some(if message.is_empty() {
            protocol.fallback_error.clone()
        } else {
            message.to_string()
        });
    }
    if line.contains(DURATION) {
        if let Some(ms) = DURATION_VALUE
            .captures(line)
            .and_then(|caps| caps[1].parse::<u64>().ok())
        {
            step.duration_ms = ms;
        }
    }
}

fn marker_tail<'l>(line: &'l str, marker: &str) -> Option<&'l str> {
    line.find(marker).map(|at| &line[at + marker.len()..])
}

/// Empty text is an empty object; malformed text is `None` (serialized as null).
fn parse_json_fragment(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return Some(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_fragment_parsing() {
        assert_eq!(parse_json_fragment(r#" {"a": 1} "#), Some(json!({"a": 1})));
        assert_eq!(parse_json_fragment("   "), Some(json!({})));
        assert_eq!(parse_json_fragment("{status=200}"), None);
        assert_eq!(parse_json_fragment("[1, 2"), None);
    }

    #[test]
    fn marker_tail_takes_text_after_marker() {
        assert_eq!(
            marker_tail("x    OUTPUT DATA -->: {}", OUTPUT_DATA),
            Some(" {}")
        );
        assert_eq!(marker_tail("x -> INPUT DATA:", INPUT_DATA), Some(""));
        assert_eq!(marker_tail("nothing here", CONFIG), None);
    }

    #[test]
    fn duration_requires_ms_suffix() {
        let mut step = ExecutionStep::new("n", "COMMAND", "n");
        let protocol = TraceProtocol::default();
        apply_markers(&mut step, "DURATION -->: 15", &protocol);
        assert_eq!(step.duration_ms, 0);
        apply_markers(&mut step, "DURATION -->: 15ms", &protocol);
        assert_eq!(step.duration_ms, 15);
    }
}
