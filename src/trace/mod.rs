//! Execution trace phase.
//!
//! Turns the engine's line-structured stdout into per-node execution steps
//! and detects the structured end-of-run event.

pub mod completion;
pub mod parser;
pub mod protocol;
pub mod result;

use std::collections::HashMap;

use crate::parse::types::{Workflow, WorkflowNode};

pub use completion::{WorkflowFinished, detect_completion, parse_finished_line};
pub use parser::{Trace, TraceParser};
pub use protocol::TraceProtocol;
pub use result::{
    EngineOutput, ExecutionResult, ExecutionStep, RunCompletion, RunMetadata, RunStatus,
    StepStatus, run_status,
};

/// Source of human-readable labels for the node ids seen in a trace.
pub trait NodeLabelLookup {
    /// Label for `node_id`, or `None` when unknown or blank.
    fn node_label(&self, node_id: &str) -> Option<&str>;
}

impl NodeLabelLookup for [WorkflowNode] {
    fn node_label(&self, node_id: &str) -> Option<&str> {
        self.iter()
            .find(|n| n.id() == node_id)
            .map(WorkflowNode::label)
            .filter(|l| !l.trim().is_empty())
    }
}

impl NodeLabelLookup for Vec<WorkflowNode> {
    fn node_label(&self, node_id: &str) -> Option<&str> {
        self.as_slice().node_label(node_id)
    }
}

impl NodeLabelLookup for Workflow {
    fn node_label(&self, node_id: &str) -> Option<&str> {
        self.nodes.node_label(node_id)
    }
}

impl NodeLabelLookup for HashMap<String, String> {
    fn node_label(&self, node_id: &str) -> Option<&str> {
        self.get(node_id)
            .map(String::as_str)
            .filter(|l| !l.trim().is_empty())
    }
}

/// Parse a complete stdout buffer with the default protocol.
pub fn parse_trace<L: NodeLabelLookup + ?Sized>(stdout: &str, labels: &L) -> Trace {
    parse_trace_with(stdout, labels, TraceProtocol::default())
}

pub fn parse_trace_with<L: NodeLabelLookup + ?Sized>(
    stdout: &str,
    labels: &L,
    protocol: TraceProtocol,
) -> Trace {
    let mut parser = TraceParser::with_protocol(labels, protocol);
    parser.feed(stdout);
    parser.finish()
}
