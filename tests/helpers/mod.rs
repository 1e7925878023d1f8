#![allow(dead_code)]

use miniflow::parse::*;
use miniflow::validate::ValidationReport;

// =============================================================================
// Node builders
// =============================================================================

pub fn start(id: &str) -> WorkflowNode {
    WorkflowNode::Start(NodeBase::new(id, "Start", EmptyConfig {}))
}

pub fn end(id: &str) -> WorkflowNode {
    WorkflowNode::End(NodeBase::new(id, "End", EmptyConfig {}))
}

pub fn command(id: &str, cmd: &str) -> WorkflowNode {
    WorkflowNode::Command(NodeBase::new(
        id,
        id,
        CommandConfig {
            command: Some(cmd.into()),
            ..CommandConfig::default()
        },
    ))
}

pub fn http(id: &str, url: &str) -> WorkflowNode {
    WorkflowNode::HttpRequest(NodeBase::new(
        id,
        id,
        HttpRequestConfig {
            method: Some("GET".into()),
            url: Some(url.into()),
            timeout_ms: Some(NumericInput::Number(5000.0)),
            retries: Some(NumericInput::Number(3.0)),
            ..HttpRequestConfig::default()
        },
    ))
}

pub fn conditional(id: &str, condition: &str) -> WorkflowNode {
    WorkflowNode::Conditional(NodeBase::new(
        id,
        id,
        ConditionalConfig {
            condition: Some(condition.into()),
            ..ConditionalConfig::default()
        },
    ))
}

pub fn timer(id: &str) -> WorkflowNode {
    WorkflowNode::Timer(NodeBase::new(id, id, TimerConfig::default()))
}

pub fn parallel(id: &str) -> WorkflowNode {
    WorkflowNode::Parallel(NodeBase::new(id, id, EmptyConfig {}))
}

pub fn join(id: &str) -> WorkflowNode {
    WorkflowNode::ParallelJoin(NodeBase::new(id, id, EmptyConfig {}))
}

// =============================================================================
// Edge and workflow builders
// =============================================================================

pub fn edge(source: &str, target: &str) -> WorkflowEdge {
    WorkflowEdge::new(source, target)
}

/// Edge leaving a CONDITIONAL through the given handle (`true` / `false`).
pub fn branch(source: &str, target: &str, handle: &str) -> WorkflowEdge {
    WorkflowEdge {
        source_handle: Some(handle.into()),
        ..WorkflowEdge::new(source, target)
    }
}

pub fn workflow(nodes: Vec<WorkflowNode>, edges: Vec<WorkflowEdge>) -> Workflow {
    Workflow {
        id: "test-wf".into(),
        name: "Test Workflow".into(),
        description: None,
        nodes,
        edges,
    }
}

/// START → nodes... → END, chained in order.
pub fn chain(nodes: Vec<WorkflowNode>) -> Workflow {
    let mut all = vec![start("start")];
    all.extend(nodes);
    all.push(end("end"));
    let edges = all
        .windows(2)
        .map(|pair| edge(pair[0].id(), pair[1].id()))
        .collect();
    workflow(all, edges)
}

// =============================================================================
// Report helpers
// =============================================================================

pub fn codes(report: &ValidationReport) -> Vec<&str> {
    report.issues().iter().map(|i| i.code.as_str()).collect()
}

pub fn has_code(report: &ValidationReport, code: &str) -> bool {
    report.issues().iter().any(|i| i.code == code)
}
