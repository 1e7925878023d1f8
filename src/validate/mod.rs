//! Graph-level validation phase.
//!
//! Validates the workflow graph before it is handed to the engine. A pass
//! never stops at the first problem; every issue ends up in the report.

pub mod node_rules;
pub mod report;
pub mod structural;

use crate::parse::graph::WorkflowGraph;
use crate::parse::types::{Workflow, WorkflowEdge, WorkflowNode};
use crate::registry::{self, NodeRegistry, RuleContext};

pub use report::{IssueAction, IssueCounts, Severity, ValidationIssue, ValidationReport};

/// Validate a workflow against the built-in node rules.
pub fn validate(workflow: &Workflow) -> ValidationReport {
    validate_with(workflow, registry::builtin())
}

/// Validate a workflow against a custom node registry.
pub fn validate_with(workflow: &Workflow, registry: &NodeRegistry) -> ValidationReport {
    let graph = WorkflowGraph::build(workflow);
    validate_graph(workflow, &graph, registry)
}

/// Validate the entire workflow graph (structural + node configs).
pub fn validate_graph(
    workflow: &Workflow,
    graph: &WorkflowGraph,
    registry: &NodeRegistry,
) -> ValidationReport {
    tracing::debug!(
        workflow = %workflow.id,
        nodes = workflow.nodes.len(),
        edges = workflow.edges.len(),
        "validating workflow"
    );

    let mut issues = structural::validate_structural(workflow, graph);

    for node in &workflow.nodes {
        issues.extend(validate_node(node, graph, registry));
    }

    let report = ValidationReport::new(issues);
    tracing::debug!(
        workflow = %workflow.id,
        valid = report.is_valid(),
        issues = report.issues().len(),
        "validation finished"
    );
    report
}

/// Validate a single node's configuration in the context of its graph.
pub fn validate_node(
    node: &WorkflowNode,
    graph: &WorkflowGraph,
    registry: &NodeRegistry,
) -> Vec<ValidationIssue> {
    registry.validate_config(node, &RuleContext::for_node(node, graph))
}

/// Validate a single node's configuration against a bare edge list, as the
/// editor does while a node is being edited.
pub fn validate_node_with_edges(
    node: &WorkflowNode,
    edges: &[WorkflowEdge],
    registry: &NodeRegistry,
) -> Vec<ValidationIssue> {
    registry.validate_config(node, &RuleContext::from_edges(node.id(), edges))
}
