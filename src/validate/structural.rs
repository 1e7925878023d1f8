//! Graph-level structural validation rules (V001–V011).

use std::collections::{HashSet, VecDeque};

use crate::parse::graph::WorkflowGraph;
use crate::parse::types::{NodeType, Workflow, WorkflowNode};
use crate::validate::report::ValidationIssue;

/// Run all structural validation rules. Returns all issues found, in rule order.
pub fn validate_structural(workflow: &Workflow, graph: &WorkflowGraph) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let start_id = v001_exactly_one_start(workflow, &mut issues);
    let end_id = v002_exactly_one_end(workflow, &mut issues);
    v003_no_cycles(graph, &mut issues);
    v004_all_reachable_from_start(workflow, graph, start_id, &mut issues);
    v005_end_has_no_outgoing(graph, end_id, &mut issues);
    v006_all_reach_end(workflow, graph, end_id, &mut issues);
    v007_only_end_is_terminal(workflow, &mut issues);
    v008_parallel_branches_reach_join(workflow, graph, &mut issues);
    v009_join_connectivity(workflow, graph, &mut issues);
    v010_edges_reference_existing_nodes(graph, &mut issues);
    v011_unique_node_ids(graph, &mut issues);

    issues
}

/// Returns the id of the first START node, if any.
fn v001_exactly_one_start<'a>(
    workflow: &'a Workflow,
    issues: &mut Vec<ValidationIssue>,
) -> Option<&'a str> {
    exactly_one(workflow, NodeType::Start, "V001", issues)
}

/// Returns the id of the first END node, if any.
fn v002_exactly_one_end<'a>(
    workflow: &'a Workflow,
    issues: &mut Vec<ValidationIssue>,
) -> Option<&'a str> {
    exactly_one(workflow, NodeType::End, "V002", issues)
}

fn exactly_one<'a>(
    workflow: &'a Workflow,
    node_type: NodeType,
    code: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<&'a str> {
    let mut matching = workflow.nodes.iter().filter(|n| n.node_type() == node_type);
    let Some(first) = matching.next() else {
        issues.push(ValidationIssue::error(
            code,
            format!(
                "Missing {0} node: workflow must have exactly 1 {0} node",
                node_type
            ),
            None,
        ));
        return None;
    };

    for duplicate in matching {
        issues.push(ValidationIssue::error(
            code,
            format!(
                "Only one {} node is allowed; node \"{}\" is a duplicate",
                node_type,
                duplicate.display_label()
            ),
            Some(duplicate.id().to_string()),
        ));
    }

    Some(first.id())
}

fn v003_no_cycles(graph: &WorkflowGraph, issues: &mut Vec<ValidationIssue>) {
    if graph.has_cycle() {
        issues.push(ValidationIssue::error(
            "V003",
            "Workflow graph contains a cycle; cycles are not allowed",
            None,
        ));
    }
}

fn v004_all_reachable_from_start(
    workflow: &Workflow,
    graph: &WorkflowGraph,
    start_id: Option<&str>,
    issues: &mut Vec<ValidationIssue>,
) {
    let reachable = graph.reachable_from(start_id);
    for node in &workflow.nodes {
        if !reachable.contains(node.id()) {
            issues.push(ValidationIssue::warning(
                "V004",
                format!("Node \"{}\" is unreachable from START", node.display_label()),
                Some(node.id().to_string()),
            ));
        }
    }
}

fn v005_end_has_no_outgoing(
    graph: &WorkflowGraph,
    end_id: Option<&str>,
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(end_id) = end_id else { return };
    let count = graph.outgoing_count(end_id);
    if count > 0 {
        issues.push(ValidationIssue::error(
            "V005",
            format!("END node must not have outgoing edges, found {}", count),
            Some(end_id.to_string()),
        ));
    }
}

fn v006_all_reach_end(
    workflow: &Workflow,
    graph: &WorkflowGraph,
    end_id: Option<&str>,
    issues: &mut Vec<ValidationIssue>,
) {
    let reaches_end = graph.reaches_target(end_id);
    for node in &workflow.nodes {
        if !reaches_end.contains(node.id()) {
            issues.push(ValidationIssue::warning(
                "V006",
                format!("Node \"{}\" does not reach END", node.display_label()),
                Some(node.id().to_string()),
            ));
        }
    }
}

/// Counts declared edges, so an edge to a missing node still counts as
/// outgoing here and is reported by V010 alone.
fn v007_only_end_is_terminal(workflow: &Workflow, issues: &mut Vec<ValidationIssue>) {
    for node in &workflow.nodes {
        let has_outgoing = workflow.edges.iter().any(|e| e.source == node.id());
        if node.node_type() != NodeType::End && !has_outgoing {
            issues.push(ValidationIssue::error(
                "V007",
                format!(
                    "Only END may be a terminal node; node \"{}\" has no outgoing edges",
                    node.display_label()
                ),
                Some(node.id().to_string()),
            ));
        }
    }
}

fn v008_parallel_branches_reach_join(
    workflow: &Workflow,
    graph: &WorkflowGraph,
    issues: &mut Vec<ValidationIssue>,
) {
    for node in &workflow.nodes {
        if let WorkflowNode::Parallel(_) = node {
            check_fork(node, graph, issues);
        }
    }
}

/// Walk every branch of a PARALLEL node until it hits a PARALLEL_JOIN. Each
/// dead end reached first is reported once against the fork.
fn check_fork(fork: &WorkflowNode, graph: &WorkflowGraph, issues: &mut Vec<ValidationIssue>) {
    let fork_id = Some(fork.id().to_string());
    let branches = graph.successors(fork.id());
    if branches.is_empty() {
        issues.push(ValidationIssue::error(
            "V008",
            format!(
                "PARALLEL node \"{}\" must have at least one outgoing branch",
                fork.display_label()
            ),
            fork_id,
        ));
        return;
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    for (target, _) in branches {
        if visited.insert(target) {
            queue.push_back(target);
        }
    }

    while let Some(current) = queue.pop_front() {
        if graph.node_type(current) == Some(NodeType::ParallelJoin) {
            continue;
        }
        let next = graph.successors(current);
        if next.is_empty() {
            issues.push(ValidationIssue::error(
                "V008",
                format!(
                    "PARALLEL node \"{}\": branch ends without reaching a join barrier (dead end at \"{}\")",
                    fork.display_label(),
                    graph.display_label(current)
                ),
                fork_id.clone(),
            ));
            continue;
        }
        for (target, _) in next {
            if visited.insert(target) {
                queue.push_back(target);
            }
        }
    }
}

fn v009_join_connectivity(
    workflow: &Workflow,
    graph: &WorkflowGraph,
    issues: &mut Vec<ValidationIssue>,
) {
    for node in &workflow.nodes {
        if let WorkflowNode::ParallelJoin(_) = node {
            let incoming = graph.incoming_count(node.id());
            if incoming < 2 {
                issues.push(ValidationIssue::warning(
                    "V009",
                    format!(
                        "PARALLEL_JOIN node \"{}\" should have at least 2 incoming edges, found {}",
                        node.display_label(),
                        incoming
                    ),
                    Some(node.id().to_string()),
                ));
            }
            if graph.outgoing_count(node.id()) == 0 {
                issues.push(ValidationIssue::warning(
                    "V009",
                    format!(
                        "PARALLEL_JOIN node \"{}\" has no outgoing edge and would stall the workflow",
                        node.display_label()
                    ),
                    Some(node.id().to_string()),
                ));
            }
        }
    }
}

fn v010_edges_reference_existing_nodes(graph: &WorkflowGraph, issues: &mut Vec<ValidationIssue>) {
    for edge in graph.dangling_edges() {
        if edge.missing_source {
            issues.push(ValidationIssue::error(
                "V010",
                format!(
                    "Edge #{} from '{}' to '{}' references unknown source node '{}'",
                    edge.position, edge.source, edge.target, edge.source
                ),
                None,
            ));
        }
        if edge.missing_target {
            issues.push(ValidationIssue::error(
                "V010",
                format!(
                    "Edge #{} from '{}' to '{}' references unknown target node '{}'",
                    edge.position, edge.source, edge.target, edge.target
                ),
                None,
            ));
        }
    }
}

fn v011_unique_node_ids(graph: &WorkflowGraph, issues: &mut Vec<ValidationIssue>) {
    for id in graph.duplicate_ids() {
        issues.push(ValidationIssue::error(
            "V011",
            format!("Duplicate node id '{}'", id),
            Some(id.clone()),
        ));
    }
}
