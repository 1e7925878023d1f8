//! Per-node configuration rules (N001–N008).
//!
//! Each function is registered for one node type in `crate::registry` and
//! only ever emits error-severity issues.

use crate::parse::types::*;
use crate::registry::RuleContext;
use crate::validate::report::ValidationIssue;

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

/// Rule for node types without required fields (START, END, TIMER, PARALLEL,
/// PARALLEL_JOIN). TIMER's delay and unit fall back to engine defaults.
pub fn no_rules(_node: &WorkflowNode, _ctx: &RuleContext<'_>) -> Vec<ValidationIssue> {
    vec![]
}

pub fn http_request(node: &WorkflowNode, _ctx: &RuleContext<'_>) -> Vec<ValidationIssue> {
    let WorkflowNode::HttpRequest(n) = node else {
        return vec![];
    };
    let mut errors = Vec::new();
    let label = node.display_label();
    let node_id = Some(node.id().to_string());
    let config = &n.data.config;

    if is_blank(&config.url) {
        errors.push(ValidationIssue::error(
            "N001",
            format!("HTTP_REQUEST \"{}\" has no URL", label),
            node_id.clone(),
        ));
    }
    if is_blank(&config.method) {
        errors.push(ValidationIssue::error(
            "N002",
            format!("HTTP_REQUEST \"{}\" has no method", label),
            node_id.clone(),
        ));
    }
    if let Some(timeout) = &config.timeout_ms {
        if !timeout.finite_value().is_some_and(|t| t > 0.0) {
            errors.push(ValidationIssue::error(
                "N003",
                format!(
                    "HTTP_REQUEST \"{}\" has an invalid timeout: must be a number greater than 0",
                    label
                ),
                node_id.clone(),
            ));
        }
    }
    if let Some(retries) = &config.retries {
        if !retries.finite_value().is_some_and(|r| r >= 0.0) {
            errors.push(ValidationIssue::error(
                "N004",
                format!(
                    "HTTP_REQUEST \"{}\" has invalid retries: must be a number of at least 0",
                    label
                ),
                node_id,
            ));
        }
    }

    errors
}

pub fn conditional(node: &WorkflowNode, ctx: &RuleContext<'_>) -> Vec<ValidationIssue> {
    let WorkflowNode::Conditional(n) = node else {
        return vec![];
    };
    let mut errors = Vec::new();
    let label = node.display_label();
    let node_id = Some(node.id().to_string());
    let config = &n.data.config;

    let has_expression = !is_blank(&config.condition);
    let has_structured = !is_blank(&config.left_operand) && !is_blank(&config.operator);
    if !has_expression && !has_structured {
        errors.push(ValidationIssue::error(
            "N005",
            format!("CONDITIONAL \"{}\" has no condition", label),
            node_id.clone(),
        ));
    }

    let labels: Vec<String> = ctx.outgoing.iter().map(|e| e.branch_label()).collect();
    let true_count = labels.iter().filter(|l| *l == "TRUE").count();
    let false_count = labels.iter().filter(|l| *l == "FALSE").count();
    if labels.len() != 2 || true_count != 1 || false_count != 1 {
        errors.push(ValidationIssue::error(
            "N006",
            format!(
                "CONDITIONAL \"{}\" must have exactly 2 outgoing edges: TRUE and FALSE",
                label
            ),
            node_id,
        ));
    }

    errors
}

pub fn command(node: &WorkflowNode, _ctx: &RuleContext<'_>) -> Vec<ValidationIssue> {
    let WorkflowNode::Command(n) = node else {
        return vec![];
    };
    let mut errors = Vec::new();
    let label = node.display_label();
    let node_id = Some(node.id().to_string());
    let config = &n.data.config;

    let command = config.command.as_deref().unwrap_or_default().trim();
    if command.is_empty() {
        errors.push(ValidationIssue::error(
            "N007",
            format!("COMMAND \"{}\" has no command", label),
            node_id.clone(),
        ));
    }
    if is_python(command) && is_blank(&config.script_path) {
        errors.push(ValidationIssue::error(
            "N008",
            format!("COMMAND \"{}\" runs python and requires a local script path", label),
            node_id,
        ));
    }

    errors
}

/// `python` or `python3`, optionally followed by arguments.
fn is_python(command: &str) -> bool {
    let program = command.split_whitespace().next().unwrap_or_default();
    program.eq_ignore_ascii_case("python") || program.eq_ignore_ascii_case("python3")
}
