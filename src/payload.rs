//! Canonical engine payload.
//!
//! The engine reads one JSON document on stdin:
//! `{name, nodes: [{id, type, data: {label, config}, position}], edges: [{source, target, sourceHandle?, label?}]}`.
//! Editor-only fields (edge ids, workflow id and description) are dropped and
//! blank text fields are removed from node configs.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::EngineError;
use crate::parse::types::*;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PayloadNode<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    node_type: NodeType,
    data: PayloadData<'a>,
    position: Position,
}

#[derive(Debug, Serialize)]
struct PayloadData<'a> {
    label: &'a str,
    config: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PayloadEdge<'a> {
    source: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_handle: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Payload<'a> {
    name: &'a str,
    nodes: Vec<PayloadNode<'a>>,
    edges: Vec<PayloadEdge<'a>>,
}

/// Build the canonical payload as a JSON value.
pub fn canonical_payload(workflow: &Workflow) -> Result<Value, EngineError> {
    let payload = build(workflow)?;
    serde_json::to_value(&payload).map_err(serialize_error)
}

/// Build the canonical payload as the string handed to the engine.
pub fn payload_json(workflow: &Workflow) -> Result<String, EngineError> {
    let payload = build(workflow)?;
    serde_json::to_string(&payload).map_err(serialize_error)
}

fn build(workflow: &Workflow) -> Result<Payload<'_>, EngineError> {
    let mut nodes = Vec::with_capacity(workflow.nodes.len());
    for node in &workflow.nodes {
        nodes.push(PayloadNode {
            id: node.id(),
            node_type: node.node_type(),
            data: PayloadData {
                label: node.label(),
                config: clean_config(config_value(node)?),
            },
            position: node.position(),
        });
    }

    let edges = workflow
        .edges
        .iter()
        .map(|edge| PayloadEdge {
            source: &edge.source,
            target: &edge.target,
            source_handle: non_empty(edge.source_handle.as_deref()),
            label: non_empty(edge.label.as_deref()),
        })
        .collect();

    Ok(Payload {
        name: &workflow.name,
        nodes,
        edges,
    })
}

fn config_value(node: &WorkflowNode) -> Result<Value, EngineError> {
    let value = match node {
        WorkflowNode::Start(n)
        | WorkflowNode::End(n)
        | WorkflowNode::Parallel(n)
        | WorkflowNode::ParallelJoin(n) => serde_json::to_value(&n.data.config),
        WorkflowNode::HttpRequest(n) => serde_json::to_value(&n.data.config),
        WorkflowNode::Command(n) => serde_json::to_value(&n.data.config),
        WorkflowNode::Conditional(n) => serde_json::to_value(&n.data.config),
        WorkflowNode::Timer(n) => serde_json::to_value(&n.data.config),
    };
    value.map_err(serialize_error)
}

/// Drop top-level blank strings; nulls, zeros and `false` are kept.
fn clean_config(config: Value) -> Map<String, Value> {
    match config {
        Value::Object(map) => map
            .into_iter()
            .filter(|(_, v)| !matches!(v, Value::String(s) if s.trim().is_empty()))
            .collect(),
        _ => Map::new(),
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

fn serialize_error(e: serde_json::Error) -> EngineError {
    EngineError::payload("S001", format!("Failed to serialize workflow payload: {}", e))
}
