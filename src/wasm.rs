//! WASM entry points for the editor front-end.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::error::EngineError;
use crate::parse::types::{NodeType, Position};
use crate::registry;
use crate::validate::{ValidationIssue, ValidationReport};

/// Validate a workflow JSON: parse + structural and config rules.
/// Returns a ValidationReport object; unparsable input yields a report with
/// a single P001 issue.
#[wasm_bindgen]
pub fn validate_workflow(json: &str) -> JsValue {
    to_js(&validate_workflow_inner(json))
}

fn validate_workflow_inner(json: &str) -> ValidationReport {
    match crate::parse::parse(json) {
        Ok(workflow) => crate::validate::validate(&workflow),
        Err(e) => ValidationReport::new(vec![ValidationIssue::from(e)]),
    }
}

/// Validate a single node's config against the editor's edge array.
/// Returns a JSON array of ValidationIssue objects.
#[wasm_bindgen]
pub fn validate_node(node_json: &str, edges_json: &str) -> JsValue {
    to_js(&validate_node_inner(node_json, edges_json))
}

fn validate_node_inner(node_json: &str, edges_json: &str) -> Vec<ValidationIssue> {
    let node = match serde_json::from_str::<crate::parse::types::WorkflowNode>(node_json) {
        Ok(n) => n,
        Err(e) => {
            return vec![ValidationIssue::from(EngineError::parse(
                "P001",
                format!("Failed to parse node JSON: {}", e),
            ))];
        }
    };
    let edges = match crate::parse::parse_edges(edges_json) {
        Ok(edges) => edges,
        Err(e) => return vec![ValidationIssue::from(e)],
    };
    crate::validate::validate_node_with_edges(&node, &edges, registry::builtin())
}

/// Canonical engine payload for a workflow JSON.
/// Returns `{status: "success", payload}` or `{status: "errors", errors}`.
#[wasm_bindgen]
pub fn workflow_payload(json: &str) -> JsValue {
    to_js(&workflow_payload_inner(json))
}

fn workflow_payload_inner(json: &str) -> PayloadResult {
    let built = crate::parse::parse(json).and_then(|w| crate::payload::canonical_payload(&w));
    match built {
        Ok(payload) => PayloadResult::Success { payload },
        Err(e) => PayloadResult::Errors {
            errors: vec![ErrorDto::from(e)],
        },
    }
}

/// Rebuild execution steps from engine stdout. Labels come from the node
/// array in `nodes_json`; unparsable node JSON means no labels.
#[wasm_bindgen]
pub fn parse_trace(stdout: &str, nodes_json: &str) -> JsValue {
    to_js(&parse_trace_inner(stdout, nodes_json))
}

fn parse_trace_inner(stdout: &str, nodes_json: &str) -> Vec<crate::trace::ExecutionStep> {
    let nodes = crate::parse::parse_nodes(nodes_json).unwrap_or_default();
    crate::trace::parse_trace(stdout, &nodes).steps
}

/// The first `WORKFLOW_FINISHED` event in a stdout chunk, or null.
#[wasm_bindgen]
pub fn detect_completion(chunk: &str) -> JsValue {
    match crate::trace::detect_completion(chunk) {
        Some(event) => to_js(&event),
        None => JsValue::NULL,
    }
}

/// A new node of `node_type` with its default label and config, or null for
/// an unknown type.
#[wasm_bindgen]
pub fn default_node(node_type: &str, id: &str, x: f64, y: f64) -> JsValue {
    match default_node_inner(node_type, id, x, y) {
        Some(node) => to_js(&node),
        None => JsValue::NULL,
    }
}

fn default_node_inner(
    node_type: &str,
    id: &str,
    x: f64,
    y: f64,
) -> Option<crate::parse::types::WorkflowNode> {
    let node_type = node_type.parse::<NodeType>().ok()?;
    registry::builtin().make_node(node_type, id, None, Position { x, y })
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::NULL)
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: String,
    phase: String,
    message: String,
}

impl From<EngineError> for ErrorDto {
    fn from(e: EngineError) -> Self {
        ErrorDto {
            code: e.code,
            phase: e.phase.to_string(),
            message: e.message,
        }
    }
}

#[derive(serde::Serialize)]
#[serde(tag = "status")]
enum PayloadResult {
    #[serde(rename = "success")]
    Success { payload: serde_json::Value },
    #[serde(rename = "errors")]
    Errors { errors: Vec<ErrorDto> },
}
