//! Parse phase: JSON → Rust types + graph construction.

pub mod graph;
pub mod types;

pub use graph::WorkflowGraph;
pub use types::*;

use crate::error::EngineError;

/// Deserialize a workflow JSON string into a `Workflow` struct.
/// The document must be a JSON object.
pub fn parse(json: &str) -> Result<Workflow, EngineError> {
    if !json.trim_start().starts_with('{') {
        return Err(EngineError::parse(
            "P001",
            "Failed to parse workflow JSON: expected a JSON object",
        ));
    }
    serde_json::from_str::<Workflow>(json)
        .map_err(|e| EngineError::parse("P001", format!("Failed to parse workflow JSON: {}", e)))
}

/// Deserialize a bare JSON array of nodes (used for label lookup).
pub fn parse_nodes(json: &str) -> Result<Vec<WorkflowNode>, EngineError> {
    serde_json::from_str::<Vec<WorkflowNode>>(json)
        .map_err(|e| EngineError::parse("P001", format!("Failed to parse nodes JSON: {}", e)))
}

/// Deserialize a bare JSON array of edges. Blank input reads as no edges.
pub fn parse_edges(json: &str) -> Result<Vec<WorkflowEdge>, EngineError> {
    if json.trim().is_empty() {
        return Ok(vec![]);
    }
    serde_json::from_str::<Vec<WorkflowEdge>>(json)
        .map_err(|e| EngineError::parse("P001", format!("Failed to parse edges JSON: {}", e)))
}

/// Parse JSON and build the graph in one step.
pub fn parse_and_build(json: &str) -> Result<(Workflow, WorkflowGraph), EngineError> {
    let workflow = parse(json)?;
    let graph = WorkflowGraph::build(&workflow);
    Ok((workflow, graph))
}
