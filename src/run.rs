//! Run gate: validate, dispatch to the engine, rebuild the result, record it.
//!
//! The crate never spawns the engine itself. Callers plug in an
//! [`ExecutionClient`] that owns the process and a [`RunHistoryStore`] that
//! keeps finished runs.

use crate::error::RunError;
use crate::parse::types::Workflow;
use crate::payload;
use crate::registry::NodeRegistry;
use crate::trace::{EngineOutput, ExecutionResult, RunMetadata, TraceProtocol};
use crate::validate;

/// Hands the canonical payload to the engine and returns its output.
pub trait ExecutionClient {
    type Error: std::error::Error + Send + Sync + 'static;

    fn execute(&self, payload: &str) -> Result<EngineOutput, Self::Error>;
}

/// Fire-and-forget sink for finished runs.
pub trait RunHistoryStore {
    fn save(&self, result: &ExecutionResult);
}

/// History store that keeps nothing.
pub struct NoHistory;

impl RunHistoryStore for NoHistory {
    fn save(&self, _result: &ExecutionResult) {}
}

/// Run a workflow with the built-in node rules and default trace protocol.
pub fn run_workflow<C, H>(
    workflow: &Workflow,
    client: &C,
    history: &H,
    meta: RunMetadata,
) -> Result<ExecutionResult, RunError>
where
    C: ExecutionClient + ?Sized,
    H: RunHistoryStore + ?Sized,
{
    run_workflow_with(
        workflow,
        crate::registry::builtin(),
        &TraceProtocol::default(),
        client,
        history,
        meta,
    )
}

pub fn run_workflow_with<C, H>(
    workflow: &Workflow,
    registry: &NodeRegistry,
    protocol: &TraceProtocol,
    client: &C,
    history: &H,
    meta: RunMetadata,
) -> Result<ExecutionResult, RunError>
where
    C: ExecutionClient + ?Sized,
    H: RunHistoryStore + ?Sized,
{
    let report = validate::validate_with(workflow, registry);
    if !report.is_valid() {
        tracing::warn!(
            workflow = %workflow.id,
            errors = report.errors().count(),
            "run blocked by validation"
        );
        return Err(RunError::Invalid(report));
    }

    let payload = payload::payload_json(workflow)?;

    tracing::info!(workflow = %workflow.id, run = %meta.id, "dispatching workflow to engine");
    let output = client
        .execute(&payload)
        .map_err(|e| RunError::Client(Box::new(e)))?;
    tracing::debug!(
        run = %meta.id,
        stdout_bytes = output.stdout.len(),
        stderr_bytes = output.stderr.len(),
        "engine returned"
    );

    let result = ExecutionResult::assemble_with(meta, output, workflow, protocol.clone());
    tracing::info!(
        run = %result.id,
        status = ?result.status,
        steps = result.steps.len(),
        "run finished"
    );

    history.save(&result);
    Ok(result)
}
