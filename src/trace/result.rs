//! Per-node steps and the per-run result reconstructed from engine output.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::NodeLabelLookup;
use super::completion::WorkflowFinished;
use super::parser::TraceParser;
use super::protocol::TraceProtocol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStep {
    pub node_id: String,
    pub node_type: String,
    pub node_label: String,
    pub status: StepStatus,
    pub duration_ms: u64,
    pub input_data: Option<Value>,
    pub config_data: Option<Value>,
    pub output_data: Option<Value>,
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionStep {
    pub fn new(
        node_id: impl Into<String>,
        node_type: impl Into<String>,
        node_label: impl Into<String>,
    ) -> Self {
        ExecutionStep {
            node_id: node_id.into(),
            node_type: node_type.into(),
            node_label: node_label.into(),
            status: StepStatus::Success,
            duration_ms: 0,
            input_data: None,
            config_data: None,
            output_data: None,
            details: None,
            error: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == StepStatus::Error
    }
}

/// How the engine run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunCompletion {
    /// The process exited with this code.
    Exited { code: i32 },
    /// The engine announced the end of the run before the process exited.
    Finished(WorkflowFinished),
}

impl RunCompletion {
    pub fn is_ok(&self) -> bool {
        match self {
            RunCompletion::Exited { code } => *code == 0,
            RunCompletion::Finished(event) => event.is_success(),
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            RunCompletion::Exited { code } => Some(*code),
            RunCompletion::Finished(_) => None,
        }
    }
}

/// Everything the execution client hands back for one run.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub stdout: String,
    pub stderr: String,
    pub completion: RunCompletion,
    /// Wall-clock time measured by the client.
    pub duration_ms: u64,
}

/// Identity of a run, assigned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMetadata {
    pub id: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub id: String,
    pub timestamp: i64,
    pub status: RunStatus,
    pub steps: Vec<ExecutionStep>,
    pub raw_stdout: String,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

impl ExecutionResult {
    pub fn assemble<L: NodeLabelLookup + ?Sized>(
        meta: RunMetadata,
        output: EngineOutput,
        labels: &L,
    ) -> Self {
        Self::assemble_with(meta, output, labels, TraceProtocol::default())
    }

    pub fn assemble_with<L: NodeLabelLookup + ?Sized>(
        meta: RunMetadata,
        output: EngineOutput,
        labels: &L,
        protocol: TraceProtocol,
    ) -> Self {
        let mut parser = TraceParser::with_protocol(labels, protocol);
        parser.feed(&output.stdout);
        let steps = parser.finish().steps;

        let status = run_status(&steps, &output.completion);
        let duration_ms = match &output.completion {
            RunCompletion::Finished(WorkflowFinished {
                duration: Some(duration),
                ..
            }) => *duration,
            _ => output.duration_ms,
        };

        ExecutionResult {
            id: meta.id,
            timestamp: meta.timestamp,
            status,
            steps,
            exit_code: output.completion.exit_code(),
            raw_stdout: output.stdout,
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &ExecutionStep> {
        self.steps.iter().filter(|s| s.is_error())
    }
}

/// FAILED if any step failed or the run itself did not end cleanly.
pub fn run_status(steps: &[ExecutionStep], completion: &RunCompletion) -> RunStatus {
    if steps.iter().any(ExecutionStep::is_error) || !completion.is_ok() {
        RunStatus::Failed
    } else {
        RunStatus::Success
    }
}
