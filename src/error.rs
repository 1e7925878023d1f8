//! Crate error types.
//!
//! Graph and config problems are not errors: they are reported as
//! `ValidationIssue` values. These types cover input that could not be read
//! or written at all, and the run gate.

use thiserror::Error;

use crate::validate::report::{ValidationIssue, ValidationReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Payload,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Parse => write!(f, "Parse"),
            Phase::Payload => write!(f, "Payload"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("[{phase}:{code}] {message}")]
pub struct EngineError {
    pub code: String,
    pub phase: Phase,
    pub message: String,
}

impl EngineError {
    pub fn parse(code: &str, message: impl Into<String>) -> Self {
        EngineError {
            code: code.into(),
            phase: Phase::Parse,
            message: message.into(),
        }
    }

    pub fn payload(code: &str, message: impl Into<String>) -> Self {
        EngineError {
            code: code.into(),
            phase: Phase::Payload,
            message: message.into(),
        }
    }
}

impl From<EngineError> for ValidationIssue {
    fn from(e: EngineError) -> Self {
        ValidationIssue::error(&e.code, e.message, None)
    }
}

/// Failure of the validate → execute → record pipeline.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("workflow is not executable ({} blocking issue(s))", .0.errors().count())]
    Invalid(ValidationReport),

    #[error(transparent)]
    Payload(#[from] EngineError),

    #[error("execution client failed: {0}")]
    Client(#[source] Box<dyn std::error::Error + Send + Sync>),
}
