use std::fmt;

use thiserror::Error;

use crate::executor::ValidationError;

/// Errors raised while assembling or statically checking a task registry.
///
/// None of these are produced by `Executor::run_all`; a run always completes
/// and records per-task failures in the ledger instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Duplicate task: {0}")]
    DuplicateTask(String),

    #[error("Dependency not found: task '{task}' depends on '{missing_dep}'")]
    DependencyNotFound { task: String, missing_dep: String },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),
}

/// Fault returned by a task handler.
///
/// The message is recorded verbatim as the ledger entry's `error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TaskFault {
    message: String,
}

impl TaskFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<anyhow::Error> for TaskFault {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{err:#}"))
    }
}

impl From<serde_json::Error> for TaskFault {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<String> for TaskFault {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for TaskFault {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Why a task ended up with `success == false` in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    /// At least one dependency had no successful entry when the task was reached.
    DependencyNotSatisfied,
    /// The handler returned a fault or panicked.
    Fault(String),
    /// The handler returned, but its output was rejected.
    ValidationFailed(ValidationError),
}

impl TaskFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::DependencyNotSatisfied => FailureKind::DependencyNotSatisfied,
            Self::Fault(_) => FailureKind::Fault,
            Self::ValidationFailed(_) => FailureKind::ValidationFailed,
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DependencyNotSatisfied => f.write_str("dependency_not_satisfied"),
            Self::Fault(message) => f.write_str(message),
            Self::ValidationFailed(reason) => write!(f, "validation_failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    DependencyNotSatisfied,
    Fault,
    ValidationFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_messages() {
        assert_eq!(
            TaskFailure::DependencyNotSatisfied.to_string(),
            "dependency_not_satisfied"
        );
        assert_eq!(TaskFailure::Fault("boom".into()).to_string(), "boom");

        let failure = TaskFailure::ValidationFailed(ValidationError::MissingField("status".into()));
        assert!(failure.to_string().starts_with("validation_failed: "));
        assert!(failure.to_string().contains("status"));
        assert_eq!(failure.kind(), FailureKind::ValidationFailed);
    }

    #[test]
    fn test_task_fault_from_anyhow_keeps_context() {
        let err = anyhow::anyhow!("socket closed").context("search failed");
        let fault = TaskFault::from(err);
        assert_eq!(fault.message(), "search failed: socket closed");
    }

    #[test]
    fn test_executor_error_display() {
        let err = ExecutorError::DependencyNotFound {
            task: "pre_pitch".into(),
            missing_dep: "mental_drivers".into(),
        };
        assert_eq!(
            err.to_string(),
            "Dependency not found: task 'pre_pitch' depends on 'mental_drivers'"
        );
    }
}
