use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{FailureKind, TaskFailure};

use super::ExecutionMode;

/// Outcome of one task in one run.
///
/// Exactly one of `data` and `error` is populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEntry {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    pub timestamp: DateTime<Utc>,
    /// Milliseconds since the start of the run.
    pub offset_ms: u64,
}

impl ResultEntry {
    pub fn succeeded(data: Value, offset_ms: u64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            failure_kind: None,
            timestamp: Utc::now(),
            offset_ms,
        }
    }

    pub fn failed(failure: &TaskFailure, offset_ms: u64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(failure.to_string()),
            failure_kind: Some(failure.kind()),
            timestamp: Utc::now(),
            offset_ms,
        }
    }
}

/// Failure-report row exposed by `ResultLedger::failures`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    pub timestamp: DateTime<Utc>,
}

/// One row of `RunReport::results`, in visiting order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskOutcome {
    pub name: String,
    pub required: bool,
    pub duration_ms: u64,
    #[serde(flatten)]
    pub entry: ResultEntry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub total: usize,
    pub successful_count: usize,
    pub failed_count: usize,
    /// Percentage of successful tasks, `0.0` for an empty run.
    pub success_rate: f64,
    /// Required tasks that did not succeed, in visiting order.
    pub required_failed: Vec<String>,
}

impl RunStats {
    pub fn from_outcomes(outcomes: &[TaskOutcome]) -> Self {
        let total = outcomes.len();
        let successful_count = outcomes.iter().filter(|o| o.entry.success).count();
        let success_rate = if total == 0 {
            0.0
        } else {
            successful_count as f64 / total as f64 * 100.0
        };
        let required_failed = outcomes
            .iter()
            .filter(|o| o.required && !o.entry.success)
            .map(|o| o.name.clone())
            .collect();

        Self {
            total,
            successful_count,
            failed_count: total - successful_count,
            success_rate,
            required_failed,
        }
    }

    pub fn all_required_succeeded(&self) -> bool {
        self.required_failed.is_empty()
    }
}

/// Everything a caller gets back from `Executor::run_all`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub mode: ExecutionMode,
    pub results: Vec<TaskOutcome>,
    pub stats: RunStats,
    pub successful_components: Map<String, Value>,
    pub failure_report: BTreeMap<String, FailureRecord>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn outcome(&self, name: &str) -> Option<&TaskOutcome> {
        self.results.iter().find(|o| o.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(name: &str, required: bool, success: bool) -> TaskOutcome {
        let entry = if success {
            ResultEntry::succeeded(json!({"ok": true}), 0)
        } else {
            ResultEntry::failed(&TaskFailure::Fault("boom".into()), 0)
        };
        TaskOutcome {
            name: name.to_string(),
            required,
            duration_ms: 1,
            entry,
        }
    }

    #[test]
    fn test_stats_for_empty_run() {
        let stats = RunStats::from_outcomes(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert!(stats.all_required_succeeded());
    }

    #[test]
    fn test_stats_counts_and_required_failures() {
        let stats = RunStats::from_outcomes(&[
            outcome("a", true, true),
            outcome("b", false, false),
            outcome("c", true, false),
            outcome("d", false, true),
        ]);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.successful_count, 2);
        assert_eq!(stats.failed_count, 2);
        assert_eq!(stats.success_rate, 50.0);
        assert_eq!(stats.required_failed, vec!["c".to_string()]);
        assert!(!stats.all_required_succeeded());
    }

    #[test]
    fn test_entry_populates_exactly_one_side() {
        let ok = ResultEntry::succeeded(json!(1), 5);
        assert!(ok.data.is_some() && ok.error.is_none());

        let failed = ResultEntry::failed(&TaskFailure::DependencyNotSatisfied, 5);
        assert!(failed.data.is_none());
        assert_eq!(failed.error.as_deref(), Some("dependency_not_satisfied"));
        assert_eq!(failed.failure_kind, Some(FailureKind::DependencyNotSatisfied));
    }
}
