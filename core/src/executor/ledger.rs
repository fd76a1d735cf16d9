use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

use super::types::{FailureRecord, ResultEntry};

/// Per-run record of every task's outcome.
///
/// Only the executor writes to it; callers get read-only views.
#[derive(Debug, Clone, Default)]
pub struct ResultLedger {
    entries: HashMap<String, ResultEntry>,
    /// First-recorded order of task names.
    order: Vec<String>,
}

impl ResultLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, task: &str) -> Option<&ResultEntry> {
        self.entries.get(task)
    }

    /// `true` only when the task has an entry and that entry succeeded.
    pub fn succeeded(&self, task: &str) -> bool {
        self.entries.get(task).is_some_and(|e| e.success)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order tasks were first recorded.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResultEntry)> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name).map(|e| (name.as_str(), e)))
    }

    /// Accepted outputs of successful tasks.
    pub fn successful(&self) -> Map<String, Value> {
        self.iter()
            .filter(|(_, e)| e.success)
            .filter_map(|(name, e)| e.data.clone().map(|d| (name.to_string(), d)))
            .collect()
    }

    /// Failed tasks with their error and timestamp.
    pub fn failures(&self) -> BTreeMap<String, FailureRecord> {
        self.iter()
            .filter(|(_, e)| !e.success)
            .map(|(name, e)| {
                (
                    name.to_string(),
                    FailureRecord {
                        error: e.error.clone().unwrap_or_default(),
                        kind: e.failure_kind,
                        timestamp: e.timestamp,
                    },
                )
            })
            .collect()
    }

    pub(crate) fn record(&mut self, task: &str, entry: ResultEntry) {
        if self.entries.insert(task.to_string(), entry).is_none() {
            self.order.push(task.to_string());
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
