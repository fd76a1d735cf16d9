use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{ExecutorError, TaskFailure};

use super::gate::DependencyGate;
use super::graph::TaskGraph;
use super::ledger::ResultLedger;
use super::registry::TaskRegistry;
use super::traits::{RunEvent, RunObserver};
use super::types::{
    ExecutionContext, ExecutionMode, FailureRecord, ResultEntry, RunReport, RunStats, Task,
    TaskOutcome,
};
use super::validate;

const EMPTY_FAULT_MESSAGE: &str = "task failed without an error message";

/// Sequential, dependency-gated task executor.
///
/// Owns its registry and the ledger of the most recent run. Callers construct
/// one explicitly per pipeline; there is no shared instance.
#[derive(Default)]
pub struct Executor {
    registry: TaskRegistry,
    ledger: ResultLedger,
    mode: ExecutionMode,
    observer: Option<Arc<dyn RunObserver>>,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: ExecutionMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn set_observer(&mut self, observer: Option<Arc<dyn RunObserver>>) {
        self.observer = observer;
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ExecutionMode) {
        self.mode = mode;
    }

    pub fn register(&mut self, task: Task) -> Result<(), ExecutorError> {
        let name = task.name().to_string();
        self.registry.register(task)?;
        debug!(task = %name, total = self.registry.len(), "task registered");
        Ok(())
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &ResultLedger {
        &self.ledger
    }

    /// Whether every dependency of `name` has a successful entry so far.
    ///
    /// Unknown task names are never executable.
    pub fn can_execute(&self, name: &str) -> bool {
        use super::types::TaskLike;

        self.registry
            .get(name)
            .is_some_and(|task| DependencyGate::new(&self.ledger).is_open(task.dependencies()))
    }

    /// Strict graph check: unknown dependencies and cycles are errors.
    pub fn validate_graph(&self) -> Result<(), ExecutorError> {
        TaskGraph::from_tasks(self.registry.tasks())?.validate()
    }

    /// The order the current mode visits tasks in.
    pub fn execution_order(&self) -> Vec<String> {
        match self.mode {
            ExecutionMode::RegistrationOrder => self.registry.names(),
            ExecutionMode::Topological => match TaskGraph::from_tasks(self.registry.tasks()) {
                Ok(graph) => graph.execution_order(),
                // Registry names are unique, so this only happens if that ever changes.
                Err(_) => self.registry.names(),
            },
        }
    }

    pub fn successful(&self) -> Map<String, Value> {
        self.ledger.successful()
    }

    pub fn failures(&self) -> BTreeMap<String, FailureRecord> {
        self.ledger.failures()
    }

    /// Run every registered task once, in the order of the current mode.
    ///
    /// Never fails: skipped, faulted and rejected tasks are recorded in the
    /// ledger and the run moves on. The previous run's ledger is discarded.
    pub async fn run_all(&mut self, input: Value) -> RunReport {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        let order = self.execution_order();

        self.ledger.clear();
        let mut ctx = ExecutionContext::new(input);
        let mut results = Vec::with_capacity(order.len());

        info!(run_id = %run_id, mode = %self.mode, tasks = order.len(), "run started");
        self.emit(RunEvent::RunStart {
            run_id: run_id.clone(),
            mode: self.mode,
            order: order.clone(),
        });

        for name in &order {
            let Some(task) = self.registry.get(name).cloned() else {
                continue;
            };
            let outcome = self.run_task(&run_id, &task, &mut ctx, started).await;
            self.ledger.record(name, outcome.entry.clone());
            results.push(outcome);
        }

        let stats = RunStats::from_outcomes(&results);
        let duration_ms = started.elapsed().as_millis() as u64;

        info!(
            run_id = %run_id,
            total = stats.total,
            successful = stats.successful_count,
            failed = stats.failed_count,
            success_rate = stats.success_rate,
            duration_ms,
            "run finished"
        );
        self.emit(RunEvent::RunEnd {
            run_id: run_id.clone(),
            stats: stats.clone(),
            duration_ms,
        });

        RunReport {
            run_id,
            mode: self.mode,
            results,
            stats,
            successful_components: self.ledger.successful(),
            failure_report: self.ledger.failures(),
            duration_ms,
        }
    }

    async fn run_task(
        &self,
        run_id: &str,
        task: &Task,
        ctx: &mut ExecutionContext,
        run_started: Instant,
    ) -> TaskOutcome {
        use super::types::TaskLike;

        let name = task.name();
        let task_started = Instant::now();

        let gate = DependencyGate::new(&self.ledger);
        if let Some(missing) = gate.first_unsatisfied(task.dependencies()) {
            warn!(run_id = %run_id, task = %name, missing_dep = %missing, "dependency not satisfied, skipping");
            self.emit(RunEvent::TaskSkipped {
                run_id: run_id.to_string(),
                task: name.to_string(),
                missing_dep: missing.to_string(),
            });
            let entry = ResultEntry::failed(
                &TaskFailure::DependencyNotSatisfied,
                elapsed_ms(run_started),
            );
            return outcome(task, entry, task_started);
        }

        self.emit(RunEvent::TaskStart {
            run_id: run_id.to_string(),
            task: name.to_string(),
        });

        let result = match AssertUnwindSafe(task.handler().call(ctx))
            .catch_unwind()
            .await
        {
            Ok(Ok(output)) => validate::validate(&output, task.validation())
                .map(|()| output)
                .map_err(TaskFailure::ValidationFailed),
            Ok(Err(fault)) => Err(TaskFailure::Fault(non_empty(fault.message()))),
            Err(panic) => Err(TaskFailure::Fault(panic_message(panic.as_ref()))),
        };

        let entry = match result {
            Ok(output) => {
                ctx.record_success(name, output.clone());
                ResultEntry::succeeded(output, elapsed_ms(run_started))
            }
            Err(failure) => {
                warn!(
                    run_id = %run_id,
                    task = %name,
                    required = task.is_required(),
                    error = %failure,
                    "task failed"
                );
                ResultEntry::failed(&failure, elapsed_ms(run_started))
            }
        };

        let done = outcome(task, entry, task_started);
        debug!(run_id = %run_id, task = %name, success = done.entry.success, duration_ms = done.duration_ms, "task finished");
        self.emit(RunEvent::TaskComplete {
            run_id: run_id.to_string(),
            task: name.to_string(),
            success: done.entry.success,
            duration_ms: done.duration_ms,
            error: done.entry.error.clone(),
        });
        done
    }

    fn emit(&self, event: RunEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }
}

fn outcome(task: &Task, entry: ResultEntry, started: Instant) -> TaskOutcome {
    TaskOutcome {
        name: task.name().to_string(),
        required: task.is_required(),
        duration_ms: elapsed_ms(started),
        entry,
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

fn non_empty(message: &str) -> String {
    if message.trim().is_empty() {
        EMPTY_FAULT_MESSAGE.to_string()
    } else {
        message.to_string()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("task panicked: {detail}")
}
