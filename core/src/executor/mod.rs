//! Dependency-gated task executor
//!
//! Tasks are registered once, then a run visits each of them exactly once,
//! strictly one at a time:
//!
//! ```text
//! TaskRegistry::register()          (duplicate names rejected)
//!   ↓
//! Executor::run_all(input)
//!   ↓  for each task, in registration or topological order
//! DependencyGate::first_unsatisfied() → skipped: "dependency_not_satisfied"
//!   ↓
//! TaskHandler::call(&ExecutionContext) → fault / panic: recorded, run continues
//!   ↓
//! validate(output, rules)           → rejected: "validation_failed: <reason>"
//!   ↓
//! ResultLedger::record()            → output visible as previous_results
//!   ↓
//! RunReport { results, stats, successful_components, failure_report }
//! ```

mod engine;
mod gate;
mod graph;
mod ledger;
mod progress;
mod registry;
pub mod traits;
pub mod types;
pub mod validate;

pub use engine::Executor;
pub use gate::DependencyGate;
pub use graph::TaskGraph;
pub use ledger::ResultLedger;
pub use progress::ProgressMonitor;
pub use registry::TaskRegistry;
pub use traits::{FnHandler, RunEvent, RunObserver, TaskHandler};
pub use types::{
    ExecutionContext, ExecutionMode, FailureRecord, ResultEntry, RunReport, RunStats, Task,
    TaskLike, TaskOutcome, PREVIOUS_RESULTS_KEY,
};
pub use validate::{is_truthy, is_valid, ValidationError, ValidationRules, ValueKind};
