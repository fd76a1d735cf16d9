use crate::executor::types::{ExecutionMode, RunStats};

/// Observer hook for run lifecycle events (progress bars, structured output).
pub trait RunObserver: Send + Sync {
    fn on_event(&self, event: &RunEvent);
}

/// Run lifecycle events, emitted in order on the executor's task.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    RunStart {
        run_id: String,
        mode: ExecutionMode,
        order: Vec<String>,
    },
    TaskStart {
        run_id: String,
        task: String,
    },
    TaskSkipped {
        run_id: String,
        task: String,
        missing_dep: String,
    },
    TaskComplete {
        run_id: String,
        task: String,
        success: bool,
        duration_ms: u64,
        error: Option<String>,
    },
    RunEnd {
        run_id: String,
        stats: RunStats,
        duration_ms: u64,
    },
}
