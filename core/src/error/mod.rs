#[allow(clippy::module_inception)]
pub mod error;
pub mod executor;

pub use error::{AnalysisError, CliError};
pub use executor::{ExecutorError, FailureKind, TaskFailure, TaskFault};
