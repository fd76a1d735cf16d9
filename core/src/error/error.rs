use thiserror::Error;

use super::executor::ExecutorError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("task graph error: {0}")]
    Executor(#[from] ExecutorError),
    #[error("config error: {0}")]
    Config(String),
    #[error("input error: {0}")]
    Input(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("insufficient input: {0}")]
    InvalidInput(String),
    #[error("insufficient research: {0}")]
    InsufficientResearch(String),
    #[error("language model unavailable: {0}")]
    AiUnavailable(String),
    #[error("language model returned unusable analysis: {0}")]
    AiResponse(String),
    #[error("required component '{component}' failed: {error}")]
    RequiredComponentFailed { component: String, error: String },
    #[error("task graph error: {0}")]
    Executor(#[from] ExecutorError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<AnalysisError> for super::TaskFault {
    fn from(err: AnalysisError) -> Self {
        super::TaskFault::new(err.to_string())
    }
}
