//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `pitchforge_core::api` instead of reaching into internal modules.

pub use crate::analysis::{
    AnalysisEngine, AnalysisOutcome, Component, HeuristicContentValidator, PipelineServices,
    ProjectInput, ResearchReport,
};
pub use crate::backend::{
    AiProvider, ContentExtractor, ContentValidator, ContentVerdict, SearchHit, SearchProvider,
};
pub use crate::config::{
    load_default, load_from, AiConfig, AiProviderConfig, AnalysisConfig, AppConfig,
    ExtractorConfig, LoggingConfig, OpenAiConfig, SearchConfig, SearchProviderConfig,
    SearxngConfig, SerperConfig,
};
pub use crate::error::{AnalysisError, CliError, ExecutorError, TaskFault};
pub use crate::executor::{
    ExecutionContext, ExecutionMode, Executor, ProgressMonitor, RunEvent, RunObserver, RunReport,
    Task, TaskHandler, ValidationRules,
};
