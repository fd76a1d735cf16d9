//! Marketing analysis pipeline
//!
//! ```text
//! ProjectInput::validate()
//!   ↓
//! AnalysisEngine::build_executor()     (seven components, see components.rs)
//!   ↓
//! web_research ──→ market_analysis ──→ mental_drivers ──→ pre_pitch
//!      │                 ├──────────→ visual_proofs
//!      │                 └──────────→ anti_objection
//!      └──────────→ future_predictions
//!   ↓
//! required component failed? → AnalysisError::RequiredComponentFailed
//!   ↓
//! consolidate() → quality_score() → attach_metadata()
//! ```

pub mod components;
pub mod consolidate;
pub mod engine;
pub mod input;
pub mod market;
pub mod quality;
pub mod queries;
pub mod research;

pub use components::{build_task, Component};
pub use consolidate::{
    attach_metadata, consolidate, extract_concepts, format_duration, quality_score,
    ADVANCED_COMPONENTS,
};
pub use engine::{AnalysisEngine, AnalysisOutcome, PipelineServices};
pub use input::ProjectInput;
pub use market::{detect_simulated_data, parse_market_analysis, MarketAnalyst};
pub use quality::{contains_generic_marker, find_placeholder_markers, HeuristicContentValidator};
pub use queries::build_queries;
pub use research::{
    check_research_quality, ExtractedPage, QualityMetrics, ResearchReport, SourceRef,
    WebResearcher,
};
