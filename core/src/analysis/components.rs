//! The analysis components as executor tasks.
//!
//! Each component is a closed enum variant that knows its own dependencies,
//! required flag and output rules; `build_task` binds it to a handler.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::consolidate::extract_concepts;
use super::engine::PipelineServices;
use super::market::MarketAnalyst;
use super::queries::build_queries;
use super::research::{check_research_quality, WebResearcher};
use super::{ProjectInput, ResearchReport};
use crate::config::AnalysisConfig;
use crate::error::TaskFault;
use crate::executor::{ExecutionContext, Task, TaskHandler, ValidationRules};
use crate::generators::{
    AntiObjectionGenerator, FuturePredictor, MentalDriverGenerator, PrePitchGenerator,
    VisualProofGenerator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    WebResearch,
    MarketAnalysis,
    MentalDrivers,
    VisualProofs,
    AntiObjection,
    PrePitch,
    FuturePredictions,
}

impl Component {
    /// Registration order of the pipeline.
    pub const ALL: [Component; 7] = [
        Component::WebResearch,
        Component::MarketAnalysis,
        Component::MentalDrivers,
        Component::VisualProofs,
        Component::AntiObjection,
        Component::PrePitch,
        Component::FuturePredictions,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::WebResearch => "web_research",
            Self::MarketAnalysis => "market_analysis",
            Self::MentalDrivers => "mental_drivers",
            Self::VisualProofs => "visual_proofs",
            Self::AntiObjection => "anti_objection",
            Self::PrePitch => "pre_pitch",
            Self::FuturePredictions => "future_predictions",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn is_required(self) -> bool {
        matches!(self, Self::WebResearch | Self::MarketAnalysis)
    }

    pub fn dependencies(self) -> &'static [Component] {
        match self {
            Self::WebResearch => &[],
            Self::MarketAnalysis => &[Self::WebResearch],
            Self::MentalDrivers | Self::VisualProofs | Self::AntiObjection => {
                &[Self::MarketAnalysis]
            }
            Self::PrePitch => &[Self::MentalDrivers, Self::MarketAnalysis],
            Self::FuturePredictions => &[Self::WebResearch],
        }
    }

    pub fn validation(self) -> ValidationRules {
        match self {
            Self::WebResearch => ValidationRules::object().require(["sources", "extracted_content"]),
            Self::MarketAnalysis => ValidationRules::object().require(["avatar", "scope", "insights"]),
            Self::MentalDrivers => ValidationRules::object().require(["drivers", "validation_status"]),
            Self::VisualProofs => ValidationRules::array(),
            Self::AntiObjection => {
                ValidationRules::object().require(["responses", "validation_status"])
            }
            Self::PrePitch => ValidationRules::object().require(["script", "validation_status"]),
            Self::FuturePredictions => ValidationRules::object(),
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Executor task for `component`, wired to the given services.
pub fn build_task(
    component: Component,
    services: &PipelineServices,
    config: &AnalysisConfig,
) -> Task {
    let task = match component {
        Component::WebResearch => Task::new(
            component.name(),
            WebResearchTask {
                researcher: WebResearcher::new(
                    services.search.clone(),
                    services.extractor.clone(),
                    services.content_validator.clone(),
                    config.clone(),
                ),
                config: config.clone(),
            },
        ),
        Component::MarketAnalysis => Task::new(
            component.name(),
            MarketAnalysisTask {
                analyst: MarketAnalyst::new(services.ai.clone(), config.clone()),
            },
        ),
        Component::MentalDrivers => Task::new(
            component.name(),
            MentalDriversTask {
                generator: MentalDriverGenerator::new(),
            },
        ),
        Component::VisualProofs => Task::new(
            component.name(),
            VisualProofsTask {
                generator: VisualProofGenerator::new(services.ai.clone()),
            },
        ),
        Component::AntiObjection => Task::new(
            component.name(),
            AntiObjectionTask {
                generator: AntiObjectionGenerator::new(
                    services.ai.clone(),
                    config.component_max_tokens,
                ),
            },
        ),
        Component::PrePitch => Task::new(
            component.name(),
            PrePitchTask {
                generator: PrePitchGenerator::new(services.ai.clone(), config.component_max_tokens),
            },
        ),
        Component::FuturePredictions => Task::new(
            component.name(),
            FuturePredictionsTask {
                predictor: FuturePredictor::new(
                    services.ai.clone(),
                    config.prediction_horizon_months,
                    config.component_max_tokens,
                ),
            },
        ),
    };

    task.required(component.is_required())
        .depends_on(component.dependencies().iter().map(|c| c.name()))
        .with_validation(component.validation())
}

fn project(ctx: &ExecutionContext) -> Result<ProjectInput, TaskFault> {
    ctx.decode_input::<ProjectInput>()
        .map_err(|e| TaskFault::new(format!("invalid project input: {e}")))
}

fn upstream<'a>(ctx: &'a ExecutionContext, component: Component) -> Result<&'a Value, TaskFault> {
    ctx.previous(component.name())
        .ok_or_else(|| TaskFault::new(format!("missing {component} output")))
}

fn avatar(analysis: &Value) -> Result<&Value, TaskFault> {
    analysis
        .get("avatar")
        .ok_or_else(|| TaskFault::new("market analysis has no avatar"))
}

fn research(ctx: &ExecutionContext) -> Result<ResearchReport, TaskFault> {
    match ctx.decode_previous::<ResearchReport>(Component::WebResearch.name()) {
        Some(report) => Ok(report?),
        None => Err(TaskFault::new("missing web_research output")),
    }
}

struct WebResearchTask {
    researcher: WebResearcher,
    config: AnalysisConfig,
}

#[async_trait]
impl TaskHandler for WebResearchTask {
    async fn call(&self, ctx: &ExecutionContext) -> Result<Value, TaskFault> {
        let input = project(ctx)?;
        let queries = build_queries(&input, self.config.max_queries);
        let report = self.researcher.run(&queries).await;
        check_research_quality(&report, &self.config)?;
        Ok(serde_json::to_value(report)?)
    }
}

struct MarketAnalysisTask {
    analyst: MarketAnalyst,
}

#[async_trait]
impl TaskHandler for MarketAnalysisTask {
    async fn call(&self, ctx: &ExecutionContext) -> Result<Value, TaskFault> {
        let input = project(ctx)?;
        let report = research(ctx)?;
        Ok(self.analyst.analyze(&input, &report).await?)
    }
}

struct MentalDriversTask {
    generator: MentalDriverGenerator,
}

#[async_trait]
impl TaskHandler for MentalDriversTask {
    async fn call(&self, ctx: &ExecutionContext) -> Result<Value, TaskFault> {
        let input = project(ctx)?;
        let analysis = upstream(ctx, Component::MarketAnalysis)?;
        Ok(self.generator.generate(avatar(analysis)?, &input)?)
    }
}

struct VisualProofsTask {
    generator: VisualProofGenerator,
}

#[async_trait]
impl TaskHandler for VisualProofsTask {
    async fn call(&self, ctx: &ExecutionContext) -> Result<Value, TaskFault> {
        let input = project(ctx)?;
        let analysis = upstream(ctx, Component::MarketAnalysis)?;
        let concepts = extract_concepts(analysis);
        Ok(self
            .generator
            .generate(&concepts, avatar(analysis)?, &input)
            .await?)
    }
}

struct AntiObjectionTask {
    generator: AntiObjectionGenerator,
}

#[async_trait]
impl TaskHandler for AntiObjectionTask {
    async fn call(&self, ctx: &ExecutionContext) -> Result<Value, TaskFault> {
        let input = project(ctx)?;
        let analysis = upstream(ctx, Component::MarketAnalysis)?;
        Ok(self.generator.generate(avatar(analysis)?, &input).await?)
    }
}

struct PrePitchTask {
    generator: PrePitchGenerator,
}

#[async_trait]
impl TaskHandler for PrePitchTask {
    async fn call(&self, ctx: &ExecutionContext) -> Result<Value, TaskFault> {
        let input = project(ctx)?;
        let analysis = upstream(ctx, Component::MarketAnalysis)?;
        let drivers = upstream(ctx, Component::MentalDrivers)?
            .get("drivers")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(self
            .generator
            .generate(&drivers, avatar(analysis)?, &input)
            .await?)
    }
}

struct FuturePredictionsTask {
    predictor: FuturePredictor,
}

#[async_trait]
impl TaskHandler for FuturePredictionsTask {
    async fn call(&self, ctx: &ExecutionContext) -> Result<Value, TaskFault> {
        let input = project(ctx)?;
        let report = research(ctx)?;
        Ok(self.predictor.predict(&input, &report).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::TaskLike;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_component_table() {
        let names: Vec<&str> = Component::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "web_research",
                "market_analysis",
                "mental_drivers",
                "visual_proofs",
                "anti_objection",
                "pre_pitch",
                "future_predictions",
            ]
        );
        let required: Vec<Component> = Component::ALL
            .into_iter()
            .filter(|c| c.is_required())
            .collect();
        assert_eq!(required, vec![Component::WebResearch, Component::MarketAnalysis]);
        assert_eq!(
            Component::PrePitch.dependencies(),
            [Component::MentalDrivers, Component::MarketAnalysis]
        );
        assert_eq!(Component::from_name("pre_pitch"), Some(Component::PrePitch));
        assert_eq!(Component::from_name("unknown"), None);
    }

    #[test]
    fn test_dependencies_precede_in_registration_order() {
        for (i, component) in Component::ALL.iter().enumerate() {
            for dep in component.dependencies() {
                let pos = Component::ALL.iter().position(|c| c == dep).unwrap();
                assert!(pos < i, "{dep} must be registered before {component}");
            }
        }
    }

    #[test]
    fn test_build_task_carries_table_entry() {
        let services = PipelineServices::unavailable();
        let task = build_task(Component::PrePitch, &services, &AnalysisConfig::default());
        assert_eq!(task.name(), "pre_pitch");
        assert!(!task.is_required());
        assert_eq!(task.dependencies(), ["mental_drivers", "market_analysis"]);
        assert_eq!(
            task.validation(),
            Some(&ValidationRules::object().require(["script", "validation_status"]))
        );
    }
}
