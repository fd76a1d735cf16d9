use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use super::components::{build_task, Component};
use super::consolidate::{attach_metadata, consolidate, quality_score};
use super::quality::HeuristicContentValidator;
use super::{ProjectInput, ResearchReport};
use crate::backend::{AiProvider, ContentExtractor, ContentValidator, SearchProvider};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, ExecutorError};
use crate::executor::{Executor, RunObserver, RunReport};

/// External collaborators of one pipeline, injected by the caller.
#[derive(Clone)]
pub struct PipelineServices {
    pub search: Arc<dyn SearchProvider>,
    pub extractor: Arc<dyn ContentExtractor>,
    pub ai: Arc<dyn AiProvider>,
    pub content_validator: Arc<dyn ContentValidator>,
}

impl PipelineServices {
    /// Services with the heuristic page validator.
    pub fn new(
        search: Arc<dyn SearchProvider>,
        extractor: Arc<dyn ContentExtractor>,
        ai: Arc<dyn AiProvider>,
    ) -> Self {
        Self {
            search,
            extractor,
            ai,
            content_validator: Arc::new(HeuristicContentValidator::default()),
        }
    }

    pub fn with_content_validator(mut self, validator: Arc<dyn ContentValidator>) -> Self {
        self.content_validator = validator;
        self
    }
}

/// A finished analysis.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: Value,
    pub run: RunReport,
    pub quality_score: f64,
}

/// Builds a fresh executor per request and turns its run into a report.
pub struct AnalysisEngine {
    config: AnalysisConfig,
    services: PipelineServices,
    observer: Option<Arc<dyn RunObserver>>,
}

impl AnalysisEngine {
    pub fn new(config: AnalysisConfig, services: PipelineServices) -> Self {
        Self {
            config,
            services,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn build_executor(&self) -> Result<Executor, ExecutorError> {
        let mut executor = Executor::with_mode(self.config.execution_mode);
        executor.set_observer(self.observer.clone());
        for component in Component::ALL {
            executor.register(build_task(component, &self.services, &self.config))?;
        }
        executor.validate_graph()?;
        Ok(executor)
    }

    /// Visiting order of the components under the configured mode.
    pub fn plan(&self) -> Result<Vec<String>, ExecutorError> {
        Ok(self.build_executor()?.execution_order())
    }

    #[tracing::instrument(skip_all, fields(segment = %input.segment.trim(), mode = %self.config.execution_mode))]
    pub async fn generate(&self, input: &ProjectInput) -> Result<AnalysisOutcome, AnalysisError> {
        input.validate()?;
        let started = Instant::now();

        let mut executor = self.build_executor()?;
        let run = executor.run_all(serde_json::to_value(input)?).await;

        if let Some(name) = run.stats.required_failed.first() {
            let error = run
                .failure_report
                .get(name)
                .map(|r| r.error.clone())
                .unwrap_or_else(|| "unknown failure".to_string());
            tracing::error!(component = %name, %error, "required component failed");
            return Err(AnalysisError::RequiredComponentFailed {
                component: name.clone(),
                error,
            });
        }

        let research: ResearchReport = match run
            .successful_components
            .get(Component::WebResearch.name())
        {
            Some(value) => serde_json::from_value(value.clone())?,
            None => {
                return Err(AnalysisError::InsufficientResearch(
                    "research produced no output".to_string(),
                ))
            }
        };
        let analysis = run
            .successful_components
            .get(Component::MarketAnalysis.name())
            .cloned()
            .unwrap_or(Value::Null);

        let mut report = consolidate(input, &research, &analysis, &run);
        let score = quality_score(&report, &self.config);
        if score < self.config.quality_threshold {
            tracing::warn!(
                score,
                threshold = self.config.quality_threshold,
                "report quality below threshold"
            );
        }
        attach_metadata(&mut report, started.elapsed(), score, &research, &run);
        tracing::info!(
            score,
            successful = run.stats.successful_count,
            failed = run.stats.failed_count,
            "analysis complete"
        );

        Ok(AnalysisOutcome {
            report,
            run,
            quality_score: score,
        })
    }
}

#[cfg(test)]
impl PipelineServices {
    /// Services whose every call fails.
    pub(crate) fn unavailable() -> Self {
        use crate::backend::SearchHit;
        use async_trait::async_trait;

        struct Offline;

        #[async_trait]
        impl SearchProvider for Offline {
            fn name(&self) -> &str {
                "offline"
            }
            async fn search(&self, _query: &str, _max: usize) -> anyhow::Result<Vec<SearchHit>> {
                anyhow::bail!("offline")
            }
        }

        #[async_trait]
        impl ContentExtractor for Offline {
            async fn extract(&self, _url: &str) -> anyhow::Result<Option<String>> {
                anyhow::bail!("offline")
            }
        }

        #[async_trait]
        impl AiProvider for Offline {
            fn name(&self) -> &str {
                "offline"
            }
            async fn generate(&self, _prompt: &str, _max_tokens: u32) -> anyhow::Result<String> {
                anyhow::bail!("offline")
            }
        }

        let offline = Arc::new(Offline);
        Self::new(offline.clone(), offline.clone(), offline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutionMode;
    use pretty_assertions::assert_eq;

    fn engine(mode: ExecutionMode) -> AnalysisEngine {
        let config = AnalysisConfig {
            execution_mode: mode,
            query_delay_ms: 0,
            ..AnalysisConfig::default()
        };
        AnalysisEngine::new(config, PipelineServices::unavailable())
    }

    #[test]
    fn test_plan_follows_mode() {
        let expected = vec![
            "web_research",
            "market_analysis",
            "mental_drivers",
            "visual_proofs",
            "anti_objection",
            "pre_pitch",
            "future_predictions",
        ];
        assert_eq!(engine(ExecutionMode::RegistrationOrder).plan().unwrap(), expected);
        assert_eq!(engine(ExecutionMode::Topological).plan().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_before_running() {
        let err = engine(ExecutionMode::Topological)
            .generate(&ProjectInput {
                segment: "ab".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_required_research_failure_aborts() {
        let err = engine(ExecutionMode::Topological)
            .generate(&ProjectInput {
                segment: "dental clinics".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        match err {
            AnalysisError::RequiredComponentFailed { component, error } => {
                assert_eq!(component, "web_research");
                assert!(error.contains("insufficient research"), "{error}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
