use std::sync::Arc;

use serde_json::{json, Value};

use super::{llm_json::extract_json, now_rfc3339, GeneratorError};
use crate::analysis::{ProjectInput, ResearchReport};
use crate::backend::AiProvider;

/// Sections a usable projection must contain at least one of.
const SECTIONS: [&str; 5] = ["trends", "scenarios", "opportunities", "threats", "timeline"];

/// Market-future projection over a fixed horizon, written by the language
/// model from the research findings.
pub struct FuturePredictor {
    ai: Arc<dyn AiProvider>,
    horizon_months: u32,
    max_tokens: u32,
}

impl FuturePredictor {
    pub fn new(ai: Arc<dyn AiProvider>, horizon_months: u32, max_tokens: u32) -> Self {
        Self {
            ai,
            horizon_months,
            max_tokens,
        }
    }

    pub async fn predict(
        &self,
        input: &ProjectInput,
        research: &ResearchReport,
    ) -> Result<Value, GeneratorError> {
        let prompt = self.prompt(input, research);
        let reply = self
            .ai
            .generate(&prompt, self.max_tokens)
            .await
            .map_err(|e| GeneratorError::Ai(format!("{e:#}")))?;
        let mut projection = extract_json(&reply)
            .map_err(|e| GeneratorError::AiResponse(format!("predictions: {e}")))?;

        let Some(obj) = projection.as_object_mut() else {
            return Err(GeneratorError::AiResponse(
                "predictions: expected a JSON object".to_string(),
            ));
        };
        if !SECTIONS
            .iter()
            .any(|s| obj.get(*s).is_some_and(crate::executor::is_truthy))
        {
            return Err(GeneratorError::NothingValid("market predictions".to_string()));
        }
        obj.insert("segment".to_string(), json!(input.segment.trim()));
        obj.insert("horizon_months".to_string(), json!(self.horizon_months));
        obj.insert("generated_at".to_string(), json!(now_rfc3339()));
        Ok(projection)
    }

    fn prompt(&self, input: &ProjectInput, research: &ResearchReport) -> String {
        let segment = input.segment.trim();
        let sources = research
            .sources
            .iter()
            .take(10)
            .map(|s| format!("- {} ({})", s.title, s.url))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            r#"You are a market futurist. Project the next {months} months of the {segment} market.

PRODUCT: {product}
RESEARCH: {pages} pages, {chars} characters analysed.
SOURCES:
{sources}

RETURN ONLY VALID JSON:

```json
{{
  "trends": [{{"name": "...", "impact": "High/Medium/Low", "evidence": "..."}}],
  "scenarios": {{"optimistic": "...", "realistic": "...", "pessimistic": "..."}},
  "opportunities": ["..."],
  "threats": ["..."],
  "timeline": [{{"period": "0-6 months", "expected_changes": ["..."]}}]
}}
```"#,
            months = self.horizon_months,
            product = input.product_or("not provided"),
            pages = research.successful_extractions,
            chars = research.total_content_length,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct Reply(String);

    #[async_trait]
    impl AiProvider for Reply {
        fn name(&self) -> &str {
            "reply"
        }

        async fn generate(&self, prompt: &str, _max_tokens: u32) -> anyhow::Result<String> {
            assert!(prompt.contains("next 24 months"));
            Ok(self.0.clone())
        }
    }

    fn input() -> ProjectInput {
        ProjectInput {
            segment: "pet care".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_predict_adds_metadata() {
        let ai = Arc::new(Reply(
            "```json\n{\"trends\": [{\"name\": \"Premium food\"}]}\n```".to_string(),
        ));
        let out = FuturePredictor::new(ai, 24, 1_000)
            .predict(&input(), &ResearchReport::default())
            .await
            .unwrap();
        assert_eq!(out["segment"], "pet care");
        assert_eq!(out["horizon_months"], 24);
        assert_eq!(out["trends"][0]["name"], "Premium food");
    }

    #[tokio::test]
    async fn test_empty_projection_fails() {
        let ai = Arc::new(Reply("{\"trends\": []}".to_string()));
        let err = FuturePredictor::new(ai, 24, 1_000)
            .predict(&input(), &ResearchReport::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::NothingValid(_)));
    }

    #[tokio::test]
    async fn test_non_object_fails() {
        let ai = Arc::new(Reply("[1, 2]".to_string()));
        let err = FuturePredictor::new(ai, 24, 1_000)
            .predict(&input(), &ResearchReport::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::AiResponse(_)));
    }
}
