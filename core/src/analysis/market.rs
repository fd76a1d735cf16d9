//! Language-model market analysis: avatar, scope, competition, keywords and
//! insights grounded in the research pages.

use std::sync::Arc;

use serde_json::Value;

use super::quality::find_placeholder_markers;
use super::{ProjectInput, ResearchReport};
use crate::backend::AiProvider;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::executor::is_truthy;
use crate::generators::extract_json;

/// Sections every analysis must contain.
pub const REQUIRED_SECTIONS: [&str; 3] = ["avatar", "scope", "insights"];

const MIN_INSIGHTS: usize = 5;
const SUBSTANTIAL_INSIGHT_CHARS: usize = 50;
const SUBSTANTIAL_INSIGHT_SHARE: f64 = 0.7;

/// Research digest handed to the model: the best pages first, then totals.
pub fn build_search_context(
    report: &ResearchReport,
    config: &AnalysisConfig,
) -> Result<String, AnalysisError> {
    if report.extracted_content.is_empty() {
        return Err(AnalysisError::InsufficientResearch(
            "no extracted content to analyse".to_string(),
        ));
    }

    let mut pages: Vec<_> = report.extracted_content.iter().collect();
    pages.sort_by(|a, b| b.quality_score.total_cmp(&a.quality_score));

    let mut ctx = String::from("WEB RESEARCH RESULTS:\n\n");
    for (i, page) in pages.iter().take(config.context_pages).enumerate() {
        let excerpt: String = page.content.chars().take(config.context_page_chars).collect();
        ctx.push_str(&format!("--- SOURCE {}: {} ---\n", i + 1, page.title));
        ctx.push_str(&format!("URL: {}\n", page.url));
        ctx.push_str(&format!("Quality: {:.1}%\n", page.quality_score));
        ctx.push_str(&format!("Content: {excerpt}\n\n"));
    }

    ctx.push_str("\n=== RESEARCH STATISTICS ===\n");
    ctx.push_str(&format!("Queries executed: {}\n", report.total_queries));
    ctx.push_str(&format!("Search results: {}\n", report.total_results));
    ctx.push_str(&format!("Unique pages analysed: {}\n", report.unique_sources));
    ctx.push_str(&format!(
        "Successful extractions: {}\n",
        report.successful_extractions
    ));
    ctx.push_str(&format!(
        "Characters extracted: {}\n",
        report.total_content_length
    ));
    ctx.push_str(&format!(
        "Average content quality: {:.1}%\n",
        report.quality_metrics.avg_quality_score
    ));
    Ok(ctx)
}

pub fn build_analysis_prompt(input: &ProjectInput, search_context: &str) -> String {
    const NA: &str = "not provided";
    format!(
        r#"# MARKET ANALYSIS

You are a senior market analyst with decades of experience.

## PROJECT
- Segment: {segment}
- Product/Service: {product}
- Target audience: {audience}
- Price: {price}
- Revenue goal: {revenue}
- Marketing budget: {budget}

{search_context}

## RULES
1. Use ONLY facts from the research above.
2. Never use placeholders such as "N/A", "customized for" or "based on".
3. Omit a section entirely when the research does not support it.
4. Be specific, not generic.

## RESPONSE FORMAT
```json
{{
  "avatar": {{
    "persona_name": "...",
    "demographics": {{"age": "...", "gender": "...", "income": "...", "education": "...", "location": "...", "occupation": "..."}},
    "psychographics": {{"personality": "...", "values": "...", "interests": "...", "lifestyle": "...", "buying_behavior": "...", "deep_fears": "...", "secret_aspirations": "..."}},
    "pains": ["10-15 specific visceral pains"],
    "desires": ["10-15 deep desires"],
    "objections": ["8-12 real objections"],
    "emotional_journey": {{"awareness": "...", "consideration": "...", "decision": "...", "post_purchase": "..."}},
    "inner_language": {{"pain_phrases": ["..."], "desire_phrases": ["..."], "metaphors": ["..."], "vocabulary": ["..."], "tone": "..."}}
  }},
  "scope": {{
    "positioning": "...",
    "value_proposition": "...",
    "differentiators": ["..."],
    "core_message": "...",
    "tone": "...",
    "niche": "...",
    "blue_ocean_strategy": "...",
    "price_anchoring": "..."
  }},
  "competition": [
    {{"name": "...", "swot": {{"strengths": ["..."], "weaknesses": ["..."], "opportunities": ["..."], "threats": ["..."]}}, "marketing_strategy": "...", "positioning": "...", "vulnerabilities": ["..."], "estimated_share": "..."}}
  ],
  "keyword_strategy": {{"primary": ["..."], "secondary": ["..."], "long_tail": ["..."], "content_strategy": "...", "seasonality": "...", "seo_opportunities": "..."}},
  "insights": ["20-30 specific, evidence-backed insights"]
}}
```"#,
        segment = input.segment.trim(),
        product = input.product_or(NA),
        audience = input.audience_or(NA),
        price = input.price_or(NA),
        revenue = input.revenue_goal_or(NA),
        budget = input.marketing_budget_or(NA),
    )
}

/// Why the analysis looks invented, if it does.
pub fn detect_simulated_data(analysis: &Value) -> Option<String> {
    let markers = find_placeholder_markers(analysis);
    if !markers.is_empty() {
        return Some(format!("placeholder markers found: {}", markers.join(", ")));
    }
    for section in REQUIRED_SECTIONS {
        if !analysis.get(section).is_some_and(is_truthy) {
            return Some(format!("section '{section}' missing or empty"));
        }
    }
    let insights: Vec<&Value> = analysis
        .get("insights")
        .and_then(Value::as_array)
        .map(|a| a.iter().collect())
        .unwrap_or_default();
    if insights.len() < MIN_INSIGHTS {
        return Some(format!(
            "only {} insights, {MIN_INSIGHTS} required",
            insights.len()
        ));
    }
    let substantial = insights
        .iter()
        .filter(|i| {
            i.as_str()
                .is_some_and(|s| s.chars().count() > SUBSTANTIAL_INSIGHT_CHARS)
        })
        .count();
    if (substantial as f64) < insights.len() as f64 * SUBSTANTIAL_INSIGHT_SHARE {
        return Some(format!(
            "too many shallow insights: {substantial}/{} substantial",
            insights.len()
        ));
    }
    None
}

/// The avatar needs at least demographics and pains to drive the
/// downstream generators.
pub fn check_avatar(analysis: &Value) -> Result<(), AnalysisError> {
    let avatar = analysis.get("avatar").unwrap_or(&Value::Null);
    for field in ["demographics", "pains"] {
        if !avatar.get(field).is_some_and(is_truthy) {
            return Err(AnalysisError::AiResponse(format!(
                "avatar incomplete: '{field}' missing"
            )));
        }
    }
    Ok(())
}

/// Parse and vet a model reply.
pub fn parse_market_analysis(reply: &str) -> Result<Value, AnalysisError> {
    let analysis = extract_json(reply).map_err(|e| {
        let preview: String = reply.chars().take(500).collect();
        tracing::error!(error = %e, %preview, "market analysis is not valid json");
        AnalysisError::AiResponse(format!("invalid json: {e}"))
    })?;
    if !analysis.is_object() {
        return Err(AnalysisError::AiResponse(
            "expected a JSON object".to_string(),
        ));
    }
    if let Some(reason) = detect_simulated_data(&analysis) {
        return Err(AnalysisError::AiResponse(format!("simulated data: {reason}")));
    }
    check_avatar(&analysis)?;
    Ok(analysis)
}

pub struct MarketAnalyst {
    ai: Arc<dyn AiProvider>,
    config: AnalysisConfig,
}

impl MarketAnalyst {
    pub fn new(ai: Arc<dyn AiProvider>, config: AnalysisConfig) -> Self {
        Self { ai, config }
    }

    #[tracing::instrument(skip_all, fields(provider = self.ai.name()))]
    pub async fn analyze(
        &self,
        input: &ProjectInput,
        research: &ResearchReport,
    ) -> Result<Value, AnalysisError> {
        let context = build_search_context(research, &self.config)?;
        let prompt = build_analysis_prompt(input, &context);
        let reply = self
            .ai
            .generate(&prompt, self.config.analysis_max_tokens)
            .await
            .map_err(|e| AnalysisError::AiUnavailable(format!("{e:#}")))?;
        if reply.trim().is_empty() {
            return Err(AnalysisError::AiUnavailable("empty reply".to_string()));
        }
        let analysis = parse_market_analysis(&reply)?;
        tracing::info!("market analysis accepted");
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ExtractedPage;
    use serde_json::json;

    fn insight(i: usize) -> String {
        format!("Insight {i}: buyers in this niche compare at least three providers before paying")
    }

    pub(crate) fn valid_analysis() -> Value {
        json!({
            "avatar": {
                "demographics": {"age": "30-45"},
                "pains": ["Spends weekends on paperwork instead of family time"],
            },
            "scope": {"positioning": "Premium"},
            "insights": (0..6).map(insight).collect::<Vec<_>>(),
        })
    }

    #[test]
    fn test_accepts_complete_analysis() {
        let reply = format!("```json\n{}\n```", valid_analysis());
        assert_eq!(parse_market_analysis(&reply).unwrap(), valid_analysis());
    }

    #[test]
    fn test_rejects_placeholders() {
        let mut v = valid_analysis();
        v["avatar"]["demographics"]["income"] = json!("N/A");
        let reason = detect_simulated_data(&v).unwrap();
        assert!(reason.contains("n/a"));
    }

    #[test]
    fn test_rejects_shallow_insights() {
        let mut v = valid_analysis();
        v["insights"] = json!(["short", "short", "tiny", insight(1), insight(2), insight(3)]);
        assert!(detect_simulated_data(&v).unwrap().contains("shallow"));

        v["insights"] = json!([insight(1), insight(2)]);
        assert!(detect_simulated_data(&v).unwrap().contains("only 2"));

        v["scope"] = json!({});
        assert!(detect_simulated_data(&v).unwrap().contains("scope"));
    }

    #[test]
    fn test_incomplete_avatar() {
        let mut v = valid_analysis();
        v["avatar"]["pains"] = json!([]);
        let reply = v.to_string();
        let err = parse_market_analysis(&reply).unwrap_err();
        assert!(err.to_string().contains("pains"));
    }

    #[test]
    fn test_search_context_orders_by_quality() {
        let page = |url: &str, score: f64| ExtractedPage {
            url: url.to_string(),
            title: url.to_string(),
            content: "x".repeat(3_000),
            snippet: String::new(),
            quality_score: score,
            source: String::new(),
        };
        let report = ResearchReport {
            extracted_content: vec![page("low", 61.0), page("high", 95.0)],
            ..Default::default()
        };
        let cfg = AnalysisConfig::default();
        let ctx = build_search_context(&report, &cfg).unwrap();
        assert!(ctx.find("SOURCE 1: high").unwrap() < ctx.find("SOURCE 2: low").unwrap());
        assert!(!ctx.contains(&"x".repeat(2_001)));

        assert!(build_search_context(&ResearchReport::default(), &cfg).is_err());
    }

    #[test]
    fn test_search_context_lists_statistics_one_per_line() {
        let mut report = ResearchReport {
            extracted_content: vec![ExtractedPage {
                url: "https://a.example".to_string(),
                title: "A".to_string(),
                content: "market data".to_string(),
                snippet: String::new(),
                quality_score: 88.0,
                source: String::new(),
            }],
            total_queries: 4,
            unique_sources: 1,
            total_content_length: 11,
            ..Default::default()
        };
        report.quality_metrics.avg_quality_score = 88.0;

        let ctx = build_search_context(&report, &AnalysisConfig::default()).unwrap();
        let lines: Vec<&str> = ctx.lines().collect();
        assert!(lines.contains(&"URL: https://a.example"));
        assert!(lines.contains(&"Content: market data"));
        assert!(lines.contains(&"Queries executed: 4"));
        assert!(lines.contains(&"Characters extracted: 11"));
        assert_eq!(lines.last(), Some(&"Average content quality: 88.0%"));
    }
}
