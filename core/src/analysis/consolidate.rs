//! Final report assembly and scoring.

use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Map, Value};

use super::quality::contains_generic_marker;
use super::{ProjectInput, ResearchReport};
use crate::config::AnalysisConfig;
use crate::executor::{is_truthy, RunReport};
use crate::generators::string_list;

/// Components whose output is merged into the report under their own name.
pub const ADVANCED_COMPONENTS: [&str; 5] = [
    "mental_drivers",
    "visual_proofs",
    "anti_objection",
    "pre_pitch",
    "future_predictions",
];

const MAX_CONCEPTS: usize = 10;
const MIN_CONCEPT_CHARS: usize = 20;

/// Concepts worth a visual proof: the strongest pains and desires of the
/// avatar plus the leading differentiators.
pub fn extract_concepts(analysis: &Value) -> Vec<String> {
    let avatar = analysis.get("avatar").unwrap_or(&Value::Null);
    let scope = analysis.get("scope").unwrap_or(&Value::Null);

    string_list(avatar, "pains")
        .into_iter()
        .take(5)
        .chain(string_list(avatar, "desires").into_iter().take(5))
        .chain(string_list(scope, "differentiators").into_iter().take(3))
        .filter(|c| c.chars().count() > MIN_CONCEPT_CHARS && !contains_generic_marker(c))
        .take(MAX_CONCEPTS)
        .collect()
}

/// Merge research statistics, the market analysis and every successful
/// advanced component into one report.
pub fn consolidate(
    input: &ProjectInput,
    research: &ResearchReport,
    analysis: &Value,
    run: &RunReport,
) -> Value {
    let mut report = Map::new();
    report.insert("project".to_string(), json!(input));
    report.insert(
        "research".to_string(),
        json!({
            "statistics": {
                "total_queries": research.total_queries,
                "total_results": research.total_results,
                "unique_sources": research.unique_sources,
                "total_content": research.total_content_length,
                "successful_extractions": research.successful_extractions,
                "avg_quality": research.quality_metrics.avg_quality_score,
            },
            "sources": research.sources,
        }),
    );

    if let Some(sections) = analysis.as_object() {
        for (key, value) in sections {
            report.insert(key.clone(), value.clone());
        }
    }

    let mut successful = Vec::new();
    for name in ADVANCED_COMPONENTS {
        if let Some(output) = run.successful_components.get(name) {
            report.insert(name.to_string(), output.clone());
            successful.push(name);
        }
    }

    let failed: Vec<&str> = run
        .failure_report
        .keys()
        .map(String::as_str)
        .collect();
    report.insert("consolidated_at".to_string(), json!(Utc::now().to_rfc3339()));
    report.insert(
        "component_status".to_string(),
        json!({
            "successful": successful,
            "failed": failed,
            "total_attempted": run.stats.total,
        }),
    );
    Value::Object(report)
}

/// Report quality on a 0-100 scale.
///
/// The research points use `config.min_sources` and `config.min_content_chars`,
/// the thresholds the research quality gate enforces (3 sources and 5000
/// chars by default).
pub fn quality_score(report: &Value, config: &AnalysisConfig) -> f64 {
    let stats = report.pointer("/research/statistics").unwrap_or(&Value::Null);
    let stat = |key: &str| stats.get(key).and_then(Value::as_f64).unwrap_or(0.0);
    let mut score = 0.0;

    if stat("unique_sources") >= config.min_sources as f64 {
        score += 15.0;
    }
    if stat("total_content") >= config.min_content_chars as f64 {
        score += 15.0;
    }
    if report.get("avatar").is_some_and(is_truthy) {
        score += 15.0;
    }
    let insights = report
        .get("insights")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    if insights >= 5 {
        score += 15.0;
    }
    if report.get("competition").is_some_and(is_truthy) {
        score += 10.0;
    }

    let advanced = ADVANCED_COMPONENTS
        .iter()
        .filter(|c| report.get(**c).is_some())
        .count();
    score += 30.0 * advanced as f64 / ADVANCED_COMPONENTS.len() as f64;

    let avg_quality = stat("avg_quality");
    if avg_quality >= 80.0 {
        score += 5.0;
    } else if avg_quality >= 60.0 {
        score += 3.0;
    }
    score.min(100.0)
}

/// `"Xm Ys"` rendering of a processing time.
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}

pub fn attach_metadata(
    report: &mut Value,
    elapsed: Duration,
    quality_score: f64,
    research: &ResearchReport,
    run: &RunReport,
) {
    let Some(obj) = report.as_object_mut() else {
        return;
    };
    let failures: Map<String, Value> = run
        .failure_report
        .iter()
        .map(|(name, record)| (name.clone(), json!(record.error)))
        .collect();
    obj.insert(
        "metadata".to_string(),
        json!({
            "processing_time_seconds": elapsed.as_secs_f64(),
            "processing_time_formatted": format_duration(elapsed),
            "generated_at": Utc::now().to_rfc3339(),
            "quality_score": quality_score,
            "real_data_sources": research.unique_sources,
            "total_content_analyzed": research.total_content_length,
            "successful_components": run.stats.successful_count,
            "failed_components": run.stats.failed_count,
            "component_failures": failures,
            "run_id": run.run_id,
            "execution_mode": run.mode,
        }),
    );
}
