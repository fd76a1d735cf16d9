#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pitchforge_core::api::{
    AiProvider, ContentExtractor, ContentValidator, ContentVerdict, PipelineServices, SearchHit,
    SearchProvider,
};
use serde_json::{json, Value};

/// Language model that answers by prompt marker and fails everything else.
#[derive(Default)]
pub struct ScriptedAi {
    replies: Vec<(&'static str, String)>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedAi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, marker: &'static str, body: impl Into<String>) -> Self {
        self.replies.push((marker, body.into()));
        self
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl AiProvider for ScriptedAi {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str, _max_tokens: u32) -> anyhow::Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.replies
            .iter()
            .find(|(marker, _)| prompt.contains(marker))
            .map(|(_, body)| body.clone())
            .ok_or_else(|| anyhow::anyhow!("no scripted reply"))
    }
}

/// Search provider returning the same pages for every query.
pub struct StaticSearch {
    pub urls: Vec<String>,
}

impl StaticSearch {
    pub fn with_pages(count: usize) -> Self {
        Self {
            urls: (0..count)
                .map(|i| format!("https://source{i}.example.com/report"))
                .collect(),
        }
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<SearchHit>> {
        Ok(self
            .urls
            .iter()
            .take(max_results)
            .enumerate()
            .map(|(i, url)| SearchHit {
                url: url.clone(),
                title: format!("Industry report {i}"),
                snippet: format!("Findings about {query}"),
                source: "static".to_string(),
            })
            .collect())
    }
}

/// Extractor serving canned article text, optionally overridden per URL.
#[derive(Default)]
pub struct ArticleExtractor {
    pub overrides: HashMap<String, Option<String>>,
}

#[async_trait]
impl ContentExtractor for ArticleExtractor {
    async fn extract(&self, url: &str) -> anyhow::Result<Option<String>> {
        if let Some(body) = self.overrides.get(url) {
            return Ok(body.clone());
        }
        Ok(Some(article(url, 30)))
    }
}

pub struct FixedScore(pub f64);

impl ContentValidator for FixedScore {
    fn validate(&self, _content: &str, _url: &str) -> ContentVerdict {
        ContentVerdict::accept(self.0)
    }
}

pub fn article(url: &str, sentences: usize) -> String {
    (0..sentences)
        .map(|i| {
            format!(
                "Survey {i} published at {url} shows that independent dental clinics grew patient volume while struggling with scheduling. "
            )
        })
        .collect()
}

pub fn market_analysis() -> Value {
    json!({
        "avatar": {
            "persona_name": "Clinic owner Marta",
            "demographics": {"age": "35-50", "occupation": "Dentist and clinic owner"},
            "pains": [
                "Loses three chair-hours a week to last-minute cancellations",
                "Depends on insurance plans that cut reimbursements every year",
            ],
            "desires": [
                "A fully booked schedule of private-pay patients every month",
            ],
            "objections": [
                "It is too expensive for a clinic my size",
                "I do not have time to learn another system",
                "I tried marketing agencies before and nothing changed",
            ],
        },
        "scope": {
            "positioning": "Patient acquisition system for independent clinics",
            "differentiators": ["Guaranteed first appointments within thirty days"],
        },
        "competition": [{"name": "Generic dental marketing agencies"}],
        "keyword_strategy": {"primary": ["dental marketing"]},
        "insights": [
            "Independent clinics that confirm appointments by message cut no-shows sharply",
            "Private-pay patients choose clinics through reviews far more than through ads",
            "Most clinic owners track revenue monthly but never track acquisition cost",
            "Clinics with online booking fill cancelled slots faster than phone-only clinics",
            "Owners distrust agencies that report impressions instead of booked patients",
        ],
    })
}

pub fn predictions() -> Value {
    json!({
        "trends": [{"trend": "Teledentistry triage", "probability": "high"}],
        "opportunities": ["Membership plans for uninsured patients"],
    })
}

pub fn fenced(value: &Value) -> String {
    format!("```json\n{value:#}\n```")
}

/// Services for a run where every collaborator behaves.
pub fn healthy_services(ai: Arc<ScriptedAi>) -> PipelineServices {
    PipelineServices::new(
        Arc::new(StaticSearch::with_pages(3)),
        Arc::new(ArticleExtractor::default()),
        ai,
    )
    .with_content_validator(Arc::new(FixedScore(85.0)))
}

pub fn healthy_ai() -> ScriptedAi {
    ScriptedAi::new()
        .reply("MARKET ANALYSIS", fenced(&market_analysis()))
        .reply("market futurist", fenced(&predictions()))
}
