//! Contracts for the external collaborators the analysis pipeline drives.
//!
//! Concrete HTTP implementations live in the plugins crate; tests use scripted
//! fakes.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One hit returned by a web search provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    /// Provider that produced the hit.
    #[serde(default)]
    pub source: String,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Readable text of the page, or `None` when nothing usable was found.
    async fn extract(&self, url: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait AiProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}

/// Verdict of a content quality check, `score` in 0..=100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentVerdict {
    pub valid: bool,
    pub score: f64,
    pub reason: String,
}

impl ContentVerdict {
    pub fn accept(score: f64) -> Self {
        Self {
            valid: true,
            score,
            reason: "ok".to_string(),
        }
    }

    pub fn reject(score: f64, reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            score,
            reason: reason.into(),
        }
    }
}

pub trait ContentValidator: Send + Sync {
    fn validate(&self, content: &str, url: &str) -> ContentVerdict;
}
