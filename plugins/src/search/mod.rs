pub mod searxng;
pub mod serper;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use pitchforge_core::api::{SearchHit, SearchProvider};

pub use searxng::SearxngSearch;
pub use serper::SerperSearch;

/// Asks each provider in turn until one returns hits.
pub struct FallbackSearch {
    providers: Vec<Arc<dyn SearchProvider>>,
}

impl FallbackSearch {
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl SearchProvider for FallbackSearch {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let mut last_error = None;
        for provider in &self.providers {
            match provider.search(query, max_results).await {
                Ok(hits) if !hits.is_empty() => return Ok(hits),
                Ok(_) => tracing::debug!(provider = provider.name(), %query, "no hits"),
                Err(e) => {
                    tracing::warn!(provider = provider.name(), %query, error = %e, "search provider failed");
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) => Err(e),
            None if self.providers.is_empty() => Err(anyhow!("no search provider configured")),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted(&'static str, Result<usize, &'static str>);

    #[async_trait]
    impl SearchProvider for Scripted {
        fn name(&self) -> &str {
            self.0
        }

        async fn search(&self, query: &str, _max: usize) -> Result<Vec<SearchHit>> {
            let count = self.1.map_err(|e| anyhow!(e))?;
            Ok((0..count)
                .map(|i| SearchHit {
                    url: format!("https://{}.example/{i}", self.0),
                    title: query.to_string(),
                    snippet: String::new(),
                    source: self.0.to_string(),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_falls_through_errors_and_empty_results() {
        let chain = FallbackSearch::new(vec![
            Arc::new(Scripted("down", Err("quota"))),
            Arc::new(Scripted("empty", Ok(0))),
            Arc::new(Scripted("good", Ok(2))),
        ]);
        let hits = chain.search("q", 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source, "good");
    }

    #[tokio::test]
    async fn test_all_empty_is_not_an_error() {
        let chain = FallbackSearch::new(vec![Arc::new(Scripted("empty", Ok(0)))]);
        assert!(chain.search("q", 5).await.unwrap().is_empty());

        let failing = FallbackSearch::new(vec![Arc::new(Scripted("down", Err("quota")))]);
        assert_eq!(failing.search("q", 5).await.unwrap_err().to_string(), "quota");
    }
}
