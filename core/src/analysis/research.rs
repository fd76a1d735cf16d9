//! Web research: search, extract, validate and deduplicate pages.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::{ContentExtractor, ContentValidator, SearchProvider};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

/// One page kept by the research phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPage {
    pub url: String,
    pub title: String,
    /// Leading excerpt of the page text.
    pub content: String,
    #[serde(default)]
    pub snippet: String,
    pub quality_score: f64,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub url: String,
    pub title: String,
    pub quality_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub avg_quality_score: f64,
    /// Kept pages over search hits, in percent.
    pub extraction_success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchReport {
    pub queries_executed: Vec<String>,
    pub total_queries: usize,
    pub total_results: usize,
    pub unique_sources: usize,
    pub successful_extractions: usize,
    /// Full length of every kept page, before excerpting.
    pub total_content_length: usize,
    pub extracted_content: Vec<ExtractedPage>,
    pub sources: Vec<SourceRef>,
    pub research_timestamp: DateTime<Utc>,
    pub quality_metrics: QualityMetrics,
}

impl Default for ResearchReport {
    fn default() -> Self {
        Self {
            queries_executed: Vec::new(),
            total_queries: 0,
            total_results: 0,
            unique_sources: 0,
            successful_extractions: 0,
            total_content_length: 0,
            extracted_content: Vec::new(),
            sources: Vec::new(),
            research_timestamp: Utc::now(),
            quality_metrics: QualityMetrics::default(),
        }
    }
}

pub struct WebResearcher {
    search: Arc<dyn SearchProvider>,
    extractor: Arc<dyn ContentExtractor>,
    validator: Arc<dyn ContentValidator>,
    config: AnalysisConfig,
}

impl WebResearcher {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        extractor: Arc<dyn ContentExtractor>,
        validator: Arc<dyn ContentValidator>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            search,
            extractor,
            validator,
            config,
        }
    }

    /// Run every query. Failures of a single query or page are logged and
    /// skipped; the report reflects whatever was collected.
    #[tracing::instrument(skip_all, fields(queries = queries.len(), provider = self.search.name()))]
    pub async fn run(&self, queries: &[String]) -> ResearchReport {
        let mut total_results = 0usize;
        let mut total_content_length = 0usize;
        let mut seen: HashSet<String> = HashSet::new();
        let mut pages: Vec<ExtractedPage> = Vec::new();

        for (i, query) in queries.iter().enumerate() {
            if i > 0 && self.config.query_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.query_delay_ms)).await;
            }

            let hits = match self
                .search
                .search(query, self.config.results_per_query)
                .await
            {
                Ok(hits) if hits.is_empty() => {
                    tracing::warn!(%query, "query returned no results");
                    continue;
                }
                Ok(hits) => hits,
                Err(e) => {
                    tracing::error!(%query, error = %e, "search failed");
                    continue;
                }
            };
            total_results += hits.len();
            tracing::debug!(%query, hits = hits.len(), "extracting pages");

            for hit in hits.into_iter().take(self.config.extract_per_query) {
                if seen.contains(&hit.url) {
                    continue;
                }
                let content = match self.extractor.extract(&hit.url).await {
                    Ok(Some(c)) => c,
                    Ok(None) => {
                        tracing::warn!(url = %hit.url, "no content extracted");
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(url = %hit.url, error = %e, "extraction failed");
                        continue;
                    }
                };

                let length = content.chars().count();
                let verdict = self.validator.validate(&content, &hit.url);
                if !verdict.valid || length < self.config.min_page_chars {
                    tracing::warn!(url = %hit.url, reason = %verdict.reason, length, "page rejected");
                    continue;
                }

                tracing::info!(url = %hit.url, length, score = verdict.score, "page kept");
                seen.insert(hit.url.clone());
                total_content_length += length;
                pages.push(ExtractedPage {
                    title: if hit.title.trim().is_empty() {
                        "Untitled".to_string()
                    } else {
                        hit.title
                    },
                    content: content.chars().take(self.config.page_excerpt_chars).collect(),
                    snippet: hit.snippet,
                    quality_score: verdict.score,
                    source: hit.source,
                    url: hit.url,
                });
            }
        }

        let avg_quality_score = if pages.is_empty() {
            0.0
        } else {
            pages.iter().map(|p| p.quality_score).sum::<f64>() / pages.len() as f64
        };
        let extraction_success_rate = if total_results == 0 {
            0.0
        } else {
            pages.len() as f64 / total_results as f64 * 100.0
        };

        tracing::info!(
            pages = pages.len(),
            chars = total_content_length,
            "research finished"
        );
        ResearchReport {
            queries_executed: queries.to_vec(),
            total_queries: queries.len(),
            total_results,
            unique_sources: pages.len(),
            successful_extractions: pages.len(),
            total_content_length,
            sources: pages
                .iter()
                .map(|p| SourceRef {
                    url: p.url.clone(),
                    title: p.title.clone(),
                    quality_score: p.quality_score,
                })
                .collect(),
            extracted_content: pages,
            research_timestamp: Utc::now(),
            quality_metrics: QualityMetrics {
                avg_quality_score,
                extraction_success_rate,
            },
        }
    }
}

/// Reject research that is too thin to ground an analysis on.
pub fn check_research_quality(
    report: &ResearchReport,
    config: &AnalysisConfig,
) -> Result<(), AnalysisError> {
    if report.total_content_length < config.min_content_chars {
        return Err(AnalysisError::InsufficientResearch(format!(
            "{} characters collected, {} required",
            report.total_content_length, config.min_content_chars
        )));
    }
    if report.unique_sources < config.min_sources {
        return Err(AnalysisError::InsufficientResearch(format!(
            "{} sources collected, {} required",
            report.unique_sources, config.min_sources
        )));
    }
    if report.successful_extractions == 0 {
        return Err(AnalysisError::InsufficientResearch(
            "no page could be extracted".to_string(),
        ));
    }
    let avg = report.quality_metrics.avg_quality_score;
    if avg < config.min_avg_source_quality {
        return Err(AnalysisError::InsufficientResearch(format!(
            "average source quality {avg:.1} below {:.1}",
            config.min_avg_source_quality
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ContentVerdict, SearchHit};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    struct FixedSearch(HashMap<String, anyhow::Result<Vec<SearchHit>>>);

    #[async_trait]
    impl SearchProvider for FixedSearch {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn search(&self, query: &str, _max: usize) -> anyhow::Result<Vec<SearchHit>> {
            match self.0.get(query) {
                Some(Ok(hits)) => Ok(hits.clone()),
                Some(Err(e)) => Err(anyhow::anyhow!("{e}")),
                None => Ok(Vec::new()),
            }
        }
    }

    struct PageBodies;

    #[async_trait]
    impl ContentExtractor for PageBodies {
        async fn extract(&self, url: &str) -> anyhow::Result<Option<String>> {
            if url.contains("broken") {
                anyhow::bail!("connection reset");
            }
            if url.contains("short") {
                return Ok(Some("short".to_string()));
            }
            Ok(Some(format!("{url} ").repeat(200)))
        }
    }

    struct FixedScore(f64);

    impl ContentValidator for FixedScore {
        fn validate(&self, _content: &str, _url: &str) -> ContentVerdict {
            ContentVerdict::accept(self.0)
        }
    }

    fn hit(url: &str) -> SearchHit {
        SearchHit {
            url: url.to_string(),
            title: format!("Title {url}"),
            snippet: String::new(),
            source: "fixed".to_string(),
        }
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            query_delay_ms: 0,
            page_excerpt_chars: 100,
            ..AnalysisConfig::default()
        }
    }

    #[tokio::test]
    async fn test_research_dedups_and_skips_failures() {
        let mut table = HashMap::new();
        table.insert(
            "q1".to_string(),
            Ok(vec![hit("https://a.io"), hit("https://broken.io"), hit("https://short.io")]),
        );
        table.insert("q2".to_string(), Ok(vec![hit("https://a.io"), hit("https://b.io")]));
        table.insert("q3".to_string(), Err(anyhow::anyhow!("quota exceeded")));

        let researcher = WebResearcher::new(
            Arc::new(FixedSearch(table)),
            Arc::new(PageBodies),
            Arc::new(FixedScore(80.0)),
            config(),
        );
        let queries: Vec<String> = ["q1", "q2", "q3", "q4"].iter().map(|s| s.to_string()).collect();
        let report = researcher.run(&queries).await;

        assert_eq!(report.total_queries, 4);
        assert_eq!(report.total_results, 5);
        assert_eq!(report.unique_sources, 2);
        let urls: Vec<&str> = report.sources.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.io", "https://b.io"]);
        assert_eq!(report.extracted_content[0].content.chars().count(), 100);
        assert_eq!(report.quality_metrics.avg_quality_score, 80.0);
        assert_eq!(report.quality_metrics.extraction_success_rate, 40.0);
        assert!(report.total_content_length > 2 * 500);
    }

    #[test]
    fn test_quality_gate() {
        let cfg = AnalysisConfig::default();
        let mut report = ResearchReport {
            total_content_length: 6_000,
            unique_sources: 3,
            successful_extractions: 3,
            quality_metrics: QualityMetrics {
                avg_quality_score: 70.0,
                extraction_success_rate: 50.0,
            },
            ..Default::default()
        };
        assert!(check_research_quality(&report, &cfg).is_ok());

        report.quality_metrics.avg_quality_score = 59.9;
        assert!(matches!(
            check_research_quality(&report, &cfg),
            Err(AnalysisError::InsufficientResearch(_))
        ));

        report.quality_metrics.avg_quality_score = 70.0;
        report.unique_sources = 2;
        let err = check_research_quality(&report, &cfg).unwrap_err();
        assert!(err.to_string().contains("2 sources"));
    }
}
