use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;

use pitchforge_core::api::{SearchHit, SearchProvider, SearxngConfig};

use crate::http::{build_client, parse_json_response, ProviderHttpError};

const NAME: &str = "searxng";

#[derive(Debug, Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Vec<SearxngResult>,
}

#[derive(Debug, Deserialize)]
struct SearxngResult {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

/// Self-hosted SearXNG instance queried through its JSON API.
pub struct SearxngSearch {
    url_search: String,
    language: Option<String>,
    http: reqwest::Client,
}

impl SearxngSearch {
    pub fn new(cfg: &SearxngConfig) -> Result<Self> {
        Ok(Self {
            url_search: format!("{}/search", cfg.base_url.trim_end_matches('/')),
            language: cfg.language.clone(),
            http: build_client(cfg.timeout_ms, None)?,
        })
    }
}

#[async_trait]
impl SearchProvider for SearxngSearch {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let url = &self.url_search;
        let mut params = vec![("q", query), ("format", "json")];
        if let Some(lang) = &self.language {
            params.push(("language", lang.as_str()));
        }
        let resp = self
            .http
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(|err| ProviderHttpError::from_reqwest(NAME, err, url.clone()))?;
        let value = parse_json_response(NAME, resp).await?;
        let parsed: SearxngResponse = serde_json::from_value(value)
            .map_err(|e| anyhow!("searxng: unexpected response shape: {e}"))?;

        Ok(parsed
            .results
            .into_iter()
            .take(max_results)
            .map(|r| SearchHit {
                url: r.url,
                title: r.title,
                snippet: r.content,
                source: NAME.to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_search_uses_json_format_and_caps_results() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "solar panels".into()),
                Matcher::UrlEncoded("format".into(), "json".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"results":[
                    {"url":"https://one.example","title":"One","content":"c1"},
                    {"url":"https://two.example","title":"Two"},
                    {"url":"https://three.example","title":"Three"}
                ]}"#,
            )
            .create_async()
            .await;

        let search = SearxngSearch::new(&SearxngConfig {
            base_url: format!("{}/", server.url()),
            timeout_ms: 1_000,
            language: None,
        })
        .unwrap();
        let hits = search.search("solar panels", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].snippet, "c1");
        assert_eq!(hits[1].url, "https://two.example");
    }
}
