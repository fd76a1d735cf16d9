use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;

use pitchforge_core::api::{SearchHit, SearchProvider, SerperConfig};

use crate::http::{build_client, parse_json_response, ProviderHttpError};

const NAME: &str = "serper";

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

/// Google results through serper.dev.
pub struct SerperSearch {
    endpoint: String,
    api_key: String,
    country: Option<String>,
    http: reqwest::Client,
}

impl SerperSearch {
    pub fn new(cfg: &SerperConfig) -> Result<Self> {
        Ok(Self {
            endpoint: cfg.endpoint.clone(),
            api_key: cfg.api_key.clone(),
            country: cfg.country.clone(),
            http: build_client(cfg.timeout_ms, None)?,
        })
    }
}

#[async_trait]
impl SearchProvider for SerperSearch {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow!("serper api key is not configured"));
        }
        let url = &self.endpoint;
        let mut body = serde_json::json!({ "q": query, "num": max_results });
        if let Some(country) = &self.country {
            body["gl"] = serde_json::json!(country);
        }

        let resp = self
            .http
            .post(url)
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderHttpError::from_reqwest(NAME, err, url.clone()))?;
        let value = parse_json_response(NAME, resp).await?;
        let parsed: SerperResponse = serde_json::from_value(value)
            .map_err(|e| anyhow!("serper: unexpected response shape: {e}"))?;

        let hits: Vec<SearchHit> = parsed
            .organic
            .into_iter()
            .filter(|r| r.link.starts_with("http"))
            .take(max_results)
            .map(|r| SearchHit {
                url: r.link,
                title: r.title,
                snippet: r.snippet,
                source: NAME.to_string(),
            })
            .collect();
        tracing::debug!(%query, hits = hits.len(), "serper search finished");
        Ok(hits)
    }
}
