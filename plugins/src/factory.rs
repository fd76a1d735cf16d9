use std::sync::Arc;

use anyhow::{bail, Result};

use pitchforge_core::api::{
    AiConfig, AiProvider, AiProviderConfig, AppConfig, ContentExtractor, ExtractorConfig,
    PipelineServices, SearchConfig, SearchProvider, SearchProviderConfig,
};

use crate::ai::{FallbackAiProvider, OpenAiCompatibleProvider};
use crate::extract::HtmlExtractor;
use crate::search::{FallbackSearch, SearxngSearch, SerperSearch};

pub fn build_ai(cfg: &AiConfig) -> Result<Arc<dyn AiProvider>> {
    let mut providers: Vec<Arc<dyn AiProvider>> = Vec::with_capacity(cfg.providers.len());
    for provider in &cfg.providers {
        match provider {
            AiProviderConfig::OpenAiCompatible(openai) => {
                providers.push(Arc::new(OpenAiCompatibleProvider::new(openai)?))
            }
        }
    }
    match providers.len() {
        0 => bail!("no ai provider configured"),
        1 => Ok(providers.remove(0)),
        _ => Ok(Arc::new(FallbackAiProvider::new(providers))),
    }
}

pub fn build_search(cfg: &SearchConfig) -> Result<Arc<dyn SearchProvider>> {
    let mut providers: Vec<Arc<dyn SearchProvider>> = Vec::with_capacity(cfg.providers.len());
    for provider in &cfg.providers {
        match provider {
            SearchProviderConfig::Serper(serper) => {
                providers.push(Arc::new(SerperSearch::new(serper)?))
            }
            SearchProviderConfig::Searxng(searxng) => {
                providers.push(Arc::new(SearxngSearch::new(searxng)?))
            }
        }
    }
    match providers.len() {
        0 => bail!("no search provider configured"),
        1 => Ok(providers.remove(0)),
        _ => Ok(Arc::new(FallbackSearch::new(providers))),
    }
}

pub fn build_extractor(cfg: &ExtractorConfig) -> Result<Arc<dyn ContentExtractor>> {
    Ok(Arc::new(HtmlExtractor::new(cfg)?))
}

/// Wire every collaborator the analysis pipeline needs from one config.
pub fn build_services(cfg: &AppConfig) -> Result<PipelineServices> {
    let search = build_search(&cfg.search)?;
    let extractor = build_extractor(&cfg.extractor)?;
    let ai = build_ai(&cfg.ai)?;
    tracing::debug!(
        search = search.name(),
        ai = ai.name(),
        "pipeline services ready"
    );
    Ok(PipelineServices::new(search, extractor, ai))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitchforge_core::api::{OpenAiConfig, SearxngConfig, SerperConfig};

    fn openai(name: &str) -> AiProviderConfig {
        AiProviderConfig::OpenAiCompatible(OpenAiConfig {
            name: name.to_string(),
            base_url: "http://127.0.0.1:9/v1".to_string(),
            api_key: String::new(),
            model: "m".to_string(),
            timeout_ms: 1_000,
            temperature: 0.2,
        })
    }

    #[test]
    fn test_single_provider_is_not_wrapped() {
        let ai = build_ai(&AiConfig {
            providers: vec![openai("primary")],
        })
        .unwrap();
        assert_eq!(ai.name(), "primary");
    }

    #[test]
    fn test_multiple_providers_use_fallback_chain() {
        let search = build_search(&SearchConfig {
            providers: vec![
                SearchProviderConfig::Serper(SerperConfig {
                    endpoint: "http://127.0.0.1:9/search".to_string(),
                    api_key: "k".to_string(),
                    timeout_ms: 1_000,
                    country: None,
                }),
                SearchProviderConfig::Searxng(SearxngConfig {
                    base_url: "http://127.0.0.1:9".to_string(),
                    timeout_ms: 1_000,
                    language: None,
                }),
            ],
        })
        .unwrap();
        assert_eq!(search.name(), "fallback");
    }

    #[test]
    fn test_empty_provider_lists_are_rejected() {
        let err = build_ai(&AiConfig { providers: vec![] }).err().unwrap();
        assert_eq!(err.to_string(), "no ai provider configured");
        let err = build_search(&SearchConfig { providers: vec![] }).err().unwrap();
        assert_eq!(err.to_string(), "no search provider configured");
    }

    #[test]
    fn test_default_config_builds_services() {
        assert!(build_services(&AppConfig::default()).is_ok());
    }
}
