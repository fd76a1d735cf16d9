pub mod openai;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use pitchforge_core::api::AiProvider;

pub use openai::OpenAiCompatibleProvider;

/// Tries each provider in order and returns the first non-empty reply.
pub struct FallbackAiProvider {
    providers: Vec<Arc<dyn AiProvider>>,
}

impl FallbackAiProvider {
    pub fn new(providers: Vec<Arc<dyn AiProvider>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl AiProvider for FallbackAiProvider {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let mut last_error = None;
        for provider in &self.providers {
            match provider.generate(prompt, max_tokens).await {
                Ok(reply) if !reply.trim().is_empty() => return Ok(reply),
                Ok(_) => {
                    tracing::warn!(provider = provider.name(), "empty reply, trying next provider");
                    last_error = Some(anyhow!("{}: empty reply", provider.name()));
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "provider failed, trying next");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow!("no ai provider configured")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, Option<&'static str>);

    #[async_trait]
    impl AiProvider for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
            self.1
                .map(str::to_string)
                .ok_or_else(|| anyhow!("{} down", self.0))
        }
    }

    #[tokio::test]
    async fn test_first_healthy_provider_wins() {
        let chain = FallbackAiProvider::new(vec![
            Arc::new(Fixed("a", None)),
            Arc::new(Fixed("b", Some("  "))),
            Arc::new(Fixed("c", Some("answer"))),
        ]);
        assert_eq!(chain.generate("p", 10).await.unwrap(), "answer");
    }

    #[tokio::test]
    async fn test_last_error_is_reported() {
        let chain = FallbackAiProvider::new(vec![Arc::new(Fixed("a", None))]);
        assert_eq!(chain.generate("p", 10).await.unwrap_err().to_string(), "a down");

        let empty = FallbackAiProvider::new(Vec::new());
        assert!(empty.generate("p", 10).await.is_err());
    }
}
