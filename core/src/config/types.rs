use serde::{Deserialize, Serialize};

use crate::executor::ExecutionMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub extractor: ExtractorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_true")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "pitchforge_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            console: true,
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Thresholds and limits of the analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Visiting order of the component tasks.
    pub execution_mode: ExecutionMode,
    /// Minimum total characters extracted during research.
    pub min_content_chars: usize,
    /// Minimum number of distinct pages kept during research.
    pub min_sources: usize,
    /// Minimum average page quality score (0-100).
    pub min_avg_source_quality: f64,
    /// Final report score below which a warning is logged.
    pub quality_threshold: f64,
    pub max_queries: usize,
    pub results_per_query: usize,
    pub extract_per_query: usize,
    /// Pages shorter than this are discarded.
    pub min_page_chars: usize,
    /// Characters of each page kept in the report.
    pub page_excerpt_chars: usize,
    /// Pages (best first) included in the language-model context.
    pub context_pages: usize,
    pub context_page_chars: usize,
    /// Pause between research queries.
    pub query_delay_ms: u64,
    pub prediction_horizon_months: u32,
    pub analysis_max_tokens: u32,
    pub component_max_tokens: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            execution_mode: ExecutionMode::Topological,
            min_content_chars: 5_000,
            min_sources: 3,
            min_avg_source_quality: 60.0,
            quality_threshold: 70.0,
            max_queries: 8,
            results_per_query: 10,
            extract_per_query: 8,
            min_page_chars: 500,
            page_excerpt_chars: 3_000,
            context_pages: 10,
            context_page_chars: 2_000,
            query_delay_ms: 1_000,
            prediction_horizon_months: 36,
            analysis_max_tokens: 8_192,
            component_max_tokens: 2_500,
        }
    }
}

/// Language-model providers, tried in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_providers")]
    pub providers: Vec<AiProviderConfig>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            providers: default_ai_providers(),
        }
    }
}

fn default_ai_providers() -> Vec<AiProviderConfig> {
    vec![AiProviderConfig::OpenAiCompatible(OpenAiConfig::default())]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum AiProviderConfig {
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible(OpenAiConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_name")]
    pub name: String,
    #[serde(default = "default_openai_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_ai_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_openai_name() -> String {
    "openai".to_string()
}

fn default_openai_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_ai_timeout_ms() -> u64 {
    120_000
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            name: default_openai_name(),
            base_url: default_openai_url(),
            api_key: String::new(),
            model: default_openai_model(),
            timeout_ms: default_ai_timeout_ms(),
            temperature: default_temperature(),
        }
    }
}

/// Web search providers, tried in order until one returns hits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_providers")]
    pub providers: Vec<SearchProviderConfig>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            providers: default_search_providers(),
        }
    }
}

fn default_search_providers() -> Vec<SearchProviderConfig> {
    vec![SearchProviderConfig::Serper(SerperConfig::default())]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum SearchProviderConfig {
    #[serde(rename = "serper")]
    Serper(SerperConfig),
    #[serde(rename = "searxng")]
    Searxng(SearxngConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerperConfig {
    #[serde(default = "default_serper_url")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_search_timeout_ms")]
    pub timeout_ms: u64,
    /// Optional country code passed as `gl`.
    #[serde(default)]
    pub country: Option<String>,
}

fn default_serper_url() -> String {
    "https://google.serper.dev/search".to_string()
}

fn default_search_timeout_ms() -> u64 {
    20_000
}

impl Default for SerperConfig {
    fn default() -> Self {
        Self {
            endpoint: default_serper_url(),
            api_key: String::new(),
            timeout_ms: default_search_timeout_ms(),
            country: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearxngConfig {
    pub base_url: String,
    #[serde(default = "default_search_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub timeout_ms: u64,
    pub user_agent: String,
    /// Responses larger than this are truncated before parsing.
    pub max_body_bytes: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            user_agent: "Mozilla/5.0 (compatible; pitchforge/0.4)".to_string(),
            max_body_bytes: 2_000_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.analysis.min_content_chars, 5_000);
        assert_eq!(cfg.analysis.min_sources, 3);
        assert_eq!(cfg.analysis.quality_threshold, 70.0);
        assert_eq!(cfg.analysis.execution_mode, ExecutionMode::Topological);
        assert_eq!(cfg.ai.providers.len(), 1);
        assert!(cfg.logging.console);
    }

    #[test]
    fn test_tagged_providers_parse() {
        let cfg: AppConfig = toml::from_str(
            r#"
[analysis]
execution_mode = "registration_order"
max_queries = 4

[[ai.providers]]
provider = "openai_compatible"
name = "local"
base_url = "http://localhost:11434/v1"
model = "llama3"

[[search.providers]]
provider = "searxng"
base_url = "http://localhost:8888"

[[search.providers]]
provider = "serper"
api_key = "k"
"#,
        )
        .unwrap();

        assert_eq!(cfg.analysis.execution_mode, ExecutionMode::RegistrationOrder);
        assert_eq!(cfg.analysis.max_queries, 4);
        assert_eq!(cfg.analysis.min_sources, 3);

        let AiProviderConfig::OpenAiCompatible(ai) = &cfg.ai.providers[0];
        assert_eq!(ai.name, "local");
        assert_eq!(ai.timeout_ms, 120_000);

        assert!(matches!(cfg.search.providers[0], SearchProviderConfig::Searxng(_)));
        match &cfg.search.providers[1] {
            SearchProviderConfig::Serper(s) => {
                assert_eq!(s.api_key, "k");
                assert_eq!(s.endpoint, "https://google.serper.dev/search");
            }
            other => panic!("unexpected provider {other:?}"),
        }
    }
}
