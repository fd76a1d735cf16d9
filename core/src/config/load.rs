use std::path::{Path, PathBuf};

use super::types::{AiProviderConfig, AppConfig, SearchProviderConfig};

pub const ENV_AI_API_KEY: &str = "PITCHFORGE_AI_API_KEY";
pub const ENV_AI_BASE_URL: &str = "PITCHFORGE_AI_BASE_URL";
pub const ENV_AI_MODEL: &str = "PITCHFORGE_AI_MODEL";
pub const ENV_SEARCH_API_KEY: &str = "PITCHFORGE_SEARCH_API_KEY";
pub const ENV_SEARCH_ENDPOINT: &str = "PITCHFORGE_SEARCH_ENDPOINT";

/// Get the default data directory: ~/.pitchforge
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".pitchforge"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.pitchforge/config.toml
    let data_dir = get_data_dir()?;
    let home_config = data_dir.join("config.toml");

    // Priority 2: ./config.toml
    let local_config = Path::new("config.toml");

    let mut cfg = if home_config.exists() {
        read_config(&home_config)?
    } else if local_config.exists() {
        read_config(local_config)?
    } else {
        AppConfig::default()
    };

    if cfg.logging.file
        && cfg
            .logging
            .directory
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .is_empty()
    {
        cfg.logging.directory = Some(data_dir.join("logs").to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

/// Load an explicit config file (`~` is expanded), then apply env overrides.
pub fn load_from(path: &str) -> anyhow::Result<AppConfig> {
    let expanded = shellexpand::tilde(path);
    let mut cfg = read_config(Path::new(expanded.as_ref()))?;
    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

fn read_config(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read {} failed: {e}", path.display()))?;
    toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("parse {} failed: {e}", path.display()))
}

/// Environment overrides (highest priority). They apply to the first
/// configured provider of each kind.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(AiProviderConfig::OpenAiCompatible(ai)) = cfg.ai.providers.first_mut() {
        if let Some(v) = get(ENV_AI_API_KEY) {
            ai.api_key = v;
        }
        if let Some(v) = get(ENV_AI_BASE_URL) {
            ai.base_url = v;
        }
        if let Some(v) = get(ENV_AI_MODEL) {
            ai.model = v;
        }
    }

    match cfg.search.providers.first_mut() {
        Some(SearchProviderConfig::Serper(serper)) => {
            if let Some(v) = get(ENV_SEARCH_API_KEY) {
                serper.api_key = v;
            }
            if let Some(v) = get(ENV_SEARCH_ENDPOINT) {
                serper.endpoint = v;
            }
        }
        Some(SearchProviderConfig::Searxng(searxng)) => {
            if let Some(v) = get(ENV_SEARCH_ENDPOINT) {
                searxng.base_url = v;
            }
        }
        None => {}
    }
}
