mod load;
mod types;

pub use load::{
    apply_env_overrides, get_data_dir, load_default, load_from, ENV_AI_API_KEY, ENV_AI_BASE_URL,
    ENV_AI_MODEL, ENV_SEARCH_API_KEY, ENV_SEARCH_ENDPOINT,
};
pub use types::*;
