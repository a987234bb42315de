//! Runtime settings.
//!
//! Resolution order: CLI flag > environment variable (a `.env` file is
//! loaded first) > built-in default.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_API_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";
pub const DEFAULT_MODEL: &str = "google/gemini-flash-1.5";
pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const MODEL_ENV_VAR: &str = "MEAL_PLANNER_MODEL";
const ENDPOINT_ENV_VAR: &str = "MEAL_PLANNER_API_URL";
const DATA_DIR_ENV_VAR: &str = "MEAL_PLANNER_DATA_DIR";
const TIMEOUT_ENV_VAR: &str = "MEAL_PLANNER_TIMEOUT_SECS";
const CACHE_CAPACITY_ENV_VAR: &str = "MEAL_PLANNER_CACHE_CAPACITY";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Name of the environment variable holding the model credential. The
    /// value itself is read at call time so a missing key only affects
    /// suggestions.
    pub api_key_env_var: String,
    pub model: String,
    pub endpoint: String,
    pub site_url: String,
    pub app_name: String,
    pub timeout: Duration,
    pub data_dir: PathBuf,
    pub cache_capacity: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key_env_var: DEFAULT_API_KEY_ENV_VAR.to_string(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            site_url: "http://localhost:3000".to_string(),
            app_name: "MealPlanner".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            data_dir: default_data_dir(),
            cache_capacity: None,
        }
    }
}

/// `$XDG_DATA_HOME/meal-planner` or the platform data dir, falling back to
/// `./.meal-planner`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("meal-planner"))
        .unwrap_or_else(|| PathBuf::from(".meal-planner"))
}

impl Settings {
    /// Defaults overlaid with whatever the environment provides.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let mut settings = Settings::default();

        if let Ok(model) = env::var(MODEL_ENV_VAR) {
            settings.model = model;
        }
        if let Ok(endpoint) = env::var(ENDPOINT_ENV_VAR) {
            settings.endpoint = endpoint;
        }
        if let Ok(dir) = env::var(DATA_DIR_ENV_VAR) {
            settings.data_dir = PathBuf::from(dir);
        }
        if let Ok(site_url) = env::var("SITE_URL") {
            settings.site_url = site_url;
        }
        if let Ok(app_name) = env::var("APP_NAME") {
            settings.app_name = app_name;
        }
        if let Ok(secs) = env::var(TIMEOUT_ENV_VAR) {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("{TIMEOUT_ENV_VAR} must be a whole number of seconds"))?;
            settings.timeout = Duration::from_secs(secs);
        }
        if let Ok(capacity) = env::var(CACHE_CAPACITY_ENV_VAR) {
            settings.cache_capacity = Some(parse_cache_capacity(&capacity)?);
        }
        Ok(settings)
    }

    /// The credential, if the configured variable is set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        env::var(&self.api_key_env_var)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

fn parse_cache_capacity(raw: &str) -> Result<usize> {
    let capacity: usize = raw
        .trim()
        .parse()
        .with_context(|| format!("{CACHE_CAPACITY_ENV_VAR} must be a positive integer"))?;
    if capacity == 0 {
        bail!("{CACHE_CAPACITY_ENV_VAR} must be a positive integer, got 0");
    }
    Ok(capacity)
}
