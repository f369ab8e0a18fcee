//! romplan configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main romplan configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Text-generation backend
    pub llm: LlmConfig,

    /// Pipeline tuning
    pub pipeline: PipelineConfig,

    /// Request store location
    pub storage: StorageConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        let pipeline = &self.pipeline;
        if !(2..=3).contains(&pipeline.template_count) {
            return Err(eyre::eyre!(
                "pipeline.template-count must be 2 or 3 (got {})",
                pipeline.template_count
            ));
        }
        if !(3..=5).contains(&pipeline.trend_count) {
            return Err(eyre::eyre!(
                "pipeline.trend-count must be between 3 and 5 (got {})",
                pipeline.trend_count
            ));
        }
        if !(4..=5).contains(&pipeline.keywords.limit) {
            return Err(eyre::eyre!(
                "pipeline.keywords.limit must be 4 or 5 (got {})",
                pipeline.keywords.limit
            ));
        }
        if pipeline.keywords.defaults.is_empty() {
            return Err(eyre::eyre!("pipeline.keywords.defaults must not be empty"));
        }
        if pipeline.deadline_ms == 0 {
            return Err(eyre::eyre!("pipeline.deadline-ms must be greater than zero"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .romplan.yml
        let local_config = PathBuf::from(".romplan.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/romplan/romplan.yml
        if let Some(user_config) = user_config_path() {
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed; the full load reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates: Vec<PathBuf> = match config_path {
            Some(path) => vec![path.clone()],
            None => std::iter::once(PathBuf::from(".romplan.yml"))
                .chain(user_config_path())
                .collect(),
        };

        candidates
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("romplan").join("romplan.yml"))
}

/// Text-generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("huggingface" or "openai")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// HTTP request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env).map_err(|_| {
            eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.api_key_env
            )
        })
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "huggingface".to_string(),
            model: "microsoft/DialoGPT-medium".to_string(),
            api_key_env: "HUGGING_FACE_TOKEN".to_string(),
            base_url: "https://api-inference.huggingface.co".to_string(),
            timeout_ms: 60_000,
        }
    }
}

/// Pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Example plans requested for few-shot context
    #[serde(rename = "template-count")]
    pub template_count: usize,

    /// Trend snippets requested for prompt context
    #[serde(rename = "trend-count")]
    pub trend_count: usize,

    /// Generation bound for the plan call
    #[serde(rename = "plan-max-tokens")]
    pub plan_max_tokens: u32,

    /// Generation bound for the template call
    #[serde(rename = "template-max-tokens")]
    pub template_max_tokens: u32,

    /// Generation bound for the trend call
    #[serde(rename = "trend-max-tokens")]
    pub trend_max_tokens: u32,

    /// Extra attempts for the plan call after a transient backend failure
    pub retries: u32,

    /// Pause before each retry in milliseconds
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Deadline for every backend call in milliseconds
    #[serde(rename = "deadline-ms")]
    pub deadline_ms: u64,

    /// Directory with `.pmt` overrides for the embedded prompts
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: Option<PathBuf>,

    /// How trend keywords are derived from the need text
    pub keywords: KeywordPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            template_count: 2,
            trend_count: 3,
            plan_max_tokens: 500,
            template_max_tokens: 300,
            trend_max_tokens: 200,
            retries: 1,
            retry_backoff_ms: 500,
            deadline_ms: 60_000,
            prompts_dir: None,
            keywords: KeywordPolicy::default(),
        }
    }
}

/// Keyword derivation policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordPolicy {
    /// Distinct tokens kept, in first-seen order
    pub limit: usize,

    /// Used when the need text yields no usable tokens
    pub defaults: Vec<String>,

    /// When non-empty, need text without any of these terms gets the defaults
    pub focus: Vec<String>,
}

impl Default for KeywordPolicy {
    fn default() -> Self {
        Self {
            limit: 4,
            defaults: vec!["growth".to_string(), "b2b".to_string()],
            focus: vec![],
        }
    }
}

/// Request store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file
    #[serde(rename = "db-path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/romplan on Linux)
        let db_path = dirs::data_dir()
            .map(|d| d.join("romplan"))
            .unwrap_or_else(|| PathBuf::from(".romplan"))
            .join("requests.db");

        Self { db_path }
    }
}
