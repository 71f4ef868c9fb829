//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.realty-insight.toml` files. Nothing here is process-global: the loaded
//! [`Config`] is handed to the analyzer at construction.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".realty-insight.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Language model settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Dataset loading settings.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Table projection settings.
    #[serde(default)]
    pub table: TableConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default report path; stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Settings for the OpenAI-compatible chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Master switch for both language-model calls.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the chat completions API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// API key. Usually supplied through `OPENAI_API_KEY` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Temperature for area resolution.
    #[serde(default)]
    pub resolve_temperature: f32,

    /// Temperature for summary generation.
    #[serde(default = "default_summary_temperature")]
    pub summary_temperature: f32,

    /// Token cap for summaries.
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,

    /// Upper bound for each call, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            resolve_temperature: 0.0,
            summary_temperature: default_summary_temperature(),
            summary_max_tokens: default_summary_max_tokens(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl LlmConfig {
    /// True when calls should be attempted: enabled and a key is present.
    pub fn is_active(&self) -> bool {
        self.enabled
            && self
                .api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_summary_temperature() -> f32 {
    0.7
}

fn default_summary_max_tokens() -> u32 {
    200
}

fn default_timeout() -> u64 {
    30
}

/// Dataset loading settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Source header (lower-cased) → canonical column name.
    #[serde(default = "default_column_aliases")]
    pub column_aliases: BTreeMap<String, String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            column_aliases: default_column_aliases(),
        }
    }
}

fn default_column_aliases() -> BTreeMap<String, String> {
    [
        ("final location", "area"),
        ("year", "year"),
        ("flat - weighted average rate", "price"),
        ("total units", "demand"),
        ("total carpet area supplied (sqft)", "size"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Table projection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Maximum rows returned in the table.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
        }
    }
}

fn default_max_rows() -> usize {
    crate::analysis::DEFAULT_MAX_ROWS
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.llm.model = model.clone();
        }
        if let Some(ref url) = args.api_url {
            self.llm.base_url = url.clone();
        }
        if let Some(ref key) = args.api_key {
            self.llm.api_key = Some(key.clone());
        }
        if let Some(timeout) = args.timeout {
            self.llm.timeout_seconds = timeout;
        }
        if args.no_llm {
            self.llm.enabled = false;
        }

        if let Some(max_rows) = args.max_rows {
            self.table.max_rows = max_rows;
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
