//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Realty Insight - ask questions about real-estate datasets
///
/// Resolves the areas named in a free-text question, aggregates price and
/// demand trends per year, and writes a summary with chart and table data.
/// Uses an OpenAI-compatible model when an API key is available and falls
/// back to keyword matching and statistical summaries otherwise.
///
/// Examples:
///   realty-insight --data sample.xlsx --query "Compare Baner and Aundh"
///   realty-insight --data sample.csv --query "Wakad prices" --format json
///   realty-insight --data sample.xlsx --query "Baner" --export baner.csv --no-llm
///   realty-insight --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Dataset to analyze (.csv, .xlsx, .xls, .xlsm, .xlsb, .ods)
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub data: Option<PathBuf>,

    /// Free-text question about one or more areas
    #[arg(long, value_name = "TEXT", required_unless_present = "init_config")]
    pub query: Option<String>,

    /// Output format (markdown, json)
    #[arg(short, long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also write the rows matching the query to this CSV file
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Never call the language model
    #[arg(long)]
    pub no_llm: bool,

    /// Chat model name
    ///
    /// Overrides the [llm] model setting of the config file.
    #[arg(short, long, env = "REALTY_INSIGHT_MODEL")]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, value_name = "URL", env = "REALTY_INSIGHT_API_URL")]
    pub api_url: Option<String>,

    /// API key for the language model
    #[arg(long, value_name = "KEY", env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Per-call timeout for the language model, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum number of table rows in the result
    #[arg(long, value_name = "COUNT")]
    pub max_rows: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .realty-insight.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .realty-insight.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        match self.query.as_deref() {
            Some(q) if !q.trim().is_empty() => {}
            _ => return Err("Query must not be empty".to_string()),
        }

        match self.data {
            Some(ref path) if !path.is_file() => {
                return Err(format!("Dataset file does not exist: {}", path.display()));
            }
            None => return Err("A dataset file is required (--data)".to_string()),
            _ => {}
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.max_rows == Some(0) {
            return Err("Max rows must be at least 1".to_string());
        }

        if let Some(ref export) = self.export {
            let is_csv = export
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if !is_csv {
                return Err("Export file must have a .csv extension".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// The query text, empty before validation.
    pub fn query_text(&self) -> &str {
        self.query.as_deref().unwrap_or("")
    }
}
