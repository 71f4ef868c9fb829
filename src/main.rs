//! Realty Insight - answer questions about real-estate datasets
//!
//! A CLI that resolves the areas named in a question, aggregates price and
//! demand per year, and renders a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, dataset, schema, I/O)
//!   2 - No matching area found in the dataset

use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use realty_insight::cli::{Args, OutputFormat};
use realty_insight::config::{Config, CONFIG_FILE_NAME};
use realty_insight::models::Analysis;
use realty_insight::report::{self, ReportMetadata};
use realty_insight::{dataset, filter_for_export, Analyzer};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // No logging needed for --init-config
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("Realty Insight v{}", env!("CARGO_PKG_VERSION"));

    match run_analysis(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .realty-insight.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the model, column aliases and table size.");
    Ok(())
}

/// Logs go to stderr so stdout can carry the report. RUST_LOG wins over
/// the verbosity flags.
fn init_logging(args: &Args) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete analysis. Returns exit code (0 or 2).
async fn run_analysis(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let data_path = args.data.clone().context("A dataset file is required")?;
    let query = args.query_text().to_string();

    // Step 1: Load the dataset
    let dataset = dataset::load_dataset(&data_path, &config.dataset.column_aliases)
        .with_context(|| format!("Failed to load dataset {}", data_path.display()))?;

    // Step 2: Build the analyzer
    let analyzer =
        Analyzer::from_config(&config).context("Failed to initialize the language model")?;
    let model = analyzer.uses_model().then(|| config.llm.model.clone());
    match model {
        Some(ref name) => info!("Using language model {} at {}", name, config.llm.base_url),
        None => info!("Language model disabled, using keyword match and statistics"),
    }

    let output_path = config.general.output.as_ref().map(PathBuf::from);
    let json_to_stdout = args.format == OutputFormat::Json && output_path.is_none();

    // Step 3: Analyze
    let spinner = (!args.quiet && !json_to_stdout).then(start_spinner);
    let analysis = analyzer.analyze(&query, &dataset).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    // Step 4: Render
    let metadata = ReportMetadata {
        query: query.clone(),
        dataset: data_path.display().to_string(),
        dataset_rows: dataset.len(),
        generated_at: Utc::now(),
        model,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let content = match args.format {
        OutputFormat::Json => report::generate_json_report(&analysis)?,
        OutputFormat::Markdown => report::generate_markdown_report(&analysis, &metadata),
    };

    match output_path {
        Some(ref path) => {
            report::write_report(&content, path)?;
            info!("Report saved to {}", path.display());
        }
        None => println!("{}", content),
    }

    // Step 5: Optional export of the matching rows
    if let Some(ref export_path) = args.export {
        let rows = filter_for_export(&query, &dataset);
        report::write_csv(&rows, export_path)?;
    }

    match analysis {
        Analysis::Complete(result) => {
            info!(
                "Analysis complete for {} in {:.1}s",
                result.areas_detected.join(", "),
                start_time.elapsed().as_secs_f64()
            );
            Ok(0)
        }
        Analysis::NoMatch(_) => {
            warn!("No matching area found (exit code 2)");
            Ok(2)
        }
    }
}

fn start_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message("Analyzing query...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
