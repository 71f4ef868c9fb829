//! Markdown and JSON rendering of an analysis.

use crate::models::{Analysis, AnalysisResult, ChartSeries, NoMatch, TableRow};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::path::Path;

/// Message used for a query that names no known area.
pub const NO_MATCH_MESSAGE: &str = "No matching area found in dataset.";

/// Context printed in the report header.
#[derive(Debug, Clone)]
pub struct ReportMetadata {
    pub query: String,
    pub dataset: String,
    pub dataset_rows: usize,
    pub generated_at: DateTime<Utc>,
    /// Model name when the language model was enabled.
    pub model: Option<String>,
    pub duration_seconds: f64,
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(analysis: &Analysis, metadata: &ReportMetadata) -> String {
    let mut output = String::new();

    output.push_str("# Realty Insight Report\n\n");
    output.push_str(&generate_metadata_section(metadata));

    match analysis {
        Analysis::Complete(result) => {
            output.push_str(&generate_resolution_section(result));
            output.push_str(&generate_summary_section(&result.summary));
            output.push_str(&generate_trend_section("Price Trend", &result.chart.price_trend));
            output.push_str(&generate_trend_section("Demand Trend", &result.chart.demand_trend));
            output.push_str(&generate_table_section(&result.table));
        }
        Analysis::NoMatch(no_match) => {
            output.push_str(&generate_no_match_section(no_match));
        }
    }

    output.push_str(&generate_footer());
    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Query\n\n");
    section.push_str(&format!("- **Question:** {}\n", metadata.query));
    section.push_str(&format!(
        "- **Dataset:** `{}` ({} rows)\n",
        metadata.dataset, metadata.dataset_rows
    ));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    match &metadata.model {
        Some(model) => section.push_str(&format!("- **Language Model:** `{}`\n", model)),
        None => section.push_str("- **Language Model:** disabled\n"),
    }
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_resolution_section(result: &AnalysisResult) -> String {
    let info = &result.resolution;
    let mut section = String::new();

    section.push_str("## Resolution\n\n");
    section.push_str(&format!(
        "- **Areas:** {}\n",
        result.areas_detected.join(", ")
    ));
    section.push_str(&format!("- **Resolved By:** {}\n", info.source));
    section.push_str(&format!("- **Intent:** {}\n", info.intent));
    section.push_str(&format!("- **Metrics:** {}\n", info.metrics.join(", ")));
    section.push('\n');

    section
}

fn generate_summary_section(summary: &str) -> String {
    format!("## Summary\n\n{}\n\n", summary)
}

/// One row per year, one column per area.
fn generate_trend_section(title: &str, series: &ChartSeries) -> String {
    let mut section = format!("## {}\n\n", title);

    if series.labels.is_empty() {
        section.push_str("_No data._\n\n");
        return section;
    }

    section.push_str("| Year |");
    for dataset in &series.datasets {
        section.push_str(&format!(" {} |", escape_cell(&dataset.area)));
    }
    section.push_str("\n|:---|");
    section.push_str(&"---:|".repeat(series.datasets.len()));
    section.push('\n');

    for (i, year) in series.labels.iter().enumerate() {
        section.push_str(&format!("| {} |", year));
        for dataset in &series.datasets {
            let value = dataset.values.get(i).copied().unwrap_or(0.0);
            section.push_str(&format!(" {} |", format_number(value)));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

fn generate_table_section(table: &[TableRow]) -> String {
    let mut section = format!("## Data ({} rows)\n\n", table.len());

    let Some(first) = table.first() else {
        section.push_str("_No rows._\n\n");
        return section;
    };

    let columns: Vec<&String> = first.keys().collect();
    section.push('|');
    for column in &columns {
        section.push_str(&format!(" {} |", column));
    }
    section.push_str("\n|");
    section.push_str(&":---|".repeat(columns.len()));
    section.push('\n');

    for row in table {
        section.push('|');
        for column in &columns {
            let text = row.get(*column).map(value_text).unwrap_or_default();
            section.push_str(&format!(" {} |", escape_cell(&text)));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

fn generate_no_match_section(no_match: &NoMatch) -> String {
    let mut section = String::new();

    section.push_str("## No Matching Area\n\n");
    section.push_str(NO_MATCH_MESSAGE);
    section.push_str("\n\n");
    if let Some(guess) = &no_match.unverified_guess {
        section.push_str(&format!(
            "`{}` was tried but does not name an area in the dataset.\n\n",
            guess
        ));
    }

    section.push_str("### Available Areas\n\n");
    for area in &no_match.available_areas {
        section.push_str(&format!("- {}\n", area));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by realty-insight v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Whole numbers without decimals, everything else with two.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Generate the JSON payload: the four result fields, or the no-match error.
pub fn generate_json_report(analysis: &Analysis) -> Result<String> {
    let value = match analysis {
        Analysis::Complete(result) => serde_json::to_value(result)?,
        Analysis::NoMatch(no_match) => json!({
            "error": NO_MATCH_MESSAGE,
            "available_areas": no_match.available_areas,
        }),
    };
    serde_json::to_string_pretty(&value).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
