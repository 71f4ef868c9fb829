//! Data models for the insight pipeline.
//!
//! This module contains the core data structures shared by every stage:
//! the normalized dataset, resolved queries, chart series, table rows and
//! the combined analysis result.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Intent reported when the query was resolved without the language model.
pub const DEFAULT_INTENT: &str = "analysis";

/// Metrics reported when the query was resolved without the language model.
pub const DEFAULT_METRICS: [&str; 2] = ["price", "demand"];

/// One of the canonical dataset columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Year,
    Area,
    Price,
    Demand,
    Size,
}

impl Column {
    /// All canonical columns in canonical order.
    pub const ALL: [Column; 5] = [
        Column::Year,
        Column::Area,
        Column::Price,
        Column::Demand,
        Column::Size,
    ];

    /// Returns the canonical column name.
    pub fn name(&self) -> &'static str {
        match self {
            Column::Year => "year",
            Column::Area => "area",
            Column::Price => "price",
            Column::Demand => "demand",
            Column::Size => "size",
        }
    }

    /// Looks up a canonical column by its (already normalized) name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A loosely typed table value as produced by the dataset loader.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Timestamp(NaiveDateTime),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Int(n) => write!(f, "{}", n),
            Cell::Float(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Timestamp(ts) => write!(f, "{}", ts.format(crate::numeric::TIMESTAMP_FORMAT)),
        }
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Int(n)
    }
}

impl From<i32> for Cell {
    fn from(n: i32) -> Self {
        Cell::Int(n.into())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Float(n)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Null)
    }
}

/// Case-insensitive area name comparison used by every stage.
pub fn same_area(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// A single normalized dataset row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub year: Cell,
    /// Always present; empty when the source had no value.
    pub area: String,
    pub price: Cell,
    pub demand: Cell,
    pub size: Cell,
}

impl Row {
    pub fn new(
        year: impl Into<Cell>,
        area: impl Into<String>,
        price: impl Into<Cell>,
        demand: impl Into<Cell>,
        size: impl Into<Cell>,
    ) -> Self {
        Self {
            year: year.into(),
            area: area.into(),
            price: price.into(),
            demand: demand.into(),
            size: size.into(),
        }
    }

    /// Returns the value stored under a canonical column.
    pub fn value(&self, column: Column) -> Cow<'_, Cell> {
        match column {
            Column::Year => Cow::Borrowed(&self.year),
            Column::Area => Cow::Owned(Cell::Text(self.area.clone())),
            Column::Price => Cow::Borrowed(&self.price),
            Column::Demand => Cow::Borrowed(&self.demand),
            Column::Size => Cow::Borrowed(&self.size),
        }
    }

    pub fn is_in_area(&self, area: &str) -> bool {
        same_area(&self.area, area)
    }
}

/// An immutable, normalized table with the canonical columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Creates a dataset carrying every canonical column.
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            columns: Column::ALL.to_vec(),
            rows,
        }
    }

    /// Creates a dataset that only carries some canonical columns.
    ///
    /// The `area` column is always kept; columns are stored in canonical order.
    pub fn with_columns(columns: &[Column], rows: Vec<Row>) -> Self {
        let columns = Column::ALL
            .into_iter()
            .filter(|c| *c == Column::Area || columns.contains(c))
            .collect();
        Self { columns, rows }
    }

    /// Present canonical columns, in canonical order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct non-blank area names in order of first appearance.
    pub fn distinct_areas(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.rows
            .iter()
            .filter(|r| !r.area.trim().is_empty())
            .filter(|r| seen.insert(r.area.as_str()))
            .map(|r| r.area.clone())
            .collect()
    }

    /// Distinct non-blank area names, sorted. Used for user feedback.
    pub fn available_areas(&self) -> Vec<String> {
        let mut areas = self.distinct_areas();
        areas.sort();
        areas
    }

    /// Rows whose area matches `area` case-insensitively.
    pub fn rows_for_area<'a>(&'a self, area: &'a str) -> impl Iterator<Item = &'a Row> + 'a {
        self.rows.iter().filter(move |r| r.is_in_area(area))
    }

    pub fn has_rows_for(&self, area: &str) -> bool {
        self.rows_for_area(area).next().is_some()
    }

    /// Keeps rows matching any of `areas`; an empty list keeps everything.
    pub fn filter_areas(&self, areas: &[String]) -> Dataset {
        let rows = if areas.is_empty() {
            self.rows.clone()
        } else {
            self.rows
                .iter()
                .filter(|r| areas.iter().any(|a| r.is_in_area(a)))
                .cloned()
                .collect()
        };
        Dataset {
            columns: self.columns.clone(),
            rows,
        }
    }
}

/// Areas picked out of a query, tagged with how trustworthy they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "areas", rename_all = "lowercase")]
pub enum AreaMatch {
    /// Every area exists in the dataset.
    Verified(Vec<String>),
    /// A best-effort token from the query; may not exist in the dataset.
    Guessed(Vec<String>),
}

impl AreaMatch {
    pub fn areas(&self) -> &[String] {
        match self {
            AreaMatch::Verified(areas) | AreaMatch::Guessed(areas) => areas,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, AreaMatch::Verified(_))
    }

    pub fn is_empty(&self) -> bool {
        self.areas().is_empty()
    }
}

/// What the query asks about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedQuery {
    pub areas: AreaMatch,
    pub intent: String,
    pub metrics: Vec<String>,
}

impl ResolvedQuery {
    /// Wraps a heuristic match with the generic intent and default metrics.
    pub fn from_heuristic(areas: AreaMatch) -> Self {
        Self {
            areas,
            intent: DEFAULT_INTENT.to_string(),
            metrics: DEFAULT_METRICS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Which resolver produced the areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionSource {
    Model,
    Heuristic,
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionSource::Model => write!(f, "language model"),
            ResolutionSource::Heuristic => write!(f, "keyword match"),
        }
    }
}

/// Values of one area, aligned to the series labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSeries {
    pub area: String,
    pub values: Vec<f64>,
}

/// One metric over a shared year axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Strictly increasing years.
    pub labels: Vec<i64>,
    pub datasets: Vec<AreaSeries>,
}

/// Chart-ready output: price and demand trends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub price_trend: ChartSeries,
    pub demand_trend: ChartSeries,
}

/// A sanitized row keyed by canonical column name, in canonical order.
pub type TableRow = serde_json::Map<String, serde_json::Value>;

/// How the areas of an analysis were obtained. Not part of the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionInfo {
    pub source: ResolutionSource,
    pub intent: String,
    pub metrics: Vec<String>,
}

/// The combined result of a successful analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub areas_detected: Vec<String>,
    pub chart: ChartData,
    pub table: Vec<TableRow>,
    #[serde(skip)]
    pub resolution: ResolutionInfo,
}

/// No area could be resolved from the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoMatch {
    pub available_areas: Vec<String>,
    /// The heuristic token that was tried, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unverified_guess: Option<String>,
}

/// Outcome of [`crate::pipeline::Analyzer::analyze`].
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    Complete(AnalysisResult),
    NoMatch(NoMatch),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Row::new(2020, "Wakad", 100.0, 5, Cell::Null),
            Row::new(2020, "Baner", 120.0, 7, Cell::Null),
            Row::new(2021, "wakad", 110.0, 6, Cell::Null),
            Row::new(2021, "  ", 90.0, 1, Cell::Null),
        ])
    }

    #[test]
    fn test_distinct_areas_first_appearance() {
        let ds = sample();
        assert_eq!(ds.distinct_areas(), vec!["Wakad", "Baner", "wakad"]);
    }

    #[test]
    fn test_available_areas_sorted() {
        let ds = sample();
        assert_eq!(ds.available_areas(), vec!["Baner", "Wakad", "wakad"]);
    }

    #[test]
    fn test_rows_for_area_case_insensitive() {
        let ds = sample();
        assert_eq!(ds.rows_for_area("WAKAD").count(), 2);
        assert!(!ds.has_rows_for("Aundh"));
    }

    #[test]
    fn test_filter_areas() {
        let ds = sample();
        assert_eq!(ds.filter_areas(&["baner".to_string()]).len(), 1);
        assert_eq!(ds.filter_areas(&[]).len(), 4);
    }

    #[test]
    fn test_with_columns_keeps_area_and_canonical_order() {
        let ds = Dataset::with_columns(&[Column::Price, Column::Year], vec![]);
        assert_eq!(ds.columns(), &[Column::Year, Column::Area, Column::Price]);
    }

    #[test]
    fn test_area_match_serialization() {
        let m = AreaMatch::Guessed(vec!["xyz".to_string()]);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"kind":"guessed","areas":["xyz"]}"#);
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Null.to_string(), "");
        assert_eq!(Cell::Float(1.5).to_string(), "1.5");
        assert_eq!(Cell::from(Some(3i64)).to_string(), "3");

        let ts = chrono::NaiveDate::from_ymd_opt(2021, 6, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(Cell::Timestamp(ts).to_string(), "2021-06-01 08:30:00");
    }
}
