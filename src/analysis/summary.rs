//! Narrative summaries.
//!
//! The language model writes the summary when one is configured. Otherwise,
//! or when it fails, a statistical summary of the first resolved area is
//! produced. That path has a textual answer for every data problem and
//! cannot fail.

use crate::analysis::aggregator::group_by_year;
use crate::error::ServiceError;
use crate::llm::{with_timeout, SummaryGenerationService, SummaryRequest};
use crate::models::Dataset;
use crate::numeric::{coerce_numeric_or_none, coerce_year, Mean};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Direction of prices between the first and last grouped year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrend {
    Increasing,
    Decreasing,
}

/// Statistics bundle sent to the summary service for one area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaStatistics {
    pub area: String,
    /// `"first-last"` grouped year.
    pub year_range: String,
    pub avg_price: f64,
    pub price_trend: PriceTrend,
    pub avg_demand: f64,
}

/// Per-area statistics over years that have both a price and a demand mean.
///
/// Areas without any such year are left out.
pub fn area_statistics(dataset: &Dataset, areas: &[String]) -> Vec<AreaStatistics> {
    areas
        .iter()
        .filter_map(|area| {
            let years: Vec<(i64, f64, f64)> = group_by_year(dataset, area)
                .into_iter()
                .filter_map(|(year, g)| Some((year, g.price.value()?, g.demand.value()?)))
                .collect();

            let (first, last) = (years.first()?, years.last()?);

            let mut avg_price = Mean::default();
            let mut avg_demand = Mean::default();
            for (_, price, demand) in &years {
                avg_price.push(Some(*price));
                avg_demand.push(Some(*demand));
            }

            Some(AreaStatistics {
                area: area.clone(),
                year_range: format!("{}-{}", first.0, last.0),
                avg_price: avg_price.value_or_zero(),
                price_trend: if last.1 > first.1 {
                    PriceTrend::Increasing
                } else {
                    PriceTrend::Decreasing
                },
                avg_demand: avg_demand.value_or_zero(),
            })
        })
        .collect()
}

/// Asks the summary service for a 2-3 sentence analysis.
pub async fn generate_model_summary(
    service: &dyn SummaryGenerationService,
    query: &str,
    dataset: &Dataset,
    areas: &[String],
    timeout: Duration,
) -> Result<String, ServiceError> {
    let statistics = area_statistics(dataset, areas);
    if statistics.is_empty() {
        return Err(ServiceError::NothingToSummarize);
    }
    debug!("Summarizing statistics for {} areas", statistics.len());

    let request = SummaryRequest {
        query: query.to_string(),
        areas: areas.to_vec(),
        statistics,
    };

    with_timeout(timeout, service.generate_summary(&request)).await
}

/// Model summary when available, statistical summary otherwise.
pub async fn summarize(
    service: Option<&dyn SummaryGenerationService>,
    query: &str,
    dataset: &Dataset,
    areas: &[String],
    timeout: Duration,
) -> String {
    if let Some(service) = service {
        match generate_model_summary(service, query, dataset, areas, timeout).await {
            Ok(summary) => return summary,
            Err(e) => warn!("Model summary failed, using statistical summary: {}", e),
        }
    }

    generate_fallback_summary(dataset, areas)
}

/// Deterministic price-trend summary of the first area in `areas`.
pub fn generate_fallback_summary(dataset: &Dataset, areas: &[String]) -> String {
    let Some(area) = areas.first() else {
        return "No area detected in query.".to_string();
    };

    let rows: Vec<_> = dataset.rows_for_area(area).collect();
    if rows.is_empty() {
        return format!("No data found for area: {}", area);
    }

    let valid: Vec<(i64, f64)> = rows
        .iter()
        .filter_map(|r| Some((coerce_year(&r.year)?, coerce_numeric_or_none(&r.price)?)))
        .collect();
    if valid.is_empty() {
        return format!("Not enough valid price data for {}.", area);
    }

    let mut by_year: BTreeMap<i64, Mean> = BTreeMap::new();
    for (year, price) in valid {
        by_year.entry(year).or_default().push(Some(price));
    }
    let grouped: Vec<(i64, f64)> = by_year
        .into_iter()
        .filter_map(|(year, mean)| Some((year, mean.value()?)))
        .collect();
    if grouped.is_empty() {
        return format!("No price trend data available for {}.", area);
    }

    let (Some(&(first_year, first_price)), Some(&(last_year, last_price))) =
        (grouped.first(), grouped.last())
    else {
        return format!(
            "Could not compute summary for {} due to invalid numeric values.",
            area
        );
    };

    if first_price == 0.0 || first_price.is_nan() || last_price.is_nan() {
        return format!("Price data for {} is incomplete for trend analysis.", area);
    }

    let pct_change = (last_price - first_price) / first_price * 100.0;
    let trend = if pct_change > 0.0 {
        "increased"
    } else if pct_change < 0.0 {
        "decreased"
    } else {
        "remained stable"
    };

    let Some((pct, latest)) = display_values(pct_change, last_price) else {
        return format!("{} price trend shows inconsistent numeric values.", area);
    };

    format!(
        "Analysis for {}: Prices have {} by {:.1}% from {} to {}. Latest average price: {}.",
        area, trend, pct, first_year, last_year, latest
    )
}

/// Percent magnitude and last price rounded for display, if representable.
fn display_values(pct_change: f64, last_price: f64) -> Option<(f64, i64)> {
    if !pct_change.is_finite() || !last_price.is_finite() {
        return None;
    }

    let latest = last_price.round_ties_even();
    if latest < i64::MIN as f64 || latest >= i64::MAX as f64 {
        return None;
    }

    Some((pct_change.abs(), latest as i64))
}
