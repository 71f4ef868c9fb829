//! Per-year aggregation into chart series.
//!
//! All areas share one year axis built from the whole dataset, so series
//! line up even when an area has gaps.

use crate::models::{AreaSeries, ChartData, ChartSeries, Dataset};
use crate::numeric::{coerce_numeric_or_none, coerce_year, Mean};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Mean price and demand of one area in one year.
#[derive(Debug, Clone, Copy, Default)]
pub struct YearGroup {
    pub price: Mean,
    pub demand: Mean,
}

/// Sorted distinct years of the whole dataset. Rows without a usable year
/// are skipped.
pub fn year_axis(dataset: &Dataset) -> Vec<i64> {
    dataset
        .rows()
        .iter()
        .filter_map(|r| coerce_year(&r.year))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Groups the rows of `area` by year, in ascending year order.
pub fn group_by_year(dataset: &Dataset, area: &str) -> BTreeMap<i64, YearGroup> {
    let mut groups: BTreeMap<i64, YearGroup> = BTreeMap::new();

    for row in dataset.rows_for_area(area) {
        let Some(year) = coerce_year(&row.year) else {
            continue;
        };
        let group = groups.entry(year).or_default();
        group.price.push(coerce_numeric_or_none(&row.price));
        group.demand.push(coerce_numeric_or_none(&row.demand));
    }

    groups
}

/// Builds price and demand trends for `areas`, in the order given.
///
/// Every area gets a series, even without rows; years an area lacks are 0.0.
pub fn aggregate(dataset: &Dataset, areas: &[String]) -> ChartData {
    let labels = year_axis(dataset);
    let mut price_datasets = Vec::with_capacity(areas.len());
    let mut demand_datasets = Vec::with_capacity(areas.len());

    for area in areas {
        let groups = group_by_year(dataset, area);
        debug!("Area {} has data for {} of {} years", area, groups.len(), labels.len());

        let (prices, demands): (Vec<f64>, Vec<f64>) = labels
            .iter()
            .map(|year| match groups.get(year) {
                Some(g) => (g.price.value_or_zero(), g.demand.value_or_zero()),
                None => (0.0, 0.0),
            })
            .unzip();

        price_datasets.push(AreaSeries {
            area: area.clone(),
            values: prices,
        });
        demand_datasets.push(AreaSeries {
            area: area.clone(),
            values: demands,
        });
    }

    ChartData {
        price_trend: ChartSeries {
            labels: labels.clone(),
            datasets: price_datasets,
        },
        demand_trend: ChartSeries {
            labels,
            datasets: demand_datasets,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, Row};

    fn create_test_dataset() -> Dataset {
        Dataset::new(vec![
            Row::new(2020, "Baner", 100.0, 10, Cell::Null),
            Row::new(2020, "Baner", 200.0, 20, Cell::Null),
            Row::new(2021, "baner", Cell::Null, 30, Cell::Null),
            Row::new(2022, "Aundh", 50.0, Cell::Null, Cell::Null),
            Row::new("2019", "Aundh", "75", "5", Cell::Null),
            Row::new("unknown", "Aundh", 999.0, 999, Cell::Null),
        ])
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_year_axis_spans_whole_dataset() {
        let ds = create_test_dataset();
        assert_eq!(year_axis(&ds), vec![2019, 2020, 2021, 2022]);
    }

    #[test]
    fn test_aggregate_means_and_zero_fill() {
        let ds = create_test_dataset();
        let chart = aggregate(&ds, &names(&["Baner", "Aundh"]));

        assert_eq!(chart.price_trend.labels, vec![2019, 2020, 2021, 2022]);
        assert_eq!(chart.price_trend.datasets[0].area, "Baner");
        assert_eq!(chart.price_trend.datasets[0].values, vec![0.0, 150.0, 0.0, 0.0]);
        assert_eq!(chart.demand_trend.datasets[0].values, vec![0.0, 15.0, 30.0, 0.0]);
        assert_eq!(chart.price_trend.datasets[1].values, vec![75.0, 0.0, 0.0, 50.0]);
        assert_eq!(chart.demand_trend.datasets[1].values, vec![5.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_area_without_rows_is_flat() {
        let ds = create_test_dataset();
        let chart = aggregate(&ds, &names(&["Kothrud"]));

        assert_eq!(chart.price_trend.datasets.len(), 1);
        assert_eq!(chart.price_trend.datasets[0].values, vec![0.0; 4]);
    }

    #[test]
    fn test_shape_and_finiteness() {
        let ds = Dataset::new(vec![
            Row::new(2020, "A", f64::NAN, "x", Cell::Null),
            Row::new(2021.7, "A", f64::INFINITY, Cell::Null, Cell::Null),
            Row::new(Cell::Null, "B", 1.0, 1, Cell::Null),
        ]);
        let areas = names(&["A", "B", "C"]);
        let chart = aggregate(&ds, &areas);

        for series in [&chart.price_trend, &chart.demand_trend] {
            assert_eq!(series.datasets.len(), areas.len());
            for entry in &series.datasets {
                assert_eq!(entry.values.len(), series.labels.len());
                assert!(entry.values.iter().all(|v| v.is_finite()));
            }
        }
        assert_eq!(chart.price_trend.labels, vec![2020, 2021]);
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let ds = create_test_dataset();
        let areas = names(&["Aundh", "Baner"]);
        assert_eq!(aggregate(&ds, &areas), aggregate(&ds, &areas));
    }

    #[test]
    fn test_empty_inputs() {
        let chart = aggregate(&Dataset::default(), &[]);
        assert!(chart.price_trend.labels.is_empty());
        assert!(chart.demand_trend.datasets.is_empty());
    }
}
