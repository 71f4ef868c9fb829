//! Row-level table projection for display.

use crate::models::{Dataset, TableRow};
use crate::numeric::sanitize_cell;

/// Default cap on projected rows.
pub const DEFAULT_MAX_ROWS: usize = 100;

/// Returns up to `max_rows` sanitized rows belonging to `areas`.
///
/// An empty `areas` list selects the whole dataset. Dataset order is kept
/// and only the canonical columns present in the dataset are emitted.
pub fn project(dataset: &Dataset, areas: &[String], max_rows: usize) -> Vec<TableRow> {
    dataset
        .rows()
        .iter()
        .filter(|row| areas.is_empty() || areas.iter().any(|a| row.is_in_area(a)))
        .take(max_rows)
        .map(|row| {
            dataset
                .columns()
                .iter()
                .map(|column| (column.name().to_string(), sanitize_cell(&row.value(*column))))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, Column, Row};
    use serde_json::{json, Value};

    fn rows_for(area: &str, n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| Row::new(2000 + i as i64, area, 100.0 + i as f64, 1, 500.0))
            .collect()
    }

    #[test]
    fn test_filters_case_insensitively_in_dataset_order() {
        let ds = Dataset::new(vec![
            Row::new(2021, "Baner", 1.0, 1, Cell::Null),
            Row::new(2020, "Aundh", 2.0, 2, Cell::Null),
            Row::new(2019, "BANER", 3.0, 3, Cell::Null),
        ]);

        let table = project(&ds, &["baner".to_string()], DEFAULT_MAX_ROWS);
        assert_eq!(table.len(), 2);
        assert_eq!(table[0]["year"], json!(2021));
        assert_eq!(table[1]["area"], json!("BANER"));
    }

    #[test]
    fn test_sanitizes_cells_and_keeps_column_order() {
        let ds = Dataset::new(vec![Row::new(2020.0, "Baner", f64::NAN, 12.5, "n/a")]);
        let table = project(&ds, &[], DEFAULT_MAX_ROWS);

        let keys: Vec<&String> = table[0].keys().collect();
        assert_eq!(keys, vec!["year", "area", "price", "demand", "size"]);
        assert_eq!(table[0]["year"], json!(2020));
        assert_eq!(table[0]["price"], Value::Null);
        assert_eq!(table[0]["demand"], json!(12.5));
        assert_eq!(table[0]["size"], json!("n/a"));
    }

    #[test]
    fn test_only_present_columns() {
        let ds = Dataset::with_columns(
            &[Column::Year, Column::Price],
            vec![Row::new(2020, "Baner", 5.0, 9, 9)],
        );
        let table = project(&ds, &[], DEFAULT_MAX_ROWS);
        assert_eq!(table[0].len(), 3);
        assert!(!table[0].contains_key("demand"));
    }

    #[test]
    fn test_truncates_to_max_rows() {
        let mut rows = rows_for("Baner", 150);
        rows.extend(rows_for("Aundh", 10));
        let ds = Dataset::new(rows);

        let table = project(&ds, &["Baner".to_string()], DEFAULT_MAX_ROWS);
        assert_eq!(table.len(), 100);
        assert_eq!(table[99]["year"], json!(2099));
    }

    #[test]
    fn test_projection_is_idempotent() {
        let ds = Dataset::new(rows_for("Baner", 5));
        let areas = vec!["Baner".to_string()];
        assert_eq!(project(&ds, &areas, 3), project(&ds, &areas, 3));
    }
}
