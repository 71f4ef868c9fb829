//! Dataset loading and header normalization.
//!
//! Produces the immutable [`Dataset`] the pipeline works on. The schema
//! check happens here so the analysis stages can assume every canonical
//! column exists.

pub mod loader;

pub use loader::{parse_cell, RawTable};

use crate::error::DatasetError;
use crate::models::{Cell, Column, Dataset, Row};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// Loads `path` and maps its headers through `aliases`.
///
/// The reader is chosen by file extension.
pub fn load_dataset(
    path: &Path,
    aliases: &BTreeMap<String, String>,
) -> Result<Dataset, DatasetError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let raw = match extension.as_str() {
        "csv" => loader::read_csv(path)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => loader::read_spreadsheet(path)?,
        other => {
            return Err(DatasetError::UnsupportedFormat(if other.is_empty() {
                path.display().to_string()
            } else {
                format!(".{}", other)
            }))
        }
    };

    let dataset = normalize(raw, aliases)?;
    info!(
        "Loaded {} rows across {} areas from {}",
        dataset.len(),
        dataset.distinct_areas().len(),
        path.display()
    );
    Ok(dataset)
}

/// Trimmed, lower-cased header.
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Applies header mapping, the schema check and row construction.
pub fn normalize(raw: RawTable, aliases: &BTreeMap<String, String>) -> Result<Dataset, DatasetError> {
    let aliases: HashMap<String, String> = aliases
        .iter()
        .map(|(from, to)| (normalize_header(from), normalize_header(to)))
        .collect();

    let headers: Vec<String> = raw
        .headers
        .iter()
        .map(|h| {
            let h = normalize_header(h);
            aliases.get(&h).cloned().unwrap_or(h)
        })
        .collect();
    debug!("Mapped headers: {:?}", headers);

    let missing: Vec<String> = Column::ALL
        .iter()
        .filter(|c| !headers.iter().any(|h| h == c.name()))
        .map(|c| c.name().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DatasetError::MissingColumns {
            missing,
            available: headers,
        });
    }

    let index = |column: Column| headers.iter().position(|h| h == column.name());
    let cell_at = |cells: &[Cell], column: Column| {
        index(column)
            .and_then(|i| cells.get(i))
            .cloned()
            .unwrap_or_default()
    };

    let rows = raw
        .rows
        .iter()
        .map(|cells| Row {
            year: cell_at(cells, Column::Year),
            area: area_text(cell_at(cells, Column::Area)),
            price: cell_at(cells, Column::Price),
            demand: cell_at(cells, Column::Demand),
            size: cell_at(cells, Column::Size),
        })
        .collect();

    Ok(Dataset::new(rows))
}

fn area_text(cell: Cell) -> String {
    match cell {
        Cell::Null => String::new(),
        Cell::Text(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetConfig;
    use std::fs;

    fn aliases() -> BTreeMap<String, String> {
        DatasetConfig::default().column_aliases
    }

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_loads_csv_with_original_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "sample.CSV",
            "Final Location, Year ,Flat - Weighted Average Rate,Total Units,Total Carpet Area Supplied (sqft)\n\
             Baner,2020,7000,120,95000\n\
             Aundh,2021,n/a,,80000.5\n",
        );

        let ds = load_dataset(&path, &aliases()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.columns(), &Column::ALL);
        assert_eq!(ds.distinct_areas(), vec!["Baner", "Aundh"]);

        let second = &ds.rows()[1];
        assert_eq!(second.year, Cell::Int(2021));
        assert_eq!(second.price, Cell::Text("n/a".to_string()));
        assert_eq!(second.demand, Cell::Null);
        assert_eq!(second.size, Cell::Float(80000.5));
    }

    #[test]
    fn test_canonical_headers_need_no_alias() {
        let raw = RawTable {
            headers: vec!["AREA", "year", "price", "demand", "size"]
                .into_iter()
                .map(String::from)
                .collect(),
            rows: vec![vec![Cell::Int(411045), Cell::Int(2020)]],
        };

        let ds = normalize(raw, &BTreeMap::new()).unwrap();
        let row = &ds.rows()[0];
        assert_eq!(row.area, "411045");
        assert_eq!(row.price, Cell::Null);
    }

    #[test]
    fn test_missing_columns_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "partial.csv", "Year,Final Location\n2020,Baner\n");

        match load_dataset(&path, &aliases()) {
            Err(DatasetError::MissingColumns { missing, available }) => {
                assert_eq!(missing, vec!["price", "demand", "size"]);
                assert_eq!(available, vec!["year", "area"]);
            }
            other => panic!("expected missing columns, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "data.json", "{}");
        assert!(matches!(
            load_dataset(&path, &aliases()),
            Err(DatasetError::UnsupportedFormat(ext)) if ext == ".json"
        ));
    }
}
