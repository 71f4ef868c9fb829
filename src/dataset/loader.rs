//! File readers producing raw, loosely typed tables.

use crate::error::DatasetError;
use crate::models::Cell;
use crate::numeric::TIMESTAMP_FORMAT;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Headers and cells exactly as read, before header mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Reads a comma-separated file with a header line.
pub fn read_csv(path: &Path) -> Result<RawTable, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(parse_cell).collect());
    }

    debug!("Read {} CSV rows from {}", rows.len(), path.display());
    Ok(RawTable { headers, rows })
}

/// Reads the first worksheet of an Excel or OpenDocument workbook.
///
/// The first row holds the headers. Fully empty rows are skipped.
pub fn read_spreadsheet(path: &Path) -> Result<RawTable, DatasetError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| DatasetError::Excel(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(DatasetError::NoWorksheet)?
        .map_err(|e| DatasetError::Excel(e.to_string()))?;

    let mut lines = range.rows();
    let headers = match lines.next() {
        Some(first) => first.iter().map(header_text).collect(),
        None => Vec::new(),
    };

    let rows: Vec<Vec<Cell>> = lines
        .map(|line| line.iter().map(data_to_cell).collect::<Vec<_>>())
        .filter(|cells| cells.iter().any(|c| !c.is_null()))
        .collect();

    debug!("Read {} worksheet rows from {}", rows.len(), path.display());
    Ok(RawTable { headers, rows })
}

/// Types a textual cell: empty, integer, float, boolean, timestamp or text.
pub fn parse_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Cell::Null;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Cell::Int(n);
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        return Cell::Float(n);
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Cell::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Cell::Bool(false);
    }
    if let Some(ts) = parse_timestamp(trimmed) {
        return Cell::Timestamp(ts);
    }
    Cell::Text(raw.to_string())
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn header_text(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Null,
        Data::Int(n) => Cell::Int(*n),
        Data::Float(n) => Cell::Float(*n),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) | Data::DateTimeIso(s) => parse_cell(s),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            excel_serial_to_timestamp(serial)
                .map(Cell::Timestamp)
                .unwrap_or(Cell::Float(serial))
        }
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

/// Converts a 1900-system Excel date serial to a timestamp.
fn excel_serial_to_timestamp(serial: f64) -> Option<NaiveDateTime> {
    let seconds = (serial * 86_400.0).round();
    if !seconds.is_finite() || seconds.abs() > 1e12 {
        return None;
    }

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    epoch.checked_add_signed(TimeDelta::try_seconds(seconds as i64)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_cell_types() {
        assert_eq!(parse_cell(""), Cell::Null);
        assert_eq!(parse_cell("   "), Cell::Null);
        assert_eq!(parse_cell("2021"), Cell::Int(2021));
        assert_eq!(parse_cell(" 12.5 "), Cell::Float(12.5));
        assert_eq!(parse_cell("TRUE"), Cell::Bool(true));
        assert_eq!(parse_cell("Baner"), Cell::Text("Baner".to_string()));
        assert_eq!(
            parse_cell("2021-06-01"),
            Cell::Timestamp(
                NaiveDate::from_ymd_opt(2021, 6, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            )
        );
        assert!(matches!(parse_cell("2021-06-01 10:30:00"), Cell::Timestamp(_)));
    }

    #[test]
    fn test_excel_serial_conversion() {
        let ts = excel_serial_to_timestamp(45000.5).unwrap();
        assert_eq!(ts.to_string(), "2023-03-15 12:00:00");
        assert!(excel_serial_to_timestamp(f64::INFINITY).is_none());
    }

    #[test]
    fn test_data_to_cell() {
        assert_eq!(data_to_cell(&Data::Empty), Cell::Null);
        assert_eq!(data_to_cell(&Data::Int(7)), Cell::Int(7));
        assert_eq!(data_to_cell(&Data::String("3.5".to_string())), Cell::Float(3.5));
        assert_eq!(header_text(&Data::String(" Year ".to_string())), " Year ");
    }

    #[test]
    fn test_read_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Year,Final Location,Total Units").unwrap();
        writeln!(file, "2020,Baner,10").unwrap();
        writeln!(file, "2021,Aundh,").unwrap();

        let raw = read_csv(&path).unwrap();
        assert_eq!(raw.headers, vec!["Year", "Final Location", "Total Units"]);
        assert_eq!(raw.rows.len(), 2);
        assert_eq!(raw.rows[0][0], Cell::Int(2020));
        assert_eq!(raw.rows[1][2], Cell::Null);
    }

    #[test]
    fn test_read_csv_missing_file() {
        let err = read_csv(Path::new("/nonexistent/data.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }

    #[test]
    fn test_read_spreadsheet_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a workbook").unwrap();
        assert!(matches!(
            read_spreadsheet(&path),
            Err(DatasetError::Excel(_))
        ));
    }
}
