//! CSV export of dataset rows.

use crate::models::{Cell, Dataset};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Writes the present canonical columns of `dataset` as CSV to `path`.
pub fn write_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file {}", path.display()))?;
    write_csv_to(dataset, std::io::BufWriter::new(file))?;

    info!("Exported {} rows to {}", dataset.len(), path.display());
    Ok(())
}

/// Writes `dataset` as CSV into any writer.
pub fn write_csv_to<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().from_writer(writer);

    writer.write_record(dataset.columns().iter().map(|c| c.name()))?;
    for row in dataset.rows() {
        writer.write_record(
            dataset
                .columns()
                .iter()
                .map(|column| field_text(&row.value(*column))),
        )?;
    }

    writer.flush().context("Failed to flush CSV export")?;
    Ok(())
}

/// NaN and infinities are written as empty fields, like nulls.
fn field_text(cell: &Cell) -> String {
    match cell {
        Cell::Float(n) if !n.is_finite() => String::new(),
        other => other.to_string(),
    }
}
