//! Report rendering and data export.

pub mod export;
pub mod generator;

pub use export::write_csv;
pub use generator::{
    generate_json_report, generate_markdown_report, write_report, ReportMetadata,
};
