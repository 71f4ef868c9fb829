//! Realty Insight - turn free-text questions about real-estate datasets
//! into chart series, table rows and a narrative summary.
//!
//! The pipeline lives in [`pipeline::Analyzer`]. Language-model access is
//! injected through the traits in [`llm`]; without it every stage has a
//! deterministic fallback.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod llm;
pub mod models;
pub mod numeric;
pub mod pipeline;
pub mod report;
pub mod resolver;

pub use error::{DatasetError, ServiceError};
pub use models::{Analysis, AnalysisResult, Dataset, NoMatch};
pub use pipeline::{filter_for_export, Analyzer, AnalyzerSettings};
