//! Analysis stages run after the areas of a query are known.

pub mod aggregator;
pub mod summary;
pub mod table;

pub use aggregator::aggregate;
pub use summary::{generate_fallback_summary, summarize};
pub use table::{project, DEFAULT_MAX_ROWS};
