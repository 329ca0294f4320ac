pub mod aggregate;
pub mod chart;
pub mod config;
pub mod format;
pub mod lookup;
pub mod numeric;
pub mod report;
pub mod types;
pub mod variation;

pub use aggregate::{AggregationSpec, HeaderPolicy};
pub use types::{AggregatedRecord, Lookups};
