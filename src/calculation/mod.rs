pub mod config;
pub mod pipeline;
pub mod types;

pub use pipeline::{run_batch, BatchReport, ComparisonSummary, SkippedDate, VixEngine};
