use clap::ValueEnum;

pub mod aggregate;
pub mod baseline;
pub mod convert;
pub mod error;
pub mod extract;
pub mod input;
pub mod per_op;
pub mod pipeline;
pub mod rank;
pub mod render;
pub mod schema;
pub mod units;

pub use error::{ReportError, Result};
pub use extract::MetricRecord;
pub use pipeline::ReportConfig;

/// Output encoding of the comparison report.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Markdown tables, suitable for a CI comment.
    #[default]
    Markdown,
    /// Grouped records with derived metrics and baseline ratios.
    Json,
}
