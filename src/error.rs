use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while turning result documents into a report.
///
/// `Io` and `MalformedInput` concern a single document, which is skipped.
/// `EmptyResultSet` is terminal.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed input '{origin}': {reason}")]
    MalformedInput { origin: String, reason: String },

    #[error("no usable benchmark records in the supplied inputs")]
    EmptyResultSet,

    #[error("failed to render report: {0}")]
    Render(#[from] std::fmt::Error),

    #[error("failed to encode JSON output: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ReportError {
    pub fn malformed(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        ReportError::MalformedInput {
            origin: origin.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
