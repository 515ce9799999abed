//! Conversion to the `customBiggerIsBetter` entry format consumed by
//! github-action-benchmark.

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::schema::ResultDocument;

pub const QPS_UNIT: &str = "QPS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchActionEntry {
    pub name: String,
    pub unit: String,
    pub value: f64,
}

/// Result of the last iteration of the first run block, named after the
/// workload (or the format when the document has no workload label).
pub fn to_bench_action(doc: &ResultDocument, source: &str) -> Result<BenchActionEntry> {
    let last = doc
        .run
        .first()
        .and_then(|block| block.iterations.last())
        .ok_or_else(|| ReportError::malformed(source, "no iterations to convert"))?;

    Ok(BenchActionEntry {
        name: doc
            .config
            .workload
            .clone()
            .unwrap_or_else(|| doc.config.format.clone()),
        unit: QPS_UNIT.to_string(),
        value: last.result,
    })
}
