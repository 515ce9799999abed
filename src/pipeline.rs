//! End-to-end report generation: load, extract, group, render.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::aggregate::{aggregate, Grouped};
use crate::baseline::DEFAULT_BASELINE;
use crate::convert::{to_bench_action, BenchActionEntry};
use crate::error::{ReportError, Result};
use crate::extract::{extract, MetricRecord};
use crate::input::{load_document, source_label};
use crate::per_op::render_per_op;
use crate::render::{render, render_json};
use crate::schema::{HostEnv, ResultDocument};
use crate::OutputFormat;

#[derive(Clone, Debug)]
pub struct ReportConfig {
    /// Reference format for relative comparisons.
    pub baseline: String,
    pub output: OutputFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            baseline: DEFAULT_BASELINE.to_string(),
            output: OutputFormat::Markdown,
        }
    }
}

/// Records extracted from a set of documents.
///
/// Documents that fail to load or extract are counted in `skipped` and do not
/// affect the others.
#[derive(Debug, Default)]
pub struct Batch {
    pub records: Vec<MetricRecord>,
    /// Host facts of the first document (in input order) that carries them.
    pub env: Option<HostEnv>,
    pub skipped: usize,
}

impl Batch {
    pub fn from_paths(paths: &[PathBuf]) -> Self {
        let mut batch = Batch::default();
        for path in paths {
            match load_document(path) {
                Ok(doc) => batch.push(&source_label(path), &doc),
                Err(e) => batch.skip(path, &e),
            }
        }
        info!(
            records = batch.records.len(),
            skipped = batch.skipped,
            "loaded benchmark results"
        );
        batch
    }

    /// Add one parsed document, skipping it if extraction fails.
    pub fn push(&mut self, source: &str, doc: &ResultDocument) {
        match extract(doc, source) {
            Ok(records) => {
                if self.env.is_none() {
                    self.env = doc.env.clone();
                }
                self.records.extend(records);
            }
            Err(e) => self.skip(Path::new(source), &e),
        }
    }

    fn skip(&mut self, path: &Path, error: &ReportError) {
        warn!(path = %path.display(), error = %error, "skipping result file");
        self.skipped += 1;
    }

    /// Group the records, or fail with [`ReportError::EmptyResultSet`].
    pub fn into_grouped(self) -> Result<(Grouped, Option<HostEnv>)> {
        if self.records.is_empty() {
            return Err(ReportError::EmptyResultSet);
        }
        Ok((aggregate(self.records), self.env))
    }
}

/// Comparison report for `paths` in the configured output format.
pub fn generate_report(paths: &[PathBuf], config: &ReportConfig) -> Result<String> {
    let (grouped, env) = Batch::from_paths(paths).into_grouped()?;
    match config.output {
        OutputFormat::Markdown => Ok(render(&grouped, env.as_ref(), &config.baseline)?),
        OutputFormat::Json => render_json(&grouped, env.as_ref(), &config.baseline),
    }
}

pub fn generate_per_op(paths: &[PathBuf]) -> Result<String> {
    let (grouped, _) = Batch::from_paths(paths).into_grouped()?;
    Ok(render_per_op(&grouped)?)
}

/// github-action-benchmark entries, one per convertible document.
pub fn generate_bench_action(paths: &[PathBuf]) -> Result<Vec<BenchActionEntry>> {
    let mut entries = Vec::new();
    for path in paths {
        match load_document(path).and_then(|doc| to_bench_action(&doc, &source_label(path))) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping result file"),
        }
    }
    if entries.is_empty() {
        return Err(ReportError::EmptyResultSet);
    }
    Ok(entries)
}
