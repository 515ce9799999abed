//! Metric extraction: one [`MetricRecord`] per run block of a result document.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ReportError, Result};
use crate::rank::counters;
use crate::schema::{Iteration, ResultDocument, RunBlock};

/// Measurement name carrying hardware performance counters.
pub const PERF_MEASUREMENT: &str = "perf";
/// Measurement name carrying disk I/O byte counters.
pub const DISK_IO_MEASUREMENT: &str = "disk_io";

/// Normalized metrics for one (document, thread count) pair.
///
/// Built once by [`extract`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub format: String,
    /// Label of the document the record came from (file stem for files).
    pub source: String,
    pub dataset_size: u64,
    pub key_pattern: String,
    pub duration_s: f64,
    pub threads: u64,
    pub memory_bytes: u64,
    pub bytes_per_key: f64,
    pub avg_operations: f64,
    /// Operations per second.
    pub throughput: f64,
    /// Nanoseconds per operation; `None` when no operation completed.
    pub latency_ns: Option<f64>,
    pub iterations: usize,
    pub perf: BTreeMap<String, f64>,
    pub disk_io: BTreeMap<String, f64>,
}

impl MetricRecord {
    pub fn perf_counter(&self, name: &str) -> Option<f64> {
        self.perf.get(name).copied()
    }

    /// Instructions per cycle, when both counters exist and cycles > 0.
    pub fn ipc(&self) -> Option<f64> {
        let inst = self.perf_counter(counters::INSTRUCTIONS)?;
        let cycles = self.perf_counter(counters::CYCLES)?;
        (cycles > 0.0).then(|| inst / cycles)
    }

    /// Cache misses as a percentage of cache references.
    pub fn cache_miss_rate(&self) -> Option<f64> {
        let misses = self.perf_counter(counters::CACHE_MISS)?;
        let refs = self.perf_counter(counters::CACHE_REFERENCE)?;
        (refs > 0.0).then(|| misses / refs * 100.0)
    }

    /// Branch misses as a percentage of branches.
    pub fn branch_miss_rate(&self) -> Option<f64> {
        let misses = self.perf_counter(counters::BRANCH_MISS)?;
        let branches = self.perf_counter(counters::BRANCHES)?;
        (branches > 0.0).then(|| misses / branches * 100.0)
    }
}

/// Extract one record per entry of `doc.run`.
///
/// `source` labels the records; it is usually the file stem of the document.
pub fn extract(doc: &ResultDocument, source: &str) -> Result<Vec<MetricRecord>> {
    let config = &doc.config;
    let dataset_size = *config
        .dataset_size
        .first()
        .ok_or_else(|| ReportError::malformed(source, "config.dataset_size is empty"))?;

    if !(config.time.is_finite() && config.time > 0.0) {
        return Err(ReportError::malformed(
            source,
            format!("config.time must be positive, got {}", config.time),
        ));
    }
    if doc.run.is_empty() {
        return Err(ReportError::malformed(source, "run contains no thread-count blocks"));
    }

    let undeclared = undeclared_thread_counts(doc);
    if !undeclared.is_empty() {
        warn!(
            source,
            declared = ?config.threads,
            undeclared = ?undeclared,
            "run blocks use thread counts missing from config.threads"
        );
    }

    let metrics = &doc.load.user_metrics;
    let key_pattern = config.key_pattern.clone().unwrap_or_else(|| "N/A".to_string());

    doc.run
        .iter()
        .map(|block| -> Result<MetricRecord> {
            let (avg_operations, perf, disk_io) = summarize_block(block, source)?;
            let throughput = avg_operations / config.time;
            let latency_ns = (avg_operations > 0.0).then(|| config.time * 1e9 / avg_operations);

            debug!(
                format = %config.format,
                threads = block.thread_cnt,
                avg_operations,
                "extracted record"
            );

            Ok(MetricRecord {
                format: config.format.clone(),
                source: source.to_string(),
                dataset_size,
                key_pattern: key_pattern.clone(),
                duration_s: config.time,
                threads: block.thread_cnt,
                memory_bytes: metrics.memory_bytes,
                bytes_per_key: metrics.bytes_per_key,
                avg_operations,
                throughput,
                latency_ns,
                iterations: block.iterations.len(),
                perf,
                disk_io,
            })
        })
        .collect()
}

/// Thread counts of run blocks that `config.threads` does not list.
///
/// Empty when `config.threads` is absent.
pub fn undeclared_thread_counts(doc: &ResultDocument) -> Vec<u64> {
    let declared = &doc.config.threads;
    if declared.is_empty() {
        return Vec::new();
    }
    let mut missing: Vec<u64> = doc
        .run
        .iter()
        .map(|block| block.thread_cnt)
        .filter(|t| !declared.contains(t))
        .collect();
    missing.sort_unstable();
    missing.dedup();
    missing
}

type BlockSummary = (f64, BTreeMap<String, f64>, BTreeMap<String, f64>);

fn summarize_block(block: &RunBlock, source: &str) -> Result<BlockSummary> {
    if block.iterations.is_empty() {
        return Err(ReportError::malformed(
            source,
            format!("run block for {} thread(s) has no iterations", block.thread_cnt),
        ));
    }

    let total: f64 = block.iterations.iter().map(|it| it.result).sum();
    let avg_operations = total / block.iterations.len() as f64;

    let perf = average_counters(&block.iterations, PERF_MEASUREMENT, source)?;
    let disk_io = average_counters(&block.iterations, DISK_IO_MEASUREMENT, source)?;
    Ok((avg_operations, perf, disk_io))
}

/// Mean of every counter found under `measurement` across iterations.
///
/// Each counter is averaged over the iterations that reported it.
fn average_counters(
    iterations: &[Iteration],
    measurement: &str,
    source: &str,
) -> Result<BTreeMap<String, f64>> {
    let mut samples: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for m in iterations
        .iter()
        .flat_map(|it| it.measurements.iter())
        .filter(|m| m.name == measurement)
    {
        let Some(value) = &m.value else {
            continue;
        };
        let object = value.as_object().ok_or_else(|| {
            ReportError::malformed(source, format!("'{measurement}' value is not an object"))
        })?;
        for (key, v) in object {
            let n = v.as_f64().ok_or_else(|| {
                ReportError::malformed(
                    source,
                    format!("'{measurement}.{key}' is not a number: {v}"),
                )
            })?;
            samples.entry(key.clone()).or_default().push(n);
        }
    }

    Ok(samples
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(key, values)| {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            (key, mean)
        })
        .collect())
}
