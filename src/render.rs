//! Markdown and JSON rendering of grouped records.

use std::fmt::{self, Write};

use serde::Serialize;

use crate::aggregate::{column_labels, Grouped};
use crate::baseline::{compare_to_baseline, BaselineRatio};
use crate::extract::MetricRecord;
use crate::rank::{best_flags, counters, MetricKind};
use crate::schema::HostEnv;
use crate::units::{
    display_name, fmt_bytes, fmt_count, fmt_gib, fmt_percent, group_thousands,
};

const MISSING: &str = "-";
const NOT_AVAILABLE: &str = "N/A";

/// Render the full markdown report.
///
/// `baseline` names the reference format for the relative-comparison rows.
pub fn render(
    grouped: &Grouped,
    env: Option<&HostEnv>,
    baseline: &str,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    render_to(&mut out, grouped, env, baseline)?;
    Ok(out)
}

pub fn render_to<W: Write>(
    out: &mut W,
    grouped: &Grouped,
    env: Option<&HostEnv>,
    baseline: &str,
) -> fmt::Result {
    write_system_config(out, env)?;

    let Some(representative) = grouped.values().flat_map(|g| g.first()).next() else {
        return writeln!(out, "No data to display");
    };
    write_benchmark_config(out, grouped, representative)?;

    writeln!(out, "### Performance Comparison\n")?;
    let lowest = grouped.keys().next().copied();
    for (&threads, group) in grouped {
        writeln!(out, "#### Threads: {threads}\n")?;
        write_group_table(out, group, Some(threads) == lowest, baseline)?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_system_config<W: Write>(out: &mut W, env: Option<&HostEnv>) -> fmt::Result {
    let default_env = HostEnv::default();
    let env = env.unwrap_or(&default_env);
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let num = |v: Option<u64>| v.map_or_else(|| NOT_AVAILABLE.to_string(), |n| n.to_string());

    writeln!(out, "### **System Configuration**\n")?;
    writeln!(out, "- **Hostname**: {}", text(&env.hostname))?;
    writeln!(out, "- **Operating System**: {}", text(&env.os_version))?;
    writeln!(out, "- **Kernel Version**: {}", text(&env.kernel_version))?;
    writeln!(out, "- **CPU Cores**: {} logical cores", num(env.cpu_num))?;
    writeln!(out, "- **Physical Cores**: {} physical cores", num(env.physical_core_num))?;
    match env.total_memory {
        Some(bytes) => writeln!(
            out,
            "- **Total Memory**: {} ({} GB)",
            group_thousands(bytes),
            fmt_gib(bytes)
        )?,
        None => writeln!(out, "- **Total Memory**: {NOT_AVAILABLE}")?,
    }
    writeln!(out)
}

fn write_benchmark_config<W: Write>(
    out: &mut W,
    grouped: &Grouped,
    first: &MetricRecord,
) -> fmt::Result {
    let threads: Vec<String> = grouped.keys().map(u64::to_string).collect();

    writeln!(out, "### Benchmark Configuration\n")?;
    writeln!(out, "- **Dataset Size**: {} keys", group_thousands(first.dataset_size))?;
    writeln!(out, "- **Key Pattern**: {}", first.key_pattern)?;
    writeln!(out, "- **Duration**: {} seconds per test", first.duration_s)?;
    writeln!(out, "- **Threads**: {}", threads.join(", "))?;
    writeln!(out, "- **Iterations**: {} repetitions each", first.iterations)?;
    writeln!(out)
}

/// `| Metric | A | B |` plus the separator line.
pub(crate) fn write_table_header<W: Write>(out: &mut W, labels: &[String]) -> fmt::Result {
    writeln!(out, "| Metric | {} |", labels.join(" | "))?;
    writeln!(out, "|{}", "--------|".repeat(labels.len() + 1))
}

pub(crate) fn write_section_row<W: Write>(out: &mut W, title: &str, columns: usize) -> fmt::Result {
    writeln!(out, "| **--- {title} ---** |{}", " |".repeat(columns))
}

/// One metric row: best cells in bold, missing cells as a dash.
pub(crate) fn write_metric_row<W: Write>(
    out: &mut W,
    label: &str,
    values: &[Option<f64>],
    kind: MetricKind<'_>,
    fmt_value: impl Fn(f64) -> String,
) -> fmt::Result {
    let flags = best_flags(values, kind);
    write!(out, "| **{label}** |")?;
    for (value, is_best) in values.iter().zip(flags) {
        match value {
            Some(v) if is_best => write!(out, " **{}** |", fmt_value(*v))?,
            Some(v) => write!(out, " {} |", fmt_value(*v))?,
            None => write!(out, " {MISSING} |")?,
        }
    }
    writeln!(out)
}

fn write_group_table<W: Write>(
    out: &mut W,
    group: &[MetricRecord],
    show_memory: bool,
    baseline: &str,
) -> fmt::Result {
    let labels = column_labels(group);

    write_table_header(out, &labels)?;

    if show_memory {
        write_metric_row(
            out,
            "Memory (bytes)",
            &column(group, |r| Some(r.memory_bytes as f64)),
            MetricKind::MemoryBytes,
            fmt_bytes,
        )?;
        write_metric_row(
            out,
            "Bytes per key",
            &column(group, |r| Some(r.bytes_per_key)),
            MetricKind::BytesPerKey,
            |v| format!("{v:.2}"),
        )?;
    }
    write_metric_row(
        out,
        "Throughput (ops/s)",
        &column(group, |r| Some(r.throughput)),
        MetricKind::Throughput,
        fmt_count,
    )?;
    write_metric_row(
        out,
        "Latency (ns/op)",
        &column(group, |r| r.latency_ns),
        MetricKind::Latency,
        |v| format!("{v:.1}"),
    )?;

    let perf_keys = ordered_perf_keys(group);
    if !perf_keys.is_empty() {
        write_section_row(out, "CPU Performance Stats", labels.len())?;
        for key in &perf_keys {
            write_metric_row(
                out,
                &display_name(key),
                &column(group, |r| r.perf_counter(key)),
                MetricKind::PerfCounter(key),
                fmt_count,
            )?;
            match key.as_str() {
                counters::INSTRUCTIONS => write_metric_row(
                    out,
                    "Instructions Per Cycle (IPC)",
                    &column(group, MetricRecord::ipc),
                    MetricKind::InstructionsPerCycle,
                    |v| format!("{v:.2}"),
                )?,
                counters::BRANCH_MISS => write_metric_row(
                    out,
                    "Branch Miss Rate (%)",
                    &column(group, MetricRecord::branch_miss_rate),
                    MetricKind::BranchMissRate,
                    fmt_percent,
                )?,
                counters::CACHE_MISS => write_metric_row(
                    out,
                    "Cache Miss Rate (%)",
                    &column(group, MetricRecord::cache_miss_rate),
                    MetricKind::CacheMissRate,
                    fmt_percent,
                )?,
                _ => {}
            }
        }
    }

    let disk_keys = ordered_disk_keys(group);
    if !disk_keys.is_empty() {
        write_section_row(out, "Disk I/O Stats", labels.len())?;
        for key in &disk_keys {
            write_metric_row(
                out,
                &display_name(key),
                &column(group, |r| r.disk_io.get(key.as_str()).copied()),
                MetricKind::DiskIo(key),
                fmt_bytes,
            )?;
        }
    }

    if let Some(ratios) = compare_to_baseline(group, baseline) {
        write_section_row(out, "Relative Comparisons", labels.len())?;
        write_relative_rows(out, &ratios, baseline)?;
    }
    Ok(())
}

pub(crate) fn column(
    group: &[MetricRecord],
    value: impl Fn(&MetricRecord) -> Option<f64>,
) -> Vec<Option<f64>> {
    group.iter().map(value).collect()
}

fn write_relative_rows<W: Write>(
    out: &mut W,
    ratios: &[BaselineRatio],
    baseline: &str,
) -> fmt::Result {
    let memory: Vec<Option<f64>> = ratios.iter().map(|r| r.memory_ratio).collect();
    let memory_best = best_flags(&memory, MetricKind::MemoryEfficiency);
    write!(out, "| **Memory efficiency vs {baseline}** |")?;
    for (ratio, is_best) in ratios.iter().zip(memory_best) {
        let cell = match ratio.memory_ratio {
            _ if ratio.is_baseline => "1.0x".to_string(),
            Some(r) if ratio.is_smaller() => format!("{r:.1}x smaller"),
            Some(r) => format!("{r:.1}x"),
            None => MISSING.to_string(),
        };
        write_cell(out, &cell, is_best)?;
    }
    writeln!(out)?;

    let throughput: Vec<Option<f64>> = ratios.iter().map(|r| r.throughput_ratio).collect();
    let throughput_best = best_flags(&throughput, MetricKind::ThroughputRatio);
    write!(out, "| **Performance vs {baseline}** |")?;
    for (ratio, is_best) in ratios.iter().zip(throughput_best) {
        let cell = match (ratio.throughput_ratio, ratio.slowdown()) {
            _ if ratio.is_baseline => "1.0x".to_string(),
            (Some(r), Some(slower)) => format!("{r:.2}x ({slower:.1}x slower)"),
            (Some(r), None) => format!("{r:.2}x"),
            (None, _) => MISSING.to_string(),
        };
        write_cell(out, &cell, is_best)?;
    }
    writeln!(out)
}

fn write_cell<W: Write>(out: &mut W, cell: &str, bold: bool) -> fmt::Result {
    if bold && cell != MISSING {
        write!(out, " **{cell}** |")
    } else {
        write!(out, " {cell} |")
    }
}

/// Perf counters present in the group, in display order: everything that is
/// neither a branch nor a cache counter alphabetically, then branches, branch
/// misses, cache references and cache misses.
pub fn ordered_perf_keys(group: &[MetricRecord]) -> Vec<String> {
    const TRAILING: [&str; 4] = [
        counters::BRANCHES,
        counters::BRANCH_MISS,
        counters::CACHE_REFERENCE,
        counters::CACHE_MISS,
    ];

    let mut keys: Vec<String> = group
        .iter()
        .flat_map(|r| r.perf.keys())
        .filter(|k| !TRAILING.contains(&k.as_str()))
        .cloned()
        .collect();
    keys.sort();
    keys.dedup();

    for tail in TRAILING {
        if group.iter().any(|r| r.perf.contains_key(tail)) {
            keys.push(tail.to_string());
        }
    }
    keys
}

fn ordered_disk_keys(group: &[MetricRecord]) -> Vec<String> {
    let mut keys: Vec<String> = group.iter().flat_map(|r| r.disk_io.keys()).cloned().collect();
    keys.sort();
    keys.dedup();
    keys
}

#[derive(Debug, Serialize)]
struct JsonRecord<'a> {
    #[serde(flatten)]
    record: &'a MetricRecord,
    ipc: Option<f64>,
    cache_miss_rate: Option<f64>,
    branch_miss_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    baseline: Option<BaselineRatio>,
}

#[derive(Debug, Serialize)]
struct JsonGroup<'a> {
    threads: u64,
    records: Vec<JsonRecord<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    env: Option<&'a HostEnv>,
    baseline: &'a str,
    groups: Vec<JsonGroup<'a>>,
}

/// Render the grouped records, their derived metrics and baseline ratios as JSON.
pub fn render_json(
    grouped: &Grouped,
    env: Option<&HostEnv>,
    baseline: &str,
) -> crate::error::Result<String> {
    let groups = grouped
        .iter()
        .map(|(&threads, group)| {
            let ratios = compare_to_baseline(group, baseline);
            let records = group
                .iter()
                .enumerate()
                .map(|(idx, record)| JsonRecord {
                    record,
                    ipc: record.ipc(),
                    cache_miss_rate: record.cache_miss_rate(),
                    branch_miss_rate: record.branch_miss_rate(),
                    baseline: ratios.as_ref().map(|r| r[idx]),
                })
                .collect();
            JsonGroup { threads, records }
        })
        .collect();

    let report = JsonReport {
        env,
        baseline,
        groups,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::aggregate::tests::record;

    fn perf_record(format: &str, threads: u64, counters: &[(&str, f64)]) -> MetricRecord {
        let mut r = record(format, threads);
        r.perf = counters.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        r
    }

    fn row<'a>(report: &'a str, label: &str) -> &'a str {
        let needle = format!("| **{label}** |");
        report
            .lines()
            .find(|l| l.starts_with(&needle))
            .unwrap_or_else(|| panic!("row {label} not found in:\n{report}"))
    }

    #[test]
    fn test_perf_key_order() {
        let group = vec![
            perf_record(
                "A",
                1,
                &[
                    ("cache_miss", 1.0),
                    ("cycles", 1.0),
                    ("branches", 1.0),
                    ("inst", 1.0),
                    ("cache_reference", 1.0),
                    ("branch_miss", 1.0),
                ],
            ),
            perf_record("B", 1, &[("page_faults", 1.0), ("context_switch", 1.0)]),
        ];

        assert_eq!(
            ordered_perf_keys(&group),
            vec![
                "context_switch",
                "cycles",
                "inst",
                "page_faults",
                "branches",
                "branch_miss",
                "cache_reference",
                "cache_miss",
            ]
        );
    }

    #[test]
    fn test_derived_rows_follow_their_counters() {
        let grouped = aggregate(vec![perf_record(
            "A",
            1,
            &[
                ("inst", 300.0),
                ("cycles", 100.0),
                ("branches", 100.0),
                ("branch_miss", 2.0),
                ("cache_reference", 1000.0),
                ("cache_miss", 50.0),
            ],
        )]);
        let report = render(&grouped, None, "CongeeSet").unwrap();
        let labels: Vec<&str> = report
            .lines()
            .filter(|l| l.starts_with("| **"))
            .map(|l| l.split("**").nth(1).unwrap_or_default())
            .collect();

        assert_eq!(
            labels,
            vec![
                "Memory (bytes)",
                "Bytes per key",
                "Throughput (ops/s)",
                "Latency (ns/op)",
                "--- CPU Performance Stats ---",
                "Cycles",
                "Inst",
                "Instructions Per Cycle (IPC)",
                "Branches",
                "Branch Miss",
                "Branch Miss Rate (%)",
                "Cache Reference",
                "Cache Miss",
                "Cache Miss Rate (%)",
            ]
        );
        assert!(row(&report, "Cache Miss Rate (%)").contains("5.0%"));
        assert!(row(&report, "Instructions Per Cycle (IPC)").contains("3.00"));
    }

    #[test]
    fn test_best_values_bold_and_missing_dash() {
        let mut fast = perf_record("Fast", 1, &[("cache_miss", 10.0)]);
        fast.throughput = 2_000_000.0;
        fast.latency_ns = Some(500.0);
        fast.memory_bytes = 4_096;
        let slow = perf_record("Slow", 1, &[]);

        let report = render(&aggregate(vec![fast, slow]), None, "CongeeSet").unwrap();

        assert_eq!(row(&report, "Throughput (ops/s)"), "| **Throughput (ops/s)** | **2.00M** | 1.00K |");
        assert_eq!(row(&report, "Latency (ns/op)"), "| **Latency (ns/op)** | **500.0** | 1000000.0 |");
        assert_eq!(row(&report, "Memory (bytes)"), "| **Memory (bytes)** | 4,096 | **1,000** |");
        assert_eq!(row(&report, "Cache Miss"), "| **Cache Miss** | **10** | - |");
    }

    #[test]
    fn test_ties_are_all_bold() {
        let report = render(&aggregate(vec![record("A", 1), record("B", 1)]), None, "X").unwrap();
        assert_eq!(row(&report, "Bytes per key"), "| **Bytes per key** | **1.00** | **1.00** |");
    }

    #[test]
    fn test_memory_rows_only_in_lowest_thread_table() {
        let grouped = aggregate(vec![record("A", 1), record("A", 8), record("B", 8)]);
        let report = render(&grouped, None, "X").unwrap();

        assert_eq!(report.matches("| **Memory (bytes)** |").count(), 1);
        assert_eq!(report.matches("| **Throughput (ops/s)** |").count(), 2);
        let first_table = report.find("#### Threads: 1").unwrap();
        let second_table = report.find("#### Threads: 8").unwrap();
        let memory = report.find("Memory (bytes)").unwrap();
        assert!(first_table < memory && memory < second_table);
    }

    #[test]
    fn test_relative_rows() {
        let mut base = record("CongeeSet", 1);
        base.memory_bytes = 500;
        base.throughput = 400.0;
        let mut small_slow = record("Compact", 1);
        small_slow.memory_bytes = 250;
        small_slow.throughput = 100.0;
        let mut big_fast = record("Flat", 1);
        big_fast.memory_bytes = 1_000;
        big_fast.throughput = 800.0;

        let report = render(&aggregate(vec![base, small_slow, big_fast]), None, "CongeeSet").unwrap();

        assert_eq!(
            row(&report, "Memory efficiency vs CongeeSet"),
            "| **Memory efficiency vs CongeeSet** | **2.0x smaller** | 1.0x | 0.5x |"
        );
        assert_eq!(
            row(&report, "Performance vs CongeeSet"),
            "| **Performance vs CongeeSet** | 0.25x (4.0x slower) | 1.0x | **2.00x** |"
        );
    }

    #[test]
    fn test_no_relative_section_without_baseline() {
        let report = render(&aggregate(vec![record("A", 1)]), None, "CongeeSet").unwrap();
        assert!(!report.contains("Relative Comparisons"));
    }

    #[test]
    fn test_config_blocks() {
        let env = HostEnv {
            hostname: Some("bench-01".to_string()),
            total_memory: Some(17_179_869_184),
            cpu_num: Some(32),
            ..HostEnv::default()
        };
        let grouped = aggregate(vec![record("A", 4), record("A", 1)]);
        let report = render(&grouped, Some(&env), "X").unwrap();

        assert!(report.contains("- **Hostname**: bench-01"));
        assert!(report.contains("- **Kernel Version**: N/A"));
        assert!(report.contains("- **CPU Cores**: 32 logical cores"));
        assert!(report.contains("- **Total Memory**: 17,179,869,184 (16.0 GB)"));
        assert!(report.contains("- **Dataset Size**: 1,000 keys"));
        assert!(report.contains("- **Threads**: 1, 4"));
        assert!(report.contains("- **Duration**: 1 seconds per test"));
        assert!(report.contains("- **Iterations**: 3 repetitions each"));
        assert!(report.find("System Configuration") < report.find("Benchmark Configuration"));
    }

    #[test]
    fn test_disk_io_section() {
        let mut a = record("A", 1);
        a.disk_io.insert("write_bytes".to_string(), 8_192.0);
        a.disk_io.insert("read_bytes".to_string(), 1_000_000.0);
        let b = record("B", 1);

        let report = render(&aggregate(vec![a, b]), None, "X").unwrap();
        assert!(report.contains("| **--- Disk I/O Stats ---** | | |"));
        assert_eq!(row(&report, "Read Bytes"), "| **Read Bytes** | **1,000,000** | - |");
        assert!(report.find("Read Bytes") < report.find("Write Bytes"));
    }

    #[test]
    fn test_render_json() {
        let mut base = perf_record("CongeeSet", 1, &[("inst", 10.0), ("cycles", 5.0)]);
        base.memory_bytes = 100;
        let json = render_json(&aggregate(vec![base, record("Other", 1)]), None, "CongeeSet").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let records = &value["groups"][0]["records"];
        assert_eq!(value["groups"][0]["threads"], 1);
        assert_eq!(records[0]["format"], "CongeeSet");
        assert_eq!(records[0]["ipc"], 2.0);
        assert_eq!(records[0]["baseline"]["throughput_ratio"], 1.0);
        assert_eq!(records[1]["baseline"]["memory_ratio"], 0.1);
    }

    #[test]
    fn test_writer_failure_propagates() {
        struct Full;
        impl Write for Full {
            fn write_str(&mut self, _: &str) -> fmt::Result {
                Err(fmt::Error)
            }
        }

        let grouped = aggregate(vec![record("A", 1)]);
        assert!(render_to(&mut Full, &grouped, None, "A").is_err());

        let err: crate::error::ReportError = fmt::Error.into();
        assert!(matches!(err, crate::error::ReportError::Render(_)));
    }
}
