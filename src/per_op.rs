//! Per-operation cost breakdown: counter events divided by completed operations.

use std::fmt::{self, Write};

use serde::Serialize;

use crate::aggregate::{column_labels, Grouped};
use crate::extract::MetricRecord;
use crate::rank::{counters, MetricKind};
use crate::render::{column, write_metric_row, write_table_header};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PerOpCost {
    pub instructions: Option<f64>,
    pub cycles: Option<f64>,
    pub cache_misses: Option<f64>,
    pub branch_misses: Option<f64>,
}

impl PerOpCost {
    pub fn of(record: &MetricRecord) -> Self {
        let per_op = |counter: &str| {
            let events = record.perf_counter(counter)?;
            (record.avg_operations > 0.0).then(|| events / record.avg_operations)
        };
        PerOpCost {
            instructions: per_op(counters::INSTRUCTIONS),
            cycles: per_op(counters::CYCLES),
            cache_misses: per_op(counters::CACHE_MISS),
            branch_misses: per_op(counters::BRANCH_MISS),
        }
    }
}

/// One markdown table per thread count, lowest cost emphasized.
pub fn render_per_op(grouped: &Grouped) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_per_op(&mut out, grouped)?;
    Ok(out)
}

fn write_per_op<W: Write>(out: &mut W, grouped: &Grouped) -> fmt::Result {
    writeln!(out, "### Per-Operation Costs\n")?;
    for (threads, group) in grouped {
        let costs: Vec<PerOpCost> = group.iter().map(PerOpCost::of).collect();
        let pick = |f: fn(&PerOpCost) -> Option<f64>| -> Vec<Option<f64>> {
            costs.iter().map(f).collect()
        };

        writeln!(out, "#### Threads: {threads}\n")?;
        write_table_header(out, &column_labels(group))?;
        write_metric_row(
            out,
            "Ops per iteration",
            &column(group, |r| Some(r.avg_operations)),
            MetricKind::Throughput,
            crate::units::fmt_count,
        )?;
        write_metric_row(
            out,
            "Instructions per op",
            &pick(|c| c.instructions),
            MetricKind::PerOperation,
            |v| format!("{v:.1}"),
        )?;
        write_metric_row(
            out,
            "Cycles per op",
            &pick(|c| c.cycles),
            MetricKind::PerOperation,
            |v| format!("{v:.1}"),
        )?;
        write_metric_row(
            out,
            "Cache misses per op",
            &pick(|c| c.cache_misses),
            MetricKind::PerOperation,
            |v| format!("{v:.2}"),
        )?;
        write_metric_row(
            out,
            "Branch misses per op",
            &pick(|c| c.branch_misses),
            MetricKind::PerOperation,
            |v| format!("{v:.2}"),
        )?;
        writeln!(out)?;
    }
    Ok(())
}
