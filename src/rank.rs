//! Best-value selection per metric.
//!
//! Which direction counts as "better" is decided by an explicit policy table
//! rather than ad-hoc comparisons in the renderer.

use serde::Serialize;

/// Perf counter names as written by the harness.
pub mod counters {
    pub const BRANCHES: &str = "branches";
    pub const BRANCH_MISS: &str = "branch_miss";
    pub const CACHE_REFERENCE: &str = "cache_reference";
    pub const CACHE_MISS: &str = "cache_miss";
    pub const CONTEXT_SWITCH: &str = "context_switch";
    pub const CPU_MIGRATION: &str = "cpu_migration";
    pub const CYCLES: &str = "cycles";
    pub const INSTRUCTIONS: &str = "inst";
    pub const PAGE_FAULTS: &str = "page_faults";
    pub const STALLED_CYCLES_FRONTEND: &str = "stalled_cycles_frontend";
}

/// Absolute tolerance for "is this the best value".
pub const TOLERANCE: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

/// Perf counters with an explicit policy. Anything not listed is
/// [`Direction::LowerIsBetter`].
///
/// Branches, cache references, cycles and instructions count work done, so the
/// highest value is emphasized.
pub const PERF_COUNTER_POLICY: &[(&str, Direction)] = &[
    (counters::BRANCH_MISS, Direction::LowerIsBetter),
    (counters::CACHE_MISS, Direction::LowerIsBetter),
    (counters::CONTEXT_SWITCH, Direction::LowerIsBetter),
    (counters::CPU_MIGRATION, Direction::LowerIsBetter),
    (counters::PAGE_FAULTS, Direction::LowerIsBetter),
    (counters::STALLED_CYCLES_FRONTEND, Direction::LowerIsBetter),
    (counters::BRANCHES, Direction::HigherIsBetter),
    (counters::CACHE_REFERENCE, Direction::HigherIsBetter),
    (counters::CYCLES, Direction::HigherIsBetter),
    (counters::INSTRUCTIONS, Direction::HigherIsBetter),
];

pub fn perf_counter_direction(name: &str) -> Direction {
    PERF_COUNTER_POLICY
        .iter()
        .find(|(counter, _)| *counter == name)
        .map(|(_, direction)| *direction)
        .unwrap_or(Direction::LowerIsBetter)
}

/// A displayed metric, as far as ranking is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind<'a> {
    MemoryBytes,
    BytesPerKey,
    Throughput,
    Latency,
    PerfCounter(&'a str),
    DiskIo(&'a str),
    InstructionsPerCycle,
    CacheMissRate,
    BranchMissRate,
    /// Counter events per completed operation.
    PerOperation,
    /// Baseline memory divided by record memory.
    MemoryEfficiency,
    /// Record throughput divided by baseline throughput.
    ThroughputRatio,
}

impl MetricKind<'_> {
    pub fn direction(self) -> Direction {
        match self {
            MetricKind::MemoryBytes
            | MetricKind::BytesPerKey
            | MetricKind::Latency
            | MetricKind::DiskIo(_)
            | MetricKind::CacheMissRate
            | MetricKind::BranchMissRate
            | MetricKind::PerOperation => Direction::LowerIsBetter,
            MetricKind::Throughput
            | MetricKind::InstructionsPerCycle
            | MetricKind::MemoryEfficiency
            | MetricKind::ThroughputRatio => Direction::HigherIsBetter,
            MetricKind::PerfCounter(name) => perf_counter_direction(name),
        }
    }
}

/// Best value among the present, finite entries of `values`.
///
/// Missing entries never take part, so a record without a counter can neither
/// win nor be treated as zero. Returns `None` when nothing is present.
pub fn best<I>(values: I, kind: MetricKind<'_>) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present = values.into_iter().flatten().filter(|v| v.is_finite());
    match kind.direction() {
        Direction::LowerIsBetter => present.reduce(f64::min),
        Direction::HigherIsBetter => present.reduce(f64::max),
    }
}

pub fn is_best(value: f64, best: Option<f64>) -> bool {
    best.is_some_and(|b| (value - b).abs() < TOLERANCE)
}

/// Per-cell "is best" flags for a row, `false` for missing cells.
pub fn best_flags(values: &[Option<f64>], kind: MetricKind<'_>) -> Vec<bool> {
    let winner = best(values.iter().copied(), kind);
    values
        .iter()
        .map(|v| v.is_some_and(|v| is_best(v, winner)))
        .collect()
}
