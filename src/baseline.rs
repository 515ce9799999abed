//! Ratios of every record in a group against a reference implementation.

use serde::Serialize;

use crate::extract::MetricRecord;

/// Reference implementation used when none is configured.
pub const DEFAULT_BASELINE: &str = "CongeeSet";

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BaselineRatio {
    /// `baseline.memory_bytes / record.memory_bytes`; above 1.0 the record is smaller.
    pub memory_ratio: Option<f64>,
    /// `record.throughput / baseline.throughput`; below 1.0 the record is slower.
    pub throughput_ratio: Option<f64>,
    pub is_baseline: bool,
}

impl BaselineRatio {
    const IDENTITY: BaselineRatio = BaselineRatio {
        memory_ratio: Some(1.0),
        throughput_ratio: Some(1.0),
        is_baseline: true,
    };

    pub fn is_smaller(&self) -> bool {
        self.memory_ratio.is_some_and(|r| r > 1.0)
    }

    /// How many times slower than the baseline, when the record is slower.
    pub fn slowdown(&self) -> Option<f64> {
        self.throughput_ratio
            .filter(|r| *r > 0.0 && *r < 1.0)
            .map(|r| 1.0 / r)
    }
}

/// Compare every record in `group` against the record whose format is `baseline`.
///
/// Returns `None` when the baseline is not part of the group. If the baseline
/// format occurs more than once, the first occurrence is the reference and only
/// that record gets the exact 1.0 identity.
pub fn compare_to_baseline(group: &[MetricRecord], baseline: &str) -> Option<Vec<BaselineRatio>> {
    let base_idx = group.iter().position(|r| r.format == baseline)?;
    let base = &group[base_idx];

    Some(
        group
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                if idx == base_idx {
                    return BaselineRatio::IDENTITY;
                }
                BaselineRatio {
                    memory_ratio: ratio(base.memory_bytes as f64, record.memory_bytes as f64),
                    throughput_ratio: ratio(record.throughput, base.throughput),
                    is_baseline: false,
                }
            })
            .collect(),
    )
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}
