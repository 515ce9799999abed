//! Grouping of extracted records by thread count.

use std::collections::BTreeMap;

use crate::extract::MetricRecord;

/// Records keyed by thread count; iteration order is ascending thread count.
pub type Grouped = BTreeMap<u64, Vec<MetricRecord>>;

/// Group `records` by thread count and sort each group by format name.
///
/// The sort is case-sensitive and ascending, with the source label as the
/// secondary key, so the column order does not depend on input order.
pub fn aggregate(records: impl IntoIterator<Item = MetricRecord>) -> Grouped {
    let mut grouped = Grouped::new();
    for record in records {
        grouped.entry(record.threads).or_default().push(record);
    }
    for group in grouped.values_mut() {
        group.sort_by(|a, b| {
            a.format
                .cmp(&b.format)
                .then_with(|| a.source.cmp(&b.source))
        });
    }
    grouped
}

/// Column labels for a group. A format that occurs more than once in the group
/// is suffixed with its source label.
pub fn column_labels(group: &[MetricRecord]) -> Vec<String> {
    group
        .iter()
        .map(|r| {
            let dupes = group.iter().filter(|o| o.format == r.format).count();
            if dupes > 1 {
                format!("{} ({})", r.format, r.source)
            } else {
                r.format.clone()
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(format: &str, threads: u64) -> MetricRecord {
        MetricRecord {
            format: format.to_string(),
            source: format.to_lowercase(),
            dataset_size: 1_000,
            key_pattern: "Sequential".to_string(),
            duration_s: 1.0,
            threads,
            memory_bytes: 1_000,
            bytes_per_key: 1.0,
            avg_operations: 1_000.0,
            throughput: 1_000.0,
            latency_ns: Some(1_000_000.0),
            iterations: 3,
            perf: BTreeMap::new(),
            disk_io: BTreeMap::new(),
        }
    }

    fn formats(group: &[MetricRecord]) -> Vec<&str> {
        group.iter().map(|r| r.format.as_str()).collect()
    }

    #[test]
    fn test_groups_by_thread_count_and_sorts() {
        let grouped = aggregate(vec![
            record("CongeeSet", 4),
            record("CongeeFlat", 1),
            record("CongeeCompact", 4),
            record("CongeeSet", 1),
        ]);

        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec![1, 4]);
        assert_eq!(formats(&grouped[&1]), vec!["CongeeFlat", "CongeeSet"]);
        assert_eq!(formats(&grouped[&4]), vec!["CongeeCompact", "CongeeSet"]);
    }

    #[test]
    fn test_order_is_independent_of_input_order() {
        let input = vec![record("b", 1), record("a", 1), record("C", 1), record("a", 2)];
        let mut reversed = input.clone();
        reversed.reverse();

        assert_eq!(aggregate(input), aggregate(reversed));
    }

    #[test]
    fn test_case_sensitive_ordering() {
        let grouped = aggregate(vec![record("beta", 1), record("Alpha", 1), record("alpha", 1)]);
        assert_eq!(formats(&grouped[&1]), vec!["Alpha", "alpha", "beta"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(Vec::new()).is_empty());
    }

    #[test]
    fn test_duplicate_formats_are_disambiguated() {
        let mut second = record("A", 1);
        second.source = "rerun".to_string();
        let grouped = aggregate(vec![second, record("A", 1), record("B", 1)]);

        let labels = column_labels(&grouped[&1]);
        assert_eq!(labels, vec!["A (a)", "A (rerun)", "B"]);
    }
}
