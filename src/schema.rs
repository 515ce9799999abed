//! Typed model of a shumai result document.
//!
//! Only the fields the report needs are modelled; anything else in the file is
//! ignored by serde. Presence checks for required fields happen here (serde
//! rejects the document) and in [`crate::extract`], so later stages only ever
//! see well-formed [`crate::extract::MetricRecord`]s.

use serde::{Deserialize, Serialize};

/// Host facts captured by the harness. Every field is optional.
///
/// A field with an unexpected JSON type reads as absent instead of rejecting
/// the whole document; numeric strings and integral floats are accepted for
/// the counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostEnv {
    #[serde(default, deserialize_with = "lenient::text")]
    pub hostname: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub os_version: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub kernel_version: Option<String>,
    /// Logical core count.
    #[serde(default, deserialize_with = "lenient::count")]
    pub cpu_num: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub physical_core_num: Option<u64>,
    /// Total memory in bytes.
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_memory: Option<u64>,
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::HostEnv;

    pub(super) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub(super) fn count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// A non-object `env` is treated as missing.
    pub(super) fn env<'de, D: Deserializer<'de>>(d: D) -> Result<Option<HostEnv>, D::Error> {
        Ok(match Value::deserialize(d)? {
            v @ Value::Object(_) => serde_json::from_value(v).ok(),
            _ => None,
        })
    }

    fn whole(f: f64) -> Option<u64> {
        (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then(|| f as u64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Implementation under test; becomes a table column.
    pub format: String,
    /// Only the first entry is reported.
    pub dataset_size: Vec<u64>,
    #[serde(default)]
    pub key_pattern: Option<String>,
    /// Run duration in seconds.
    pub time: f64,
    /// Thread counts the harness was asked to run; the run blocks are
    /// authoritative and a mismatch is only logged.
    #[serde(default)]
    pub threads: Vec<u64>,
    /// Workload label, used by the benchmark-action converter.
    #[serde(default)]
    pub workload: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMetrics {
    pub memory_bytes: u64,
    pub bytes_per_key: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSection {
    pub user_metrics: UserMetrics,
}

/// One named sample attached to an iteration (`perf`, `disk_io`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    pub name: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Iteration {
    /// Operations completed within the configured duration.
    pub result: f64,
    #[serde(default)]
    pub measurements: Vec<Measurement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunBlock {
    #[serde(alias = "thread_count", alias = "threads")]
    pub thread_cnt: u64,
    pub iterations: Vec<Iteration>,
}

/// One benchmark artifact: a single (format, configuration) run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultDocument {
    #[serde(default, deserialize_with = "lenient::env")]
    pub env: Option<HostEnv>,
    pub config: RunConfig,
    pub load: LoadSection,
    pub run: Vec<RunBlock>,
}

impl ResultDocument {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
